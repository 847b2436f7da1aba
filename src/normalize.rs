//! Record normalizer: raw GraphQL goal payload -> canonical [`Goal`].
//!
//! Pure, no I/O. Every nested structure in the payload may be absent or
//! explicitly null; all of them degrade to empty-equivalent defaults. The
//! only unrecoverable defect is a record without a usable key.

use std::collections::HashSet;

use serde_json::Value;

use crate::goal::Goal;

const UNKNOWN_OWNER: &str = "Unknown";

/// Convert one raw goal record into a [`Goal`].
///
/// Returns `None` (logged, not raised) when the record yields no key.
pub fn normalize(raw: &Value) -> Option<Goal> {
    let key = raw.get("key").and_then(Value::as_str).unwrap_or("");
    if key.is_empty() {
        log::warn!("Skipping goal record without a usable key: {}", raw);
        return None;
    }

    let mut goal = Goal::new(key);

    goal.name = str_field(raw, "name");
    goal.target_date = str_field(raw, "targetDate");
    goal.start_date = str_field(raw, "startDate");
    goal.creation_date = str_field(raw, "creationDate");
    goal.archived = raw.get("archived").and_then(Value::as_bool).unwrap_or(false);

    goal.owner_name = raw
        .pointer("/owner/pii/name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_OWNER)
        .to_string();

    goal.progress_type = raw
        .pointer("/progress/type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    // A null parent object is a legal forest root, not an error.
    goal.parent_key = raw
        .pointer("/parentGoal/key")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(str::to_string);

    goal.child_keys = edge_values(raw, "subGoals", "key");
    goal.tags = edge_values(raw, "tags", "name");
    goal.teams = edge_values(raw, "teamsV2", "name");

    if let Some(lineage) = extract_lineage(raw) {
        goal.lineage = lineage;
    }

    Some(goal)
}

fn str_field(raw: &Value, field: &str) -> String {
    raw.get(field).and_then(Value::as_str).unwrap_or("").to_string()
}

/// Collect `node.<field>` across a relay-style `{ edges: [{ node: {..} }] }`
/// connection. Null connections, null edge lists and nodes missing the field
/// all yield nothing. These fields are ordered sets: duplicate entries keep
/// their first position and drop the rest.
fn edge_values(raw: &Value, connection: &str, field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.get(connection)
        .and_then(|c| c.get("edges"))
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.pointer(&format!("/node/{}", field)))
                .filter_map(Value::as_str)
                .filter(|v| !v.is_empty())
                .filter(|v| seen.insert(v.to_string()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Lineage rule: scan custom-field entries in source order and take the first
/// entry whose first value is non-empty. No usable value means the caller's
/// default (the goal key) stands.
fn extract_lineage(raw: &Value) -> Option<String> {
    let fields = raw
        .pointer("/customFields/edges")
        .and_then(Value::as_array)?;

    for field in fields {
        let value = field
            .pointer("/node/values/edges/0/node/value")
            .and_then(Value::as_str)
            .unwrap_or("");
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Value {
        json!({
            "key": "CRE-1",
            "name": "Raise the bar",
            "archived": false,
            "targetDate": "Dec 2025",
            "startDate": "Jan 2025",
            "creationDate": "2025-01-02T10:00:00Z",
            "owner": { "aaid": "a1", "pii": { "name": "Dana Rey", "email": "d@example.com" } },
            "progress": { "type": "ATTACHED_METRIC", "percentage": 40 },
            "parentGoal": { "key": "CRE-0", "name": "Root" },
            "subGoals": { "edges": [
                { "node": { "key": "CRE-2", "name": "Child A" } },
                { "node": { "key": "CRE-3", "name": "Child B" } }
            ]},
            "tags": { "edges": [ { "node": { "name": "q3" } } ] },
            "teamsV2": { "edges": [ { "node": { "name": "UKI Pod 3", "teamId": "t1" } } ] },
            "customFields": { "edges": [
                { "node": {} },
                { "node": { "values": { "edges": [ { "node": { "value": "Enterprise" } } ] } } }
            ]}
        })
    }

    #[test]
    fn test_normalize_full_record() {
        let goal = normalize(&full_record()).unwrap();
        assert_eq!(goal.key, "CRE-1");
        assert_eq!(goal.name, "Raise the bar");
        assert_eq!(goal.owner_name, "Dana Rey");
        assert_eq!(goal.parent_key.as_deref(), Some("CRE-0"));
        assert_eq!(goal.child_keys, vec!["CRE-2", "CRE-3"]);
        assert_eq!(goal.tags, vec!["q3"]);
        assert_eq!(goal.teams, vec!["UKI Pod 3"]);
        assert_eq!(goal.progress_type, "ATTACHED_METRIC");
        assert_eq!(goal.lineage, "Enterprise");
        assert!(!goal.archived);
    }

    #[test]
    fn test_normalize_null_substructures() {
        let raw = json!({
            "key": "CRE-9",
            "name": "Bare goal",
            "owner": null,
            "progress": null,
            "parentGoal": null,
            "subGoals": null,
            "tags": null,
            "teamsV2": null,
            "customFields": null
        });
        let goal = normalize(&raw).unwrap();
        assert_eq!(goal.owner_name, "Unknown");
        assert_eq!(goal.parent_key, None);
        assert!(goal.child_keys.is_empty());
        assert!(goal.tags.is_empty());
        assert!(goal.teams.is_empty());
        assert_eq!(goal.progress_type, "");
    }

    #[test]
    fn test_normalize_missing_key_is_none() {
        assert!(normalize(&json!({ "name": "keyless" })).is_none());
        assert!(normalize(&json!({ "key": "" })).is_none());
        assert!(normalize(&json!({})).is_none());
    }

    #[test]
    fn test_lineage_defaults_to_key() {
        let raw = json!({
            "key": "CRE-7",
            "customFields": { "edges": [
                { "node": { "values": { "edges": [ { "node": { "value": "" } } ] } } },
                { "node": { "values": null } }
            ]}
        });
        let goal = normalize(&raw).unwrap();
        assert_eq!(goal.lineage, "CRE-7");
    }

    #[test]
    fn test_lineage_takes_first_usable_value() {
        let raw = json!({
            "key": "CRE-8",
            "customFields": { "edges": [
                { "node": { "values": { "edges": [] } } },
                { "node": { "values": { "edges": [ { "node": { "value": "H2 Bets" } } ] } } },
                { "node": { "values": { "edges": [ { "node": { "value": "Later" } } ] } } }
            ]}
        });
        assert_eq!(normalize(&raw).unwrap().lineage, "H2 Bets");
    }

    #[test]
    fn test_edges_with_partial_nodes() {
        let raw = json!({
            "key": "CRE-5",
            "subGoals": { "edges": [
                { "node": { "key": "CRE-6" } },
                { "node": {} },
                {}
            ]}
        });
        assert_eq!(normalize(&raw).unwrap().child_keys, vec!["CRE-6"]);
    }

    #[test]
    fn test_duplicate_edges_kept_once_in_order() {
        let raw = json!({
            "key": "CRE-10",
            "subGoals": { "edges": [
                { "node": { "key": "CRE-11" } },
                { "node": { "key": "CRE-12" } },
                { "node": { "key": "CRE-11" } }
            ]},
            "teamsV2": { "edges": [
                { "node": { "name": "UKI Pod 3" } },
                { "node": { "name": "UKI Pod 3" } }
            ]}
        });
        let goal = normalize(&raw).unwrap();
        assert_eq!(goal.child_keys, vec!["CRE-11", "CRE-12"]);
        assert_eq!(goal.teams, vec!["UKI Pod 3"]);
    }

    #[test]
    fn test_archived_flag_preserved() {
        let raw = json!({ "key": "CRE-4", "archived": true });
        assert!(normalize(&raw).unwrap().archived);
    }
}
