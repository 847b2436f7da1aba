//! Snapshot serializer: collected goals -> the tabular export format.
//!
//! The format is the warehouse loader's contract and is kept stable:
//! a fixed column order, one `created_at` stamp shared by every row of a run,
//! `;`-joined list fields, and the literal token `null` for empty values
//! (distinguishing "present but empty" from missing data downstream).

use chrono::{DateTime, Utc};

use crate::error::{OkrsnapError, Result};
use crate::goal::Goal;

/// Fixed snapshot header. Column order is part of the format.
pub const SNAPSHOT_HEADER: &str = "created_at,Owner,Goal Key,Target Date,Name,Parent Goal,Sub-goals,Tags,Progress Type,Teams,Start Date,Creation Date,Lineage";

/// Join delimiter for list-valued columns.
const LIST_DELIMITER: &str = ";";

/// Empty-value token.
const NULL_TOKEN: &str = "null";

/// Run-level capture stamp: fixed-width numeric, minute resolution.
pub fn capture_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M").to_string()
}

/// Object name for one run's snapshot.
pub fn snapshot_filename(stamp: &str) -> String {
    format!("export-{}_processed.csv", stamp)
}

/// Render the collected goals into the snapshot format.
///
/// Archived goals are filtered out entirely. Output is deterministic for
/// identical input content and order; row order follows `goals`.
pub fn render(goals: &[Goal], captured_at: &str) -> String {
    let mut lines = Vec::with_capacity(goals.len() + 1);
    lines.push(SNAPSHOT_HEADER.to_string());

    for goal in goals.iter().filter(|g| !g.archived) {
        lines.push(format!(
            "{},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"",
            captured_at,
            text_field(&goal.owner_name),
            scalar_field(&goal.key),
            scalar_field(&goal.target_date),
            text_field(&goal.name),
            scalar_field(goal.parent_key.as_deref().unwrap_or("")),
            list_field(&goal.child_keys),
            list_field(&goal.tags),
            scalar_field(&goal.progress_type),
            list_field(&goal.teams),
            scalar_field(&goal.start_date),
            scalar_field(&goal.creation_date),
            text_field(&goal.lineage),
        ));
    }

    let non_archived = lines.len() - 1;
    log::info!(
        "Snapshot rendered: {} rows ({} archived goals excluded)",
        non_archived,
        goals.len() - non_archived
    );

    lines.join("\n")
}

/// Structured scalar (keys, dates, progress type): the value, or `null` when empty.
fn scalar_field(value: &str) -> String {
    if value.is_empty() {
        NULL_TOKEN.to_string()
    } else {
        value.to_string()
    }
}

/// Free-text scalar (owner, name, lineage): commas are substituted with
/// semicolons and quotes doubled so one logical field never splits a column
/// in naive loaders.
fn text_field(value: &str) -> String {
    if value.is_empty() {
        NULL_TOKEN.to_string()
    } else {
        value.replace(',', ";").replace('"', "\"\"")
    }
}

/// List column: `;`-joined values; the empty list renders as `null`, not `""`.
fn list_field(values: &[String]) -> String {
    if values.is_empty() {
        NULL_TOKEN.to_string()
    } else {
        values.join(LIST_DELIMITER)
    }
}

/// Parse a rendered snapshot back into `(created_at, goals)`.
///
/// Used by the reporting path (tree rendering, classification) to work from
/// a stored export without re-scraping. Archived goals never appear in a
/// snapshot, so every parsed goal has `archived = false`.
pub fn parse(content: &str) -> Result<(String, Vec<Goal>)> {
    let mut lines = content.lines();

    match lines.next() {
        Some(header) if header == SNAPSHOT_HEADER => {}
        other => {
            return Err(OkrsnapError::Snapshot(format!(
                "unexpected snapshot header: {:?}",
                other.unwrap_or("")
            )))
        }
    }

    let mut created_at = String::new();
    let mut goals = Vec::new();

    for (idx, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields = split_row(line);
        if fields.len() != 13 {
            return Err(OkrsnapError::Snapshot(format!(
                "row {} has {} columns, expected 13",
                idx + 1,
                fields.len()
            )));
        }

        if created_at.is_empty() {
            created_at = fields[0].clone();
        }

        let key = unnull(&fields[2]);
        if key.is_empty() {
            return Err(OkrsnapError::Snapshot(format!("row {} has no goal key", idx + 1)));
        }

        let mut goal = Goal::new(key);
        goal.owner_name = unnull(&fields[1]);
        goal.target_date = unnull(&fields[3]);
        goal.name = unnull(&fields[4]);
        goal.parent_key = Some(unnull(&fields[5])).filter(|p| !p.is_empty());
        goal.child_keys = split_list(&fields[6]);
        goal.tags = split_list(&fields[7]);
        goal.progress_type = unnull(&fields[8]);
        goal.teams = split_list(&fields[9]);
        goal.start_date = unnull(&fields[10]);
        goal.creation_date = unnull(&fields[11]);
        let lineage = unnull(&fields[12]);
        if !lineage.is_empty() {
            goal.lineage = lineage;
        }

        goals.push(goal);
    }

    Ok((created_at, goals))
}

/// Quote-aware row splitter for the snapshot's own quoting rules
/// (fields optionally wrapped in `"`, embedded quotes doubled).
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

fn unnull(value: &str) -> String {
    if value == NULL_TOKEN {
        String::new()
    } else {
        value.to_string()
    }
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() || value == NULL_TOKEN {
        Vec::new()
    } else {
        value.split(LIST_DELIMITER).map(str::to_string).collect()
    }
}
