//! GraphQL payload builders for the Townsquare gateway.
//!
//! Pure functions so the request shapes are testable without I/O. The goal
//! detail query mirrors the query the Townsquare frontend issues for the goal
//! side panel; the directory query is trimmed down to the fields the scraper
//! actually reads (keys and page info).

use crate::config::AtlassianConfig;
use serde_json::{json, Value};

/// Per-goal detail query (operation `GoalViewAsideQuery`).
const GOAL_DETAIL_QUERY: &str = "query GoalViewAsideQuery($key: String!, $trackViewEvent: TrackViewEvent, $isNavRefreshEnabled: Boolean!, $containerId: String!) { workspaceGoalTypes: townsquare { goalTypes(containerId: $containerId) { edges { node { __typename id } } } } goal: goalByKey(key: $key, trackViewEvent: $trackViewEvent) @include(if: $isNavRefreshEnabled) { owner { aaid id pii { name email accountId } } key name archived targetDate startDate creationDate progress { type percentage } parentGoal { key name } subGoals { edges { node { key name archived } } } tags { edges { node { name } } } teamsV2 { edges { node { name teamId } } } customFields { edges { node { ... on TextSelectCustomField { values { edges { node { value } } } } } } } id } }";

/// Directory-view pagination query (operation `Goals`).
const DIRECTORY_QUERY: &str = "query Goals($after: String, $containerId: String, $directoryViewUuid: UUID, $first: Int = 50, $includedCustomFieldUuids: [UUID!], $sorts: [GoalSortEnum], $tql: String, $workspaceUuid: UUID) { goalTqlFullHierarchy(first: $first, after: $after, q: $tql, workspaceUuid: $workspaceUuid, containerId: $containerId, sorts: $sorts, directoryViewUuid: $directoryViewUuid) { count edges { node { id key __typename } cursor } pageInfo { endCursor hasNextPage } } }";

/// ARI of the Townsquare site container for this cloud id.
pub fn container_id(cloud_id: &str) -> String {
    format!("ari:cloud:townsquare::site/{}", cloud_id)
}

/// Gateway GraphQL endpoint for one named operation.
pub fn graphql_url(base_url: &str, cloud_id: &str, operation_name: &str) -> String {
    format!(
        "{}/gateway/api/townsquare/s/{}/graphql?operationName={}",
        base_url, cloud_id, operation_name
    )
}

/// Referer the frontend would send when viewing one goal; the gateway expects it.
pub fn goal_referer(config: &AtlassianConfig, goal_key: &str) -> String {
    format!(
        "{}/o/{}/s/{}/goal/{}",
        config.base_url, config.organization_id, config.cloud_id, goal_key
    )
}

/// Referer for the goals directory view.
pub fn directory_referer(config: &AtlassianConfig) -> String {
    format!(
        "{}/o/{}/goals?viewUuid={}&cloudId={}",
        config.base_url, config.organization_id, config.directory_view_uuid, config.cloud_id
    )
}

/// Request body for one goal's detail.
pub fn goal_detail_payload(config: &AtlassianConfig, goal_key: &str) -> Value {
    json!({
        "query": GOAL_DETAIL_QUERY,
        "variables": {
            "key": goal_key,
            "trackViewEvent": "DIRECT",
            "isNavRefreshEnabled": true,
            "containerId": container_id(&config.cloud_id),
        }
    })
}

/// Request body for one page of the directory view. `after` is the cursor
/// from the previous page's `pageInfo.endCursor`, `None` for the first page.
pub fn directory_page_payload(
    config: &AtlassianConfig,
    page_size: u32,
    after: Option<&str>,
) -> Value {
    json!({
        "query": DIRECTORY_QUERY,
        "variables": {
            "after": after,
            "containerId": container_id(&config.cloud_id),
            "directoryViewUuid": config.directory_view_uuid,
            "first": page_size,
            "includedCustomFieldUuids": [config.custom_field_uuid],
            "sorts": null,
            "tql": null,
            "workspaceUuid": config.workspace_uuid,
        }
    })
}
