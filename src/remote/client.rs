use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::{AtlassianConfig, ScrapeConfig};
use crate::error::{OkrsnapError, Result};
use crate::remote::{queries, FetchError, GoalFetcher};

const CLIENT_NAME: &str = "townsquare-frontend";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

/// Production [`GoalFetcher`] talking to the Townsquare GraphQL gateway.
///
/// Session cookies are supplied externally (spec: no session management here);
/// the client just replays them on every request, the way the frontend would.
pub struct TownsquareClient {
    http: Client,
    config: AtlassianConfig,
    cookies: String,
    page_size: u32,
}

impl TownsquareClient {
    pub fn new(config: AtlassianConfig, cookies: String, scrape: &ScrapeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(scrape.request_timeout_secs))
            .build()
            .map_err(|e| OkrsnapError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            cookies,
            page_size: scrape.page_size,
        })
    }

    /// POST one GraphQL operation and parse the JSON body. Shared by the
    /// per-goal and directory paths; callers interpret the `data` shape.
    async fn post_graphql(
        &self,
        operation_name: &str,
        referer: &str,
        payload: &Value,
    ) -> std::result::Result<Value, FetchError> {
        let url = queries::graphql_url(&self.config.base_url, &self.config.cloud_id, operation_name);

        let response = self
            .http
            .post(&url)
            .header("accept", "*/*")
            .header("atl-client-name", CLIENT_NAME)
            .header("origin", &self.config.base_url)
            .header("user-agent", USER_AGENT)
            .header("cookie", &self.cookies)
            .header("referer", referer)
            .json(payload)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            // Truncate: gateway error pages can be whole HTML documents.
            let body: String = body.chars().take(200).collect();
            return Err(FetchError::Status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to parse response: {}", e)))
    }
}

impl GoalFetcher for TownsquareClient {
    async fn fetch_goal_detail(&self, key: &str) -> std::result::Result<Value, FetchError> {
        let payload = queries::goal_detail_payload(&self.config, key);
        let referer = queries::goal_referer(&self.config, key);

        let body = self
            .post_graphql("GoalViewAsideQuery", &referer, &payload)
            .await?;

        // Any shape other than a present, non-null data.goal is a soft miss.
        match body.pointer("/data/goal") {
            Some(goal) if !goal.is_null() => Ok(goal.clone()),
            _ => Err(FetchError::MissingGoal),
        }
    }

    async fn fetch_initial_roots(&self) -> Result<Vec<String>> {
        let referer = queries::directory_referer(&self.config);
        drain_directory_pages(|after| {
            let payload =
                queries::directory_page_payload(&self.config, self.page_size, after.as_deref());
            let referer = referer.clone();
            async move {
                self.post_graphql("DirectoryTableViewGoalPaginationQuery", &referer, &payload)
                    .await
            }
        })
        .await
    }
}

/// One parsed directory page: the goal keys it lists and the cursor for the
/// next page, if there is one.
struct DirectoryPage {
    keys: Vec<String>,
    next_cursor: Option<String>,
}

/// Interpret one directory response body.
///
/// A missing or null `data.goalTqlFullHierarchy` is an invalid response
/// (fatal); keyless edges are skipped; `next_cursor` is present only when the
/// page both reports `hasNextPage` and carries an `endCursor`.
fn parse_directory_page(body: &Value) -> Result<DirectoryPage> {
    let hierarchy = body
        .pointer("/data/goalTqlFullHierarchy")
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            OkrsnapError::Remote("directory snapshot: invalid response structure".to_string())
        })?;

    let keys = hierarchy
        .pointer("/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.pointer("/node/key"))
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let has_next = hierarchy
        .pointer("/pageInfo/hasNextPage")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let next_cursor = hierarchy
        .pointer("/pageInfo/endCursor")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|_| has_next);

    Ok(DirectoryPage { keys, next_cursor })
}

/// Walk the directory view cursor by cursor until every page is drained; a
/// partial root list would silently shrink the traversal frontier.
///
/// `fetch_page` is called with the previous page's cursor (`None` first). A
/// page that echoes the cursor it was fetched with stops the walk — some
/// gateways repeat the final cursor instead of clearing `hasNextPage`, and
/// that shape would otherwise loop forever.
async fn drain_directory_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<String>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<Value, FetchError>>,
{
    let mut roots = Vec::new();
    let mut after: Option<String> = None;
    let mut page = 0usize;

    loop {
        page += 1;
        let body = fetch_page(after.clone())
            .await
            .map_err(|e| OkrsnapError::Remote(format!("directory snapshot: {}", e)))?;

        let parsed = parse_directory_page(&body)?;
        log::debug!("Directory page {}: {} keys", page, parsed.keys.len());
        roots.extend(parsed.keys);

        match parsed.next_cursor {
            Some(cursor) if after.as_deref() == Some(cursor.as_str()) => {
                log::warn!("Directory page {} repeated cursor {:?}; stopping pagination", page, cursor);
                break;
            }
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    log::info!("Initial snapshot complete: {} root goals across {} page(s)", roots.len(), page);
    Ok(roots)
}
