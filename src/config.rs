use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;
use uuid::Uuid;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub atlassian: AtlassianConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// Category name -> list of root-goal names that map to it. Drives the
    /// root-ancestor classification in reporting; empty means everything
    /// classifies as "Other".
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
}

/// Remote Townsquare API configuration.
///
/// The session cookie itself is never stored in config.toml; only the name of
/// the environment variable that carries it (set it in .env or the process
/// environment).
#[derive(Debug, Clone, Deserialize)]
pub struct AtlassianConfig {
    /// e.g. "https://home.atlassian.com"
    pub base_url: String,
    pub organization_id: String,
    pub cloud_id: String,
    pub workspace_uuid: Uuid,
    pub directory_view_uuid: Uuid,
    pub custom_field_uuid: Uuid,
    #[serde(default = "default_cookie_env")]
    pub cookie_env: String,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored snapshots; rows land under `<output_dir>/okrs/`.
    pub output_dir: PathBuf,
}

/// Traversal tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Page size for the directory-view root query.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout for the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Optional ceiling on the number of goals fetched in one run. Absent
    /// means unbounded (the cycle guard is the only limit).
    #[serde(default)]
    pub max_goals: Option<usize>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            max_goals: None,
        }
    }
}

fn default_cookie_env() -> String {
    "ATLASSIAN_COOKIES".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in OKRSNAP_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("OKRSNAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        Url::parse(&self.atlassian.base_url)
            .with_context(|| format!("atlassian.base_url is not a valid URL: {}", self.atlassian.base_url))?;

        if self.atlassian.organization_id.trim().is_empty() {
            anyhow::bail!("atlassian.organization_id must not be empty");
        }

        if self.atlassian.cloud_id.trim().is_empty() {
            anyhow::bail!("atlassian.cloud_id must not be empty");
        }

        // Check that the session cookie is reachable. The value stays in the
        // environment (or .env, already loaded in Config::load).
        std::env::var(&self.atlassian.cookie_env).with_context(|| {
            format!(
                "Environment variable {} not set. Put your Atlassian session cookies in your .env file or the environment.",
                self.atlassian.cookie_env
            )
        })?;

        if self.scrape.page_size == 0 {
            anyhow::bail!("scrape.page_size must be greater than 0");
        }

        if self.scrape.max_goals == Some(0) {
            anyhow::bail!("scrape.max_goals must be greater than 0 when set (omit it for unbounded)");
        }

        Ok(())
    }

    /// Read the session cookie header value from the configured environment variable.
    pub fn cookies(&self) -> Result<String> {
        std::env::var(&self.atlassian.cookie_env).with_context(|| {
            format!("Environment variable {} not set", self.atlassian.cookie_env)
        })
    }

    /// Flatten the `[categories]` groups into a root-goal-name -> category map.
    pub fn category_table(&self) -> HashMap<String, String> {
        let mut table = HashMap::new();
        for (category, root_names) in &self.categories {
            for name in root_names {
                table.insert(name.clone(), category.clone());
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn test_config_toml() -> &'static str {
        r#"
[atlassian]
base_url = "https://home.atlassian.com"
organization_id = "test-org"
cloud_id = "a7c1f9e2-0000-0000-0000-000000000001"
workspace_uuid = "a7c1f9e2-0000-0000-0000-000000000002"
directory_view_uuid = "a7c1f9e2-0000-0000-0000-000000000003"
custom_field_uuid = "a7c1f9e2-0000-0000-0000-000000000004"

[storage]
output_dir = "./snapshots"

[scrape]
page_size = 25

[categories]
"Corporate Goals" = ["Enterprise gradeness", "Exit / IPO Readiness"]
"CRE Growth" = ["Raise the bar"]
"#
    }

    fn with_config_env(config_path: &std::path::Path, cookies: Option<&str>, f: impl FnOnce()) {
        let original_config = std::env::var("OKRSNAP_CONFIG").ok();
        let original_cookies = std::env::var("ATLASSIAN_COOKIES").ok();
        std::env::set_var("OKRSNAP_CONFIG", config_path.to_str().unwrap());
        match cookies {
            Some(c) => std::env::set_var("ATLASSIAN_COOKIES", c),
            None => std::env::remove_var("ATLASSIAN_COOKIES"),
        }
        f();
        std::env::remove_var("OKRSNAP_CONFIG");
        std::env::remove_var("ATLASSIAN_COOKIES");
        if let Some(val) = original_config {
            std::env::set_var("OKRSNAP_CONFIG", val);
        }
        if let Some(val) = original_cookies {
            std::env::set_var("ATLASSIAN_COOKIES", val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, test_config_toml()).unwrap();
        with_config_env(&config_path, Some("cloud.session.token=abc"), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.scrape.page_size, 25);
            assert_eq!(config.scrape.request_timeout_secs, 30);
            assert_eq!(config.scrape.max_goals, None);
            assert_eq!(config.atlassian.organization_id, "test-org");
            assert_eq!(config.cookies().unwrap(), "cloud.session.token=abc");
        });
    }

    #[test]
    fn test_config_missing_cookies() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, test_config_toml()).unwrap();
        with_config_env(&config_path, None, || {
            let config = Config::load();
            assert!(config.is_err(), "Expected missing cookie error");
            assert!(config.unwrap_err().to_string().contains("ATLASSIAN_COOKIES"));
        });
    }

    #[test]
    fn test_config_invalid_uuid() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let bad = test_config_toml().replace(
            "a7c1f9e2-0000-0000-0000-000000000002",
            "not-a-uuid",
        );
        fs::write(&config_path, bad).unwrap();
        with_config_env(&config_path, Some("c=1"), || {
            assert!(Config::load().is_err());
        });
    }

    #[test]
    fn test_config_zero_max_goals_rejected() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let bad = test_config_toml().replace("page_size = 25", "page_size = 25\nmax_goals = 0");
        fs::write(&config_path, bad).unwrap();
        with_config_env(&config_path, Some("c=1"), || {
            let err = Config::load().unwrap_err().to_string();
            assert!(err.contains("max_goals"));
        });
    }

    #[test]
    fn test_category_table_flattening() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, test_config_toml()).unwrap();
        with_config_env(&config_path, Some("c=1"), || {
            let config = Config::load().unwrap();
            let table = config.category_table();
            assert_eq!(table.get("Enterprise gradeness").map(String::as_str), Some("Corporate Goals"));
            assert_eq!(table.get("Raise the bar").map(String::as_str), Some("CRE Growth"));
            assert!(table.get("Unmapped root").is_none());
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("OKRSNAP_CONFIG").ok();
        std::env::set_var("OKRSNAP_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("OKRSNAP_CONFIG");
        if let Some(v) = original {
            std::env::set_var("OKRSNAP_CONFIG", v);
        }
    }
}
