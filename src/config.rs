use std::str::FromStr;

use anyhow::{ensure, Context};
use serde::Deserialize;
use strum_macros::{Display, EnumString};

const CONFIG_PATH_VAR: &str = "DRIFT_MINER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";
/// Upper bound for `leaderboard.max_limit`, one response page never holds more entries.
const LEADERBOARD_LIMIT_CEILING: u32 = 1_000;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AppEnv {
    Local,
    Production,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Option<StoreBackend>,
    pub mongo_url: String,
    pub database: String,
    pub app_name: String,
    pub server_selection_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: None,
            mongo_url: String::from("mongodb://localhost:27017"),
            database: String::from("drift_miner"),
            app_name: String::from("drift-miner-api"),
            server_selection_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// Local runs fall back to the in-memory store unless a backend is configured.
    pub fn resolve_backend(&self, env: AppEnv) -> StoreBackend {
        match (self.backend, env) {
            (Some(backend), _) => backend,
            (None, AppEnv::Local) => StoreBackend::Memory,
            (None, AppEnv::Production) => StoreBackend::Mongo,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub request_timeout_ms: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        LeaderboardConfig {
            default_limit: 50,
            max_limit: 100,
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_port: u16,
    pub app_env: AppEnv,
    pub log_level: String,
    pub store: StoreConfig,
    pub leaderboard: LeaderboardConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            listen_port: 8080,
            app_env: AppEnv::Production,
            log_level: String::from("info"),
            store: StoreConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl ApiConfig {
    pub async fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH));
        let mut config = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Self::from_yaml(&raw).with_context(|| format!("parsing {}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ApiConfig::default(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path)),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(port) = lookup("PORT") {
            self.listen_port = port.parse().with_context(|| format!("PORT '{}' is not a valid port", port))?;
        }
        if let Some(env) = lookup("APP_ENV") {
            self.app_env = AppEnv::from_str(&env).with_context(|| format!("unknown APP_ENV '{}'", env))?;
        }
        if let Some(url) = lookup("MONGO_URL") {
            self.store.mongo_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let leaderboard = &self.leaderboard;
        ensure!(
            (1..=LEADERBOARD_LIMIT_CEILING).contains(&leaderboard.max_limit),
            "leaderboard.max_limit must be between 1 and {}",
            LEADERBOARD_LIMIT_CEILING
        );
        ensure!(
            (1..=leaderboard.max_limit).contains(&leaderboard.default_limit),
            "leaderboard.default_limit must be between 1 and max_limit ({})",
            leaderboard.max_limit
        );
        ensure!(leaderboard.request_timeout_ms > 0, "leaderboard.request_timeout_ms must be positive");
        Ok(())
    }
}
