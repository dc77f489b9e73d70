use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub events: String,
    pub attendance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Empty or absent runs the cache in-process only
    #[serde(default)]
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_min_proposal_score")]
    pub min_proposal_score: u8,
    #[serde(default = "default_max_proposals_per_run")]
    pub max_proposals_per_run: usize,
    #[serde(default = "default_attendance_retries")]
    pub attendance_retries: u32,
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_proposal_score: default_min_proposal_score(),
            max_proposals_per_run: default_max_proposals_per_run(),
            attendance_retries: default_attendance_retries(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_min_proposal_score() -> u8 { 70 }
fn default_max_proposals_per_run() -> usize { 10 }
fn default_attendance_retries() -> u32 { 3 }
fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PLAYMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PLAYMATCH__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("PLAYMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Well-known variables that take precedence over file values
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }
    if let Ok(api_key) = env::var("APPWRITE_API_KEY") {
        builder = builder.set_override("appwrite.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching_settings() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.min_proposal_score, 70);
        assert_eq!(matching.max_proposals_per_run, 10);
        assert_eq!(matching.attendance_retries, 3);
        assert_eq!(matching.default_limit, 20);
        assert_eq!(matching.max_limit, 100);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("playmatch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[appwrite]
endpoint = "https://appwrite.test/v1"
api_key = "key"
project_id = "project"
database_id = "db"

[collection]
events = "events"
attendance = "attendance"

[database]
url = "postgres://localhost/playmatch"

[cache]
ttl_secs = 30

[matching]
min_proposal_score = 85
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.matching.min_proposal_score, 85);
        assert_eq!(settings.matching.attendance_retries, 3);
        assert!(settings.cache.redis_url.is_none());
        assert_eq!(settings.logging.format, "json");
    }
}
