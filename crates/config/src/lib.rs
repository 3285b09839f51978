use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "taskdesk.toml",
    "config/taskdesk.toml",
    "crates/config/taskdesk.toml",
    "../taskdesk.toml",
    "../config/taskdesk.toml",
    "../crates/config/taskdesk.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://taskdesk.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Tunables of the conversation engine.
///
/// ```
/// use taskdesk_config::ChatConfig;
///
/// let chat = ChatConfig::default();
/// assert_eq!(chat.history_limit, 50);
/// assert_eq!(chat.max_message_length, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages delivered to a channel when it joins a conversation
    #[serde(default = "ChatConfig::default_history_limit")]
    pub history_limit: usize,
    /// Characters kept from a message body after sanitising
    #[serde(default = "ChatConfig::default_max_message_length")]
    pub max_message_length: usize,
    /// Events buffered per channel before new ones are dropped
    #[serde(default = "ChatConfig::default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl ChatConfig {
    const fn default_history_limit() -> usize {
        50
    }

    const fn default_max_message_length() -> usize {
        500
    }

    const fn default_outbound_buffer() -> usize {
        100
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: Self::default_history_limit(),
            max_message_length: Self::default_max_message_length(),
            outbound_buffer: Self::default_outbound_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origin allowed to call the API, `*` for any
    #[serde(default = "CorsConfig::default_allowed_origin")]
    pub allowed_origin: String,
}

impl CorsConfig {
    fn default_allowed_origin() -> String {
        "http://localhost:5173".to_string()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: Self::default_allowed_origin(),
        }
    }
}

impl AppConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.chat.history_limit > 0, "chat.history_limit must be positive");
        ensure!(
            self.chat.max_message_length > 0,
            "chat.max_message_length must be positive"
        );
        ensure!(self.chat.outbound_buffer > 0, "chat.outbound_buffer must be positive");
        ensure!(
            self.database.max_connections > 0,
            "database.max_connections must be positive"
        );
        Ok(())
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use taskdesk_config::load;
///
/// std::env::remove_var("TASKDESK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
        .set_default("chat.history_limit", as_i64(defaults.chat.history_limit))?
        .set_default("chat.max_message_length", as_i64(defaults.chat.max_message_length))?
        .set_default("chat.outbound_buffer", as_i64(defaults.chat.outbound_buffer))?
        .set_default("cors.allowed_origin", defaults.cors.allowed_origin.clone())?;

    let environment_overrides = config::Environment::with_prefix("TASKDESK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("TASKDESK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via TASKDESK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;
    config.validate().context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
