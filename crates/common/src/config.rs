//! Application configuration.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration. When absent the in-memory store is used.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Store access policy (timeouts and retries).
    #[serde(default)]
    pub store: StoreConfig,
    /// Comment and reaction rules.
    #[serde(default)]
    pub interaction: InteractionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Store access configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    /// Upper bound for the backoff delay, in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Interaction rules.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionConfig {
    /// Roles allowed to delete any comment.
    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,
    /// Deepest indentation level used when rendering a thread.
    #[serde(default = "default_max_display_depth")]
    pub max_display_depth: usize,
    /// Maximum comment length in characters (after trimming).
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_timeout_ms() -> u64 {
    5000
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_retry_initial_delay_ms() -> u64 {
    50
}

const fn default_retry_max_delay_ms() -> u64 {
    1000
}

fn default_privileged_roles() -> Vec<String> {
    vec!["Admin".to_string(), "Administrator".to_string()]
}

const fn default_max_display_depth() -> usize {
    2
}

const fn default_max_content_length() -> usize {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl StoreConfig {
    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            privileged_roles: default_privileged_roles(),
            max_display_depth: default_max_display_depth(),
            max_content_length: default_max_content_length(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: None,
            store: StoreConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

/// `COLLOQUY__SECTION__KEY` variables, read from `vars` when given and from
/// the process environment otherwise. `privileged_roles` is comma-separated.
fn environment(vars: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix("COLLOQUY")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("interaction.privileged_roles")
        .try_parsing(true)
        .source(vars)
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `COLLOQUY_ENV`)
    /// 3. `COLLOQUY__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("COLLOQUY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(environment(None))
            .build()?;

        config.try_deserialize()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
