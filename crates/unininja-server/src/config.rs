//! Server configuration
//!
//! This module handles hierarchical configuration loading from multiple sources:
//! - Default configuration file
//! - Environment-specific configuration file
//! - Environment variables
//! - Command-line arguments

use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use unininja_api::{CorsConfig as ApiCorsConfig, GatewaySettings};
use unininja_db::PoolConfig;
use unininja_service::{unistats::DEFAULT_BASE_URL, UnistatsConfig};

/// Server configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    /// Server settings
    #[serde(default)]
    pub server: HttpServerConfig,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Unistats API settings
    #[serde(default)]
    pub unistats: UnistatsSection,

    /// Gateway behaviour
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// CORS settings
    #[serde(default)]
    pub cors: CorsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable graceful shutdown
    #[serde(default = "default_true")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            graceful_shutdown: default_true(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store connection URL
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Database name, overriding the one in the URL
    #[serde(default)]
    pub database: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default)]
    pub min_connections: u32,

    /// Seconds to wait for a connection before a request fails with 503
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Create the collections on startup
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_store_url() -> String {
    "postgresql://localhost/unininja".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: None,
            max_connections: default_max_connections(),
            min_connections: 0,
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            run_migrations: false,
        }
    }
}

impl StoreConfig {
    /// Pool settings for the store
    pub fn pool_config(&self) -> PoolConfig {
        let mut pool = PoolConfig::new(&self.url)
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds))
            .run_migrations(self.run_migrations);

        if let Some(database) = &self.database {
            pool = pool.database(database);
        }

        pool
    }
}

/// Unistats API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UnistatsSection {
    /// API root
    #[serde(default = "default_unistats_url")]
    pub base_url: String,

    /// Base64 Basic credential
    #[serde(default = "default_auth")]
    pub auth: SecretString,

    /// Per-call timeout in seconds
    #[serde(default = "default_unistats_timeout")]
    pub timeout_seconds: u64,
}

fn default_unistats_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_auth() -> SecretString {
    SecretString::new(String::new())
}

fn default_unistats_timeout() -> u64 {
    30
}

impl Default for UnistatsSection {
    fn default() -> Self {
        Self {
            base_url: default_unistats_url(),
            auth: default_auth(),
            timeout_seconds: default_unistats_timeout(),
        }
    }
}

impl UnistatsSection {
    /// Whether a credential has been configured
    pub fn has_credential(&self) -> bool {
        !self.auth.expose_secret().trim().is_empty()
    }

    /// Client settings for Unistats
    pub fn client_config(&self) -> UnistatsConfig {
        UnistatsConfig::new(self.auth.clone())
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
    }
}

/// Gateway behaviour configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    /// Where `GET /` redirects to
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Realm of the Basic challenge
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Serve GraphiQL to browsers
    #[serde(default = "default_true")]
    pub graphiql: bool,
}

fn default_redirect_url() -> String {
    "https://uni.ninja".to_string()
}

fn default_realm() -> String {
    "UniNinja API".to_string()
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            redirect_url: default_redirect_url(),
            realm: default_realm(),
            graphiql: default_true(),
        }
    }
}

impl GatewaySection {
    /// Settings handed to the API layer
    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            redirect_url: self.redirect_url.clone(),
            realm: self.realm.clone(),
            graphiql: self.graphiql,
            ..GatewaySettings::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON formatting
    #[serde(default)]
    pub json_format: bool,

    /// Include target module
    #[serde(default = "default_true")]
    pub include_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            include_target: true,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (empty means all)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Max age for preflight requests in seconds
    #[serde(default = "default_cors_max_age")]
    pub max_age_seconds: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            max_age_seconds: default_cors_max_age(),
        }
    }
}

impl CorsConfig {
    /// CORS settings for the API middleware
    pub fn api_config(&self) -> ApiCorsConfig {
        ApiCorsConfig {
            allowed_origins: self.allowed_origins.clone(),
            max_age_seconds: Some(self.max_age_seconds),
        }
    }
}

impl ServerConfig {
    /// Load configuration from files and environment
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default configuration file (config/default.toml)
    /// 2. Environment-specific file (config/{env}.toml)
    /// 3. Environment variables (UNININJA__*)
    pub fn load(config_dir: impl Into<PathBuf>, environment: &str) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();

        let config = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", environment))).required(false))
            // e.g. UNININJA__UNISTATS__AUTH=dXNlcjpwYXNz
            .add_source(
                Environment::with_prefix("UNININJA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration with defaults if files don't exist
    pub fn load_or_default(config_dir: impl Into<PathBuf>, environment: &str) -> Self {
        Self::load(config_dir, environment).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load configuration: {}", e);
            eprintln!("Using default configuration");
            Self::default()
        })
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
