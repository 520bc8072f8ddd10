use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::access::ActorId;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreConfig,
    pub admin: AdminConfig,
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::parse(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        let store = StoreConfig::from_env()?;
        let admin = AdminConfig::from_env()?;

        let seed_demo = match env::var("APP_SEED_DEMO") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag { name: "APP_SEED_DEMO" })?,
            Err(_) => false,
        };

        if environment == AppEnvironment::Production && matches!(store, StoreConfig::Memory) {
            return Err(ConfigError::MemoryStoreInProduction);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            store,
            admin,
            seed_demo,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Which persistent store backs the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Hosted(HostedStoreConfig),
}

/// Connection details for the hosted database's REST surface.
#[derive(Clone, PartialEq, Eq)]
pub struct HostedStoreConfig {
    pub base_url: url::Url,
    pub api_key: String,
}

impl fmt::Debug for HostedStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedStoreConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "hosted" => {
                let raw_url = env::var("STORE_URL").map_err(|_| ConfigError::Missing("STORE_URL"))?;
                let base_url = url::Url::parse(raw_url.trim())
                    .map_err(|source| ConfigError::InvalidStoreUrl { source })?;
                let api_key =
                    env::var("STORE_API_KEY").map_err(|_| ConfigError::Missing("STORE_API_KEY"))?;
                Ok(Self::Hosted(HostedStoreConfig { base_url, api_key }))
            }
            other => Err(ConfigError::UnknownStoreBackend(other.to_string())),
        }
    }
}

/// Route guard settings for the administrative section.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub session_cookie: String,
    pub login_path: String,
    /// Statically provisioned session tokens, mapped to the actor they belong to.
    pub static_sessions: BTreeMap<String, ActorId>,
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let session_cookie =
            env::var("ADMIN_SESSION_COOKIE").unwrap_or_else(|_| "admin_session".to_string());
        let login_path = env::var("ADMIN_LOGIN_PATH").unwrap_or_else(|_| "/admin/login".to_string());
        if !login_path.starts_with('/') {
            return Err(ConfigError::InvalidLoginPath(login_path));
        }

        let static_sessions = match env::var("ADMIN_SESSIONS") {
            Ok(raw) => parse_static_sessions(&raw)?,
            Err(_) => BTreeMap::new(),
        };

        Ok(Self {
            session_cookie,
            login_path,
            static_sessions,
        })
    }
}

/// Parses `token:actor,token:actor` pairs.
fn parse_static_sessions(raw: &str) -> Result<BTreeMap<String, ActorId>, ConfigError> {
    let mut sessions = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (token, actor) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidSessionEntry(entry.to_string()))?;
        let (token, actor) = (token.trim(), actor.trim());
        if token.is_empty() || actor.is_empty() {
            return Err(ConfigError::InvalidSessionEntry(entry.to_string()));
        }
        sessions.insert(token.to_string(), ActorId(actor.to_string()));
    }
    Ok(sessions)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidFlag { name: &'static str },
    Missing(&'static str),
    UnknownStoreBackend(String),
    InvalidStoreUrl { source: url::ParseError },
    InvalidLoginPath(String),
    InvalidSessionEntry(String),
    MemoryStoreInProduction,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidFlag { name } => write!(f, "{name} must be a boolean flag"),
            ConfigError::Missing(name) => write!(f, "{name} must be set"),
            ConfigError::UnknownStoreBackend(value) => {
                write!(f, "STORE_BACKEND must be 'memory' or 'hosted', got '{value}'")
            }
            ConfigError::InvalidStoreUrl { .. } => write!(f, "STORE_URL must be an absolute URL"),
            ConfigError::InvalidLoginPath(value) => {
                write!(f, "ADMIN_LOGIN_PATH must start with '/', got '{value}'")
            }
            ConfigError::InvalidSessionEntry(entry) => {
                write!(f, "ADMIN_SESSIONS entry '{entry}' must look like token:actor")
            }
            ConfigError::MemoryStoreInProduction => {
                write!(f, "the memory store backend cannot be used in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidStoreUrl { source } => Some(source),
            _ => None,
        }
    }
}
