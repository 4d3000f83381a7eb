use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::planning::MAX_PREREQUISITE_DEPTH;

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
    pub planner: PlannerConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            planner: PlannerConfig::from_env()?,
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
}

/// Planner limits and the optional catalog used to seed in-memory collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub max_prerequisite_depth: usize,
    pub catalog_path: Option<PathBuf>,
}

impl PlannerConfig {
    pub const DEFAULT_MAX_PREREQUISITE_DEPTH: usize = 32;

    fn from_env() -> Result<Self, ConfigError> {
        let max_prerequisite_depth = match env::var("PLANNER_MAX_PREREQUISITE_DEPTH") {
            Ok(raw) => {
                let depth = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidPrerequisiteDepth { value: raw.clone() })?;
                if !(1..=MAX_PREREQUISITE_DEPTH).contains(&depth) {
                    return Err(ConfigError::InvalidPrerequisiteDepth { value: raw });
                }
                depth
            }
            Err(_) => Self::DEFAULT_MAX_PREREQUISITE_DEPTH,
        };

        let catalog_path = env::var("PLANNER_CATALOG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            max_prerequisite_depth,
            catalog_path,
        })
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_prerequisite_depth: Self::DEFAULT_MAX_PREREQUISITE_DEPTH,
            catalog_path: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPrerequisiteDepth { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPrerequisiteDepth { value } => write!(
                f,
                "PLANNER_MAX_PREREQUISITE_DEPTH must be between 1 and {}, got '{}'",
                MAX_PREREQUISITE_DEPTH, value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPrerequisiteDepth { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
