use crate::idss::domain::{OperatorSize, UnknownOperatorSize};
use chrono::Datelike;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub data: DataConfig,
    pub scoring: ScoringDefaults,
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

        let operational_path = env::var("APP_OPERATIONAL_DATA")
            .unwrap_or_else(|_| "data/idss_data.json".to_string());
        let historical_path = env::var("APP_HISTORICAL_DATA")
            .unwrap_or_else(|_| "data/historical_data.json".to_string());

        let operator_size = env::var("APP_OPERATOR_SIZE")
            .unwrap_or_else(|_| "pequeno".to_string())
            .parse::<OperatorSize>()
            .map_err(|source| ConfigError::InvalidOperatorSize { source })?;

        let reference_year = match env::var("APP_REFERENCE_YEAR") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidReferenceYear { value: raw })?,
            Err(_) => current_year(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                operational_path: PathBuf::from(operational_path),
                historical_path: PathBuf::from(historical_path),
            },
            scoring: ScoringDefaults {
                operator_size,
                reference_year,
            },
        })
    }
}

/// Calendar year on the local clock.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
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

/// Locations of the operational document and the historical archive.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub operational_path: PathBuf,
    pub historical_path: PathBuf,
}

/// Scoring context the service starts with.
#[derive(Debug, Clone, Copy)]
pub struct ScoringDefaults {
    pub operator_size: OperatorSize,
    pub reference_year: i32,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidOperatorSize { source: UnknownOperatorSize },
    InvalidReferenceYear { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidOperatorSize { source } => {
                write!(f, "APP_OPERATOR_SIZE is invalid: {source}")
            }
            ConfigError::InvalidReferenceYear { value } => {
                write!(f, "APP_REFERENCE_YEAR must be a year, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidReferenceYear { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidOperatorSize { source } => Some(source),
        }
    }
}
