use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::{FixedOffset, Offset, Utc};

use crate::tracking::analytics::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::tracking::calendar::parse_utc_offset;

/// Upper bound for the upcoming-interview horizon.
pub const MAX_UPCOMING_DAYS: u32 = 3660;

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
    pub tracker: TrackerConfig,
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
            tracker: TrackerConfig::from_env()?,
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

/// Knobs for the dashboard and the reporting calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Length of the trailing activity heatmap, in days.
    pub activity_window_days: u32,
    /// How far ahead the dashboard looks for upcoming interviews.
    pub upcoming_days: u32,
    /// Size of the "found" and "active" dashboard lists.
    pub list_limit: usize,
    /// Offset used to turn instants into calendar days.
    pub utc_offset: FixedOffset,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            activity_window_days: DEFAULT_WINDOW_DAYS,
            upcoming_days: 30,
            list_limit: 5,
            utc_offset: Utc.fix(),
        }
    }
}

impl TrackerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let activity_window_days = match env::var("TRACKER_ACTIVITY_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
                .ok_or(ConfigError::InvalidWindow(raw))?,
            Err(_) => defaults.activity_window_days,
        };

        let upcoming_days = match env::var("TRACKER_UPCOMING_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| *days <= MAX_UPCOMING_DAYS)
                .ok_or(ConfigError::InvalidUpcomingDays(raw))?,
            Err(_) => defaults.upcoming_days,
        };

        let list_limit = match env::var("TRACKER_LIST_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidListLimit(raw))?,
            Err(_) => defaults.list_limit,
        };

        let utc_offset = match env::var("TRACKER_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw).map_err(|_| ConfigError::InvalidOffset(raw))?,
            Err(_) => defaults.utc_offset,
        };

        Ok(Self {
            activity_window_days,
            upcoming_days,
            list_limit,
            utc_offset,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWindow(String),
    InvalidUpcomingDays(String),
    InvalidListLimit(String),
    InvalidOffset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWindow(raw) => write!(
                f,
                "TRACKER_ACTIVITY_WINDOW_DAYS must be in 1..={MAX_WINDOW_DAYS} (got '{raw}')"
            ),
            ConfigError::InvalidUpcomingDays(raw) => write!(
                f,
                "TRACKER_UPCOMING_DAYS must be at most {MAX_UPCOMING_DAYS} (got '{raw}')"
            ),
            ConfigError::InvalidListLimit(raw) => write!(
                f,
                "TRACKER_LIST_LIMIT must be a non-negative integer (got '{raw}')"
            ),
            ConfigError::InvalidOffset(raw) => write!(
                f,
                "TRACKER_UTC_OFFSET must look like +02:00 or -05:30 (got '{raw}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
