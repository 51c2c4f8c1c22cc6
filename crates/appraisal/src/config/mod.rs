use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::appraisal::{AppraisalSettings, FinalMarkConfig, InputPolicy};

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
    pub appraisal: AppraisalSettings,
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
            appraisal: load_appraisal_settings()?,
        })
    }
}

fn load_appraisal_settings() -> Result<AppraisalSettings, ConfigError> {
    let defaults = AppraisalSettings::default();

    let input_policy = match env::var("APPRAISAL_INPUT_POLICY") {
        Ok(raw) => raw
            .parse::<InputPolicy>()
            .map_err(|_| ConfigError::InvalidInputPolicy(raw))?,
        Err(_) => defaults.input_policy,
    };

    let final_mark = FinalMarkConfig {
        self_appraisal_ceiling: optional_positive_number("APPRAISAL_SELF_CEILING")?
            .or(defaults.final_mark.self_appraisal_ceiling),
        self_appraisal_budget: positive_number(
            "APPRAISAL_SELF_BUDGET",
            defaults.final_mark.self_appraisal_budget,
        )?,
        interaction_ceiling: positive_number(
            "APPRAISAL_INTERACTION_CEILING",
            defaults.final_mark.interaction_ceiling,
        )?,
        interaction_budget: positive_number(
            "APPRAISAL_INTERACTION_BUDGET",
            defaults.final_mark.interaction_budget,
        )?,
    };

    let verified_score_ceiling =
        positive_number("APPRAISAL_VERIFIED_CEILING", defaults.verified_score_ceiling)?;

    Ok(AppraisalSettings {
        input_policy,
        final_mark,
        verified_score_ceiling,
    })
}

fn positive_number(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    Ok(optional_positive_number(key)?.unwrap_or(default))
}

fn optional_positive_number(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(None),
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(Some(value)),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidInputPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number, found '{value}'")
            }
            ConfigError::InvalidInputPolicy(value) => write!(
                f,
                "APPRAISAL_INPUT_POLICY must be 'clamp' or 'reject', found '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidInputPolicy(_) => None,
        }
    }
}
