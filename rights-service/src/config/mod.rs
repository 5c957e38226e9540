use serde::Deserialize;
use service_core::config::{self as core_config, LogFormat};
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RightsConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Optional JSON file of right definitions added to the built-in set.
    pub rights_definition_path: Option<PathBuf>,
    /// Deadline for every grant backend and group directory call.
    pub lookup_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl RightsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let log_level = get_env("LOG_LEVEL", Some(&common_config.log_level), is_prod)?;
        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            Err(_) => common_config.log_format,
        };

        let config = RightsConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("rights-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level,
            log_format,
            rights_definition_path: env::var("RIGHTS_DEFINITION_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            lookup_timeout_ms: get_env("LOOKUP_TIMEOUT_MS", Some("2000"), false)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            common: common_config,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.lookup_timeout_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOOKUP_TIMEOUT_MS must be greater than 0"
            )));
        }

        if let Some(path) = &self.rights_definition_path {
            if !path.is_file() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "RIGHTS_DEFINITION_PATH {} is not a readable file",
                    path.display()
                )));
            }
        }

        if self.environment == Environment::Prod && self.log_format == LogFormat::Pretty {
            tracing::error!("Pretty log format in production - consider using 'json'");
        }

        Ok(())
    }
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config {
                log_level: "info".to_string(),
                log_format: LogFormat::Json,
            },
            environment: Environment::Dev,
            service_name: "rights-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            rights_definition_path: None,
            lookup_timeout_ms: 2000,
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
