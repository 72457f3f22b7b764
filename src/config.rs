//! Configuration management for the fraud scoring service

use crate::attribution::DEFAULT_TOP_K;
use crate::classifier::RiskClassifier;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Prefix of environment variables overriding file values,
/// e.g. `FRAUD_SCORING__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "FRAUD_SCORING";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_allow_any_origin: bool,
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Persisted artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the model and encoder artifacts
    pub models_dir: String,
    /// Fitted forest artifact, relative to `models_dir`
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Fitted encoder artifact, relative to `models_dir`
    #[serde(default = "default_encoder_file")]
    pub encoder_file: String,
}

fn default_model_file() -> String {
    "random_forest.json".to_string()
}

fn default_encoder_file() -> String {
    "encoder.json".to_string()
}

/// Risk tiering and explanation settings
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Lower edge of the manual review tier
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,
    /// Lower edge of the fraud tier
    #[serde(default = "default_fraud_threshold")]
    pub fraud_threshold: f64,
    /// Attributions reported per transaction, between 1 and 3
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_review_threshold() -> f64 {
    RiskClassifier::DEFAULT_REVIEW_THRESHOLD
}

fn default_fraud_threshold() -> f64 {
    RiskClassifier::DEFAULT_FRAUD_THRESHOLD
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl DetectionConfig {
    /// Build the tier classifier, rejecting misordered thresholds
    pub fn classifier(&self) -> Result<RiskClassifier> {
        RiskClassifier::new(self.review_threshold, self.fraud_threshold)
            .context("Invalid detection thresholds")
    }

    /// Check thresholds and the attribution count
    pub fn validate(&self) -> Result<()> {
        self.classifier()?;
        if self.top_k == 0 || self.top_k > DEFAULT_TOP_K {
            bail!(
                "detection.top_k must be between 1 and {}, got {}",
                DEFAULT_TOP_K,
                self.top_k
            );
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Serving metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries, 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, with environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.detection.validate()?;
        Ok(config)
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                body_limit_bytes: default_body_limit(),
                cors_allow_any_origin: true,
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                model_file: default_model_file(),
                encoder_file: default_encoder_file(),
            },
            detection: DetectionConfig {
                review_threshold: default_review_threshold(),
                fraud_threshold: default_fraud_threshold(),
                top_k: DEFAULT_TOP_K,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig::default(),
        }
    }
}
