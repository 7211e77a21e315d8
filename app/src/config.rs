//! Configuration management for the Univent app.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted session and onboarding flag
    pub data_dir: PathBuf,
    /// Payment configuration
    pub payments: PaymentConfig,
    /// Participation workflow configuration
    pub workflow: WorkflowConfig,
    /// Log filter (`RUST_LOG` syntax)
    pub log_filter: String,
}

/// Payment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// How long the mock processor takes to confirm a payment, in milliseconds
    pub confirmation_delay_ms: u64,
    /// Currency for paid events created without one (ISO 4217, lowercase)
    pub default_currency: String,
}

/// Participation workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How long a join or purchase may take before it fails, in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("UNIVENT_DATA_DIR")
                .map_or_else(|_| PathBuf::from(".univent"), PathBuf::from),
            payments: PaymentConfig {
                confirmation_delay_ms: env::var("UNIVENT_PAYMENT_CONFIRMATION_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
                default_currency: env::var("UNIVENT_DEFAULT_CURRENCY")
                    .map(|s| s.trim().to_lowercase())
                    .ok()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "usd".to_string()),
            },
            workflow: WorkflowConfig {
                timeout_secs: env::var("UNIVENT_WORKFLOW_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(30),
            },
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| "univent=info".to_string()),
        }
    }

    /// Mock processor confirmation delay
    #[must_use]
    pub const fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.payments.confirmation_delay_ms)
    }

    /// Participation workflow timeout
    #[must_use]
    pub const fn workflow_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_follow_the_configured_values() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/univent"),
            payments: PaymentConfig {
                confirmation_delay_ms: 250,
                default_currency: "eur".to_string(),
            },
            workflow: WorkflowConfig { timeout_secs: 7 },
            log_filter: "univent=debug".to_string(),
        };

        assert_eq!(config.confirmation_delay(), Duration::from_millis(250));
        assert_eq!(config.workflow_timeout(), Duration::from_secs(7));
    }
}
