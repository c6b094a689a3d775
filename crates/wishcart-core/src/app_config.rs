use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::{AccountCredentials, PaymentCredentials};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub chrome_endpoint: String,
    pub poll_interval_secs: u64,
    pub settle_ms: u64,
    pub element_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub evidence_dir: PathBuf,
    pub connect_max_retries: u32,
    pub connect_backoff_base_ms: u64,
    pub account: AccountCredentials,
    pub payment: PaymentCredentials,
}

impl AppConfig {
    /// Wait between two empty wish-list checks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Fixed wait used where the page exposes no readiness signal.
    #[must_use]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("chrome_endpoint", &self.chrome_endpoint)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("settle_ms", &self.settle_ms)
            .field("element_timeout_secs", &self.element_timeout_secs)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("evidence_dir", &self.evidence_dir)
            .field("connect_max_retries", &self.connect_max_retries)
            .field("connect_backoff_base_ms", &self.connect_backoff_base_ms)
            .field("account", &self.account)
            .field("payment", &self.payment)
            .finish()
    }
}
