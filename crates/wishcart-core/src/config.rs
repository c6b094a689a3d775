use crate::app_config::{AppConfig, Environment};
use crate::credentials::{AccountCredentials, PaymentCredentials};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Secrets are required and must not be blank. Everything else falls back to
/// a default.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let account = AccountCredentials {
        username: require("MEDIA_MARKT_USERNAME")?,
        password: require("MEDIA_MARKT_PASSWORD")?,
    };
    let payment = PaymentCredentials {
        card_number: require("CARD_NUMBER")?,
        expiry: require("CARD_EXPIRATION")?,
        cvc: require("CARD_CVC")?,
        holder_name: require("CARD_HOLDER")?,
    };

    let env = parse_environment(&or_default("WISHCART_ENV", "development"))?;
    let log_level = or_default("WISHCART_LOG_LEVEL", "info");

    let chrome_endpoint = or_default("WISHCART_CHROME_ENDPOINT", "http://127.0.0.1:9222");
    if !chrome_endpoint.starts_with("http://") && !chrome_endpoint.starts_with("https://") {
        return Err(ConfigError::InvalidEnvVar {
            var: "WISHCART_CHROME_ENDPOINT".to_string(),
            reason: format!("expected an http(s) URL, got \"{chrome_endpoint}\""),
        });
    }

    let poll_interval_secs = parse_u64("WISHCART_POLL_INTERVAL_SECS", "30")?;
    if poll_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "WISHCART_POLL_INTERVAL_SECS".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let settle_ms = parse_u64("WISHCART_SETTLE_MS", "300")?;
    let element_timeout_secs = parse_u64("WISHCART_ELEMENT_TIMEOUT_SECS", "30")?;
    let navigation_timeout_secs = parse_u64("WISHCART_NAVIGATION_TIMEOUT_SECS", "60")?;
    let evidence_dir = PathBuf::from(or_default("WISHCART_EVIDENCE_DIR", "."));
    let connect_max_retries = parse_u32("WISHCART_CONNECT_MAX_RETRIES", "3")?;
    let connect_backoff_base_ms = parse_u64("WISHCART_CONNECT_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        env,
        log_level,
        chrome_endpoint,
        poll_interval_secs,
        settle_ms,
        element_timeout_secs,
        navigation_timeout_secs,
        evidence_dir,
        connect_max_retries,
        connect_backoff_base_ms,
        account,
        payment,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WISHCART_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
