//! Configuration validation.
//!
//! Checks the `[schedule]`, `[prices]` and `[sharesight]` sections before any
//! request leaves the process.

use crate::domain::error::DcaError;
use crate::ports::config_port::ConfigPort;

pub const PRICE_SOURCES: [&str; 2] = ["yahoo", "csv"];

pub fn validate_schedule_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    validate_total_capital(config)?;
    validate_fixed_fee(config)?;
    validate_market(config)?;
    validate_price_source(config)?;
    Ok(())
}

pub fn validate_sharesight_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    require_secret(config, "client_id", "SHARESIGHT_CLIENT_ID")?;
    require_secret(config, "client_secret", "SHARESIGHT_CLIENT_SECRET")?;
    for key in ["api_base_url", "token_url"] {
        let bad_url = config
            .get_string("sharesight", key)
            .is_some_and(|url| !(url.starts_with("https://") || url.starts_with("http://")));
        if bad_url {
            return Err(invalid("sharesight", key, "must be an http(s) URL"));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> DcaError {
    DcaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_total_capital(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if config.get_string("schedule", "total_capital").is_none() {
        return Ok(());
    }
    let value = config.get_double("schedule", "total_capital", f64::NAN);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "schedule",
            "total_capital",
            "total_capital must be a positive number",
        ));
    }
    Ok(())
}

fn validate_fixed_fee(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if config.get_string("schedule", "fixed_fee").is_none() {
        return Ok(());
    }
    let value = config.get_double("schedule", "fixed_fee", f64::NAN);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "schedule",
            "fixed_fee",
            "fixed_fee must be a non-negative number",
        ));
    }
    Ok(())
}

/// Market codes are exchange identifiers such as `ASX` or `NZX`.
fn validate_market(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let bad_code = config
        .get_string("schedule", "market")
        .is_some_and(|m| !m.chars().all(|c| c.is_ascii_alphanumeric()));
    if bad_code {
        return Err(invalid(
            "schedule",
            "market",
            "market must be an exchange code such as ASX",
        ));
    }
    Ok(())
}

fn validate_price_source(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let source = config
        .get_string("prices", "source")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase();
    if !PRICE_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "prices",
            "source",
            "source must be one of: yahoo, csv",
        ));
    }
    if source == "csv" && config.get_string("prices", "csv_dir").is_none() {
        return Err(DcaError::ConfigMissing {
            section: "prices".to_string(),
            key: "csv_dir".to_string(),
        });
    }
    Ok(())
}

fn require_secret(config: &dyn ConfigPort, key: &str, env_var: &str) -> Result<(), DcaError> {
    match config.get_string_or_env("sharesight", key, env_var) {
        Some(_) => Ok(()),
        None => Err(DcaError::ConfigMissing {
            section: "sharesight".to_string(),
            key: key.to_string(),
        }),
    }
}
