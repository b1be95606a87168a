//! Configuration validation.
//!
//! Checks the `[simulation]` section and every selected policy's section
//! before any price data is loaded.

use crate::domain::error::PolicysimError;
use crate::domain::policy::build_policy;
use crate::domain::simulation::{resolve_policies, SECTION};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    validate_ticker(config)?;
    validate_dates(config)?;
    validate_position(config)?;
    validate_initial_investment(config)?;
    Ok(())
}

/// Every selected policy must be registered and its parameters valid.
pub fn validate_policy_config(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    for name in resolve_policies(config)? {
        build_policy(&name, config)?;
    }
    Ok(())
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    match config.get_string(SECTION, "ticker") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PolicysimError::ConfigMissing {
            section: SECTION.to_string(),
            key: "ticker".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    let start_str = config.get_string(SECTION, "start_date");
    let end_str = config.get_string(SECTION, "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(PolicysimError::ConfigInvalid {
            section: SECTION.to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, PolicysimError> {
    match value {
        None => Err(PolicysimError::ConfigMissing {
            section: SECTION.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            PolicysimError::ConfigInvalid {
                section: SECTION.to_string(),
                key: field.to_string(),
                reason: format!("invalid {field} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

/// `[section] key` as a float, `default` when absent. A value that is present
/// but does not parse is an error, never the default.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, PolicysimError> {
    config
        .get_double(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|_| invalid(section, key, &format!("{key} must be a number")))
}

/// Integer counterpart of [`read_double`].
pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, PolicysimError> {
    config
        .get_int(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|_| invalid(section, key, &format!("{key} must be an integer")))
}

fn validate_position(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    let shares = read_double(config, SECTION, "shares", 0.0)?;
    if !shares.is_finite() || shares < 0.0 {
        return Err(invalid(SECTION, "shares", "shares must be non-negative"));
    }

    let avg_price = read_double(config, SECTION, "avg_price", 0.0)?;
    if !avg_price.is_finite() || avg_price <= 0.0 {
        return Err(invalid(SECTION, "avg_price", "avg_price must be positive"));
    }

    let cash = read_double(config, SECTION, "cash", 0.0)?;
    if !cash.is_finite() || cash < 0.0 {
        return Err(invalid(SECTION, "cash", "cash must be non-negative"));
    }

    if shares * avg_price + cash <= 0.0 {
        return Err(invalid(
            SECTION,
            "shares",
            "starting position needs shares or cash",
        ));
    }
    Ok(())
}

fn validate_initial_investment(config: &dyn ConfigPort) -> Result<(), PolicysimError> {
    let value = match config.get_double(SECTION, "initial_investment") {
        Ok(None) => return Ok(()),
        Ok(Some(v)) => v,
        Err(_) => f64::NAN,
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            SECTION,
            "initial_investment",
            "initial_investment must be positive",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> PolicysimError {
    PolicysimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
