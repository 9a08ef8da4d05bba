//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted `registration.minimum_age`.
const MAX_MINIMUM_AGE: u32 = 150;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_registration(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_registration(config: &Config) -> ConfigResult<()> {
    let age = config.registration.minimum_age;
    if age == 0 || age > MAX_MINIMUM_AGE {
        return Err(ConfigError::ValidationError {
            field: "registration.minimum_age".to_owned(),
            message: format!("minimum_age {age} must be between 1 and {MAX_MINIMUM_AGE}"),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn minimum_age_bounds() {
        let mut config = Config::default();
        config.registration.minimum_age = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { field, .. }) if field == "registration.minimum_age"
        ));

        config.registration.minimum_age = 150;
        assert!(validate(&config).is_ok());
        config.registration.minimum_age = 151;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert!(validate(&config).is_err());
    }
}
