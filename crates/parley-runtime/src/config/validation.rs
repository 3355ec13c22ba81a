//! Configuration validation utilities.

use std::collections::HashMap;

use parley_framework::Separator;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, NamesConfig, ParleyConfig, ParserConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ParleyConfig) -> ConfigResult<()> {
    validate_parser_config(&config.parser)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the parser defaults.
fn validate_parser_config(parser: &ParserConfig) -> ConfigResult<()> {
    Separator::new(parser.separator.kind(), parser.assigner)?;
    validate_names(&parser.names)?;
    Ok(())
}

/// Every injection name must be a non-empty identifier claimed by one set only.
fn validate_names(names: &NamesConfig) -> ConfigResult<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for (set, entries) in [
        ("context", &names.context),
        ("client", &names.client),
        ("message", &names.message),
    ] {
        for name in entries {
            if name.is_empty() {
                return Err(ConfigError::validation(format!(
                    "parser.names.{set} contains an empty name"
                )));
            }
            if name.chars().any(char::is_whitespace) {
                return Err(ConfigError::validation(format!(
                    "parser.names.{set}: {name:?} cannot contain whitespace"
                )));
            }
            if let Some(other) = seen.insert(name.as_str(), set) {
                if other != set {
                    return Err(ConfigError::validation(format!(
                        "{name:?} is listed in both parser.names.{other} and parser.names.{set}"
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter targets cannot be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SeparatorMode;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn test_assigner_clashing_with_separator() {
        let mut config = ParleyConfig::default();
        config.parser.separator.mode = SeparatorMode::Run;
        config.parser.separator.separator = ':';

        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Parser(_))
        ));
    }

    #[test]
    fn test_name_in_two_sets() {
        let mut config = ParleyConfig::default();
        config.parser.names.client.push("ctx".to_string());

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert!(err.to_string().contains("ctx"));
    }

    #[test]
    fn test_empty_name() {
        let mut config = ParleyConfig::default();
        config.parser.names.message.push(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = ParleyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("parley.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
