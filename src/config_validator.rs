// Configuration validation module for the video transcriber
//
// This module validates the environment-driven configuration before the client
// is built, so that a mistyped server URL or engine name fails early with a clear
// message instead of surfacing as a confusing backend error.
//
// Validation is schema-driven: every option is declared once in CONFIG_PARAMS
// with its type, default value and constraints.

use std::env;

use log::{error, info, warn};
use reqwest::Url;

use crate::config::{
    defaults, ENV_CONNECT_TIMEOUT, ENV_ENGINE, ENV_EXPORT_DIR, ENV_LANGUAGE, ENV_MODEL_SIZE,
    ENV_REQUEST_TIMEOUT, ENV_SERVER_URL,
};
use crate::models::{Engine, ModelSize};

/// Configuration parameter types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigType {
    String,
    UnsignedInteger,
    HttpUrl,
    Enum(&'static [&'static str]),
}

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Critical, // Must be valid for the client to start
    Standard, // Important but the client can start with defaults
    Warning,  // Optional, generates warnings only
}

/// Configuration parameter definition
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ConfigType,
    pub default_value: Option<&'static str>,
    pub required: bool,
    pub validation_level: ValidationLevel,
    pub min_value: Option<u64>,
    pub max_value: Option<u64>,
}

/// Centralized configuration parameter registry
pub const CONFIG_PARAMS: &[ConfigParam] = &[
    ConfigParam {
        name: ENV_SERVER_URL,
        description: "Base URL of the transcription service",
        param_type: ConfigType::HttpUrl,
        default_value: Some(defaults::SERVER_URL),
        required: true,
        validation_level: ValidationLevel::Critical,
        min_value: None,
        max_value: None,
    },
    ConfigParam {
        name: ENV_REQUEST_TIMEOUT,
        description: "Timeout in seconds for history requests",
        param_type: ConfigType::UnsignedInteger,
        default_value: Some("30"),
        required: false,
        validation_level: ValidationLevel::Standard,
        min_value: Some(1),
        max_value: Some(3600),
    },
    ConfigParam {
        name: ENV_CONNECT_TIMEOUT,
        description: "Timeout in seconds for establishing a connection",
        param_type: ConfigType::UnsignedInteger,
        default_value: Some("10"),
        required: false,
        validation_level: ValidationLevel::Standard,
        min_value: Some(1),
        max_value: Some(600),
    },
    ConfigParam {
        name: ENV_ENGINE,
        description: "Default transcription engine",
        param_type: ConfigType::Enum(Engine::NAMES),
        default_value: Some(defaults::ENGINE),
        required: false,
        validation_level: ValidationLevel::Standard,
        min_value: None,
        max_value: None,
    },
    ConfigParam {
        name: ENV_MODEL_SIZE,
        description: "Default model size",
        param_type: ConfigType::Enum(ModelSize::NAMES),
        default_value: Some(defaults::MODEL_SIZE),
        required: false,
        validation_level: ValidationLevel::Standard,
        min_value: None,
        max_value: None,
    },
    ConfigParam {
        name: ENV_LANGUAGE,
        description: "Language hint sent with each job (empty or 'auto' to detect)",
        param_type: ConfigType::String,
        default_value: None,
        required: false,
        validation_level: ValidationLevel::Warning,
        min_value: None,
        max_value: None,
    },
    ConfigParam {
        name: ENV_EXPORT_DIR,
        description: "Directory where exported transcripts are written",
        param_type: ConfigType::String,
        default_value: Some(defaults::EXPORT_DIR),
        required: false,
        validation_level: ValidationLevel::Warning,
        min_value: None,
        max_value: None,
    },
];

/// Configuration validation errors with detailed context
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub value: String,
    pub error_type: ConfigErrorType,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigErrorType {
    InvalidValue,
    InvalidFormat,
    InvalidRange,
    Required,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration error in '{}' ({:?}): {} (value: '{}')",
            self.field, self.error_type, self.message, self.value
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " - Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result type for configuration validation
pub type ValidationResult<T> = Result<T, ConfigValidationError>;

/// Configuration validation results
#[derive(Debug, Default)]
pub struct ValidationResults {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResults {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ConfigValidationError) {
        self.warnings.push(warning);
    }

    fn add(&mut self, level: ValidationLevel, error: ConfigValidationError) {
        match level {
            ValidationLevel::Critical | ValidationLevel::Standard => self.add_error(error),
            ValidationLevel::Warning => self.add_warning(error),
        }
    }

    pub fn print_summary(&self) {
        if !self.errors.is_empty() {
            error!(
                "Configuration validation found {} error(s):",
                self.errors.len()
            );
            for (i, err) in self.errors.iter().enumerate() {
                error!("  {}. {}", i + 1, err);
            }
        }

        if !self.warnings.is_empty() {
            warn!(
                "Configuration validation found {} warning(s):",
                self.warnings.len()
            );
            for (i, warning) in self.warnings.iter().enumerate() {
                warn!("  {}. {}", i + 1, warning);
            }
        }

        if self.is_valid() && self.warnings.is_empty() {
            info!("Configuration validation passed successfully");
        } else if self.is_valid() {
            info!(
                "Configuration validation passed with {} warning(s)",
                self.warnings.len()
            );
        }
    }
}

/// Helper functions for common validation patterns
pub mod validators {
    use super::*;

    /// Validate unsigned integer values with optional range
    pub fn validate_unsigned(
        field: &str,
        value: &str,
        min: Option<u64>,
        max: Option<u64>,
    ) -> ValidationResult<u64> {
        let parsed = value.parse::<u64>().map_err(|_| ConfigValidationError {
            field: field.to_string(),
            value: value.to_string(),
            error_type: ConfigErrorType::InvalidFormat,
            message: "Invalid unsigned integer format".to_string(),
            suggestion: Some("Use a positive whole number".to_string()),
        })?;

        if let Some(min) = min {
            if parsed < min {
                return Err(ConfigValidationError {
                    field: field.to_string(),
                    value: value.to_string(),
                    error_type: ConfigErrorType::InvalidRange,
                    message: format!("Value {} is below minimum {}", parsed, min),
                    suggestion: Some(format!("Use a value >= {}", min)),
                });
            }
        }

        if let Some(max) = max {
            if parsed > max {
                return Err(ConfigValidationError {
                    field: field.to_string(),
                    value: value.to_string(),
                    error_type: ConfigErrorType::InvalidRange,
                    message: format!("Value {} is above maximum {}", parsed, max),
                    suggestion: Some(format!("Use a value <= {}", max)),
                });
            }
        }

        Ok(parsed)
    }

    /// Validate enumerated values (case-insensitive)
    pub fn validate_enum(
        field: &str,
        value: &str,
        valid_values: &[&str],
    ) -> ValidationResult<String> {
        let lowered = value.to_lowercase();
        if valid_values.iter().any(|v| v.to_lowercase() == lowered) {
            Ok(lowered)
        } else {
            Err(ConfigValidationError {
                field: field.to_string(),
                value: value.to_string(),
                error_type: ConfigErrorType::InvalidValue,
                message: format!("Invalid value, must be one of: {}", valid_values.join(", ")),
                suggestion: Some(format!("Use one of: {}", valid_values.join(", "))),
            })
        }
    }

    /// Validate an absolute http(s) URL
    pub fn validate_http_url(field: &str, value: &str) -> ValidationResult<Url> {
        let url = Url::parse(value).map_err(|e| ConfigValidationError {
            field: field.to_string(),
            value: value.to_string(),
            error_type: ConfigErrorType::InvalidFormat,
            message: format!("Invalid URL: {}", e),
            suggestion: Some("Use a full URL such as http://127.0.0.1:8000".to_string()),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigValidationError {
                field: field.to_string(),
                value: value.to_string(),
                error_type: ConfigErrorType::InvalidValue,
                message: format!("Unsupported URL scheme '{}'", other),
                suggestion: Some("Use http:// or https://".to_string()),
            }),
        }
    }
}

pub fn get_env_optional(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Validator for the client configuration
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate every registered parameter from the environment
    pub fn validate_all() -> Result<ValidationResults, ValidationResults> {
        Self::validate_with(get_env_optional)
    }

    /// Validate every registered parameter, reading values through `lookup`
    pub fn validate_with<F>(lookup: F) -> Result<ValidationResults, ValidationResults>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut results = ValidationResults::default();

        info!("Starting configuration validation...");

        for param in CONFIG_PARAMS {
            let value = lookup(param.name)
                .or_else(|| param.default_value.map(String::from))
                .unwrap_or_default();

            if param.required && value.trim().is_empty() {
                results.add(
                    param.validation_level,
                    ConfigValidationError {
                        field: param.name.to_string(),
                        value: String::new(),
                        error_type: ConfigErrorType::Required,
                        message: "Required parameter is missing".to_string(),
                        suggestion: Some(format!("Set {} environment variable", param.name)),
                    },
                );
                continue;
            }

            if value.is_empty() {
                continue;
            }

            if let Err(error) = Self::validate_parameter(param, &value) {
                results.add(param.validation_level, error);
            }
        }

        results.print_summary();

        if results.is_valid() {
            Ok(results)
        } else {
            Err(results)
        }
    }

    fn validate_parameter(param: &ConfigParam, value: &str) -> ValidationResult<()> {
        match param.param_type {
            ConfigType::String => {}
            ConfigType::UnsignedInteger => {
                validators::validate_unsigned(param.name, value, param.min_value, param.max_value)?;
            }
            ConfigType::HttpUrl => {
                validators::validate_http_url(param.name, value)?;
            }
            ConfigType::Enum(valid_values) => {
                validators::validate_enum(param.name, value, valid_values)?;
            }
        }
        Ok(())
    }

    /// Generate a sample configuration file with all parameters and descriptions
    pub fn generate_sample_config() -> String {
        let mut output = String::new();
        output.push_str("# Video transcriber configuration file\n");
        output.push_str("# Environment variables take precedence over these values\n\n");

        for param in CONFIG_PARAMS {
            output.push_str(&format!("# {}\n", param.description));
            if param.required {
                output.push_str("# REQUIRED\n");
            }
            let value = match (param.param_type, param.default_value) {
                (ConfigType::UnsignedInteger, Some(v)) => v.to_string(),
                (_, Some(v)) => format!("\"{}\"", v),
                (_, None) => "\"\"".to_string(),
            };
            output.push_str(&format!("{} = {}\n\n", param.name, value));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let results = ConfigValidator::validate_with(lookup_from(&[])).expect("defaults valid");
        assert!(results.errors.is_empty());
    }

    #[test]
    fn test_invalid_server_url_is_an_error() {
        let results = ConfigValidator::validate_with(lookup_from(&[(
            ENV_SERVER_URL,
            "ftp://example.test",
        )]))
        .unwrap_err();
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].field, ENV_SERVER_URL);
        assert_eq!(results.errors[0].error_type, ConfigErrorType::InvalidValue);
    }

    #[test]
    fn test_out_of_range_timeout() {
        let results = ConfigValidator::validate_with(lookup_from(&[(ENV_REQUEST_TIMEOUT, "0")]))
            .unwrap_err();
        assert_eq!(results.errors[0].error_type, ConfigErrorType::InvalidRange);
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let results =
            ConfigValidator::validate_with(lookup_from(&[(ENV_ENGINE, "whisperx")])).unwrap_err();
        assert_eq!(results.errors[0].field, ENV_ENGINE);
    }

    #[test]
    fn test_enum_is_case_insensitive() {
        assert_eq!(
            validators::validate_enum("X", "Faster-Whisper", Engine::NAMES).unwrap(),
            "faster-whisper"
        );
    }

    #[test]
    fn test_sample_config_parses_as_toml() {
        let sample = ConfigValidator::generate_sample_config();
        let parsed: toml::Value = sample.parse().expect("sample config is valid TOML");
        assert_eq!(
            parsed.get(ENV_SERVER_URL).and_then(|v| v.as_str()),
            Some(defaults::SERVER_URL)
        );
        assert_eq!(
            parsed.get(ENV_REQUEST_TIMEOUT).and_then(|v| v.as_integer()),
            Some(30)
        );
    }
}
