//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_agent(config, &mut result);
        Self::validate_panel(config, &mut result);
        Self::validate_highlight(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_agent(config: &Config, result: &mut ValidationResult) {
        let agent = &config.agent;

        if agent.reconnect_attempts > 0 && agent.reconnect_delay_ms == 0 {
            result.add_error(ValidationError::new(
                "agent.reconnect_delay_ms",
                "reconnect_delay_ms must be greater than 0 when reconnection is enabled",
            ));
        }

        if agent.reconnect_attempts == 0 {
            result.add_warning(ValidationWarning::new(
                "agent.reconnect_attempts",
                "reconnection disabled, the first dropped link deactivates the page agent",
            ));
        }

        if agent.reconnect_attempts > 20 {
            result.add_warning(ValidationWarning::new(
                "agent.reconnect_attempts",
                "reconnect_attempts is very high (>20), a dead host will be retried for a long time",
            ));
        }

        if agent.style_check_enabled && agent.style_check_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "agent.style_check_interval_ms",
                "style_check_interval_ms must be greater than 0",
            ));
        }

        if agent.style_check_enabled && agent.style_check_interval_ms < 100 {
            result.add_warning(ValidationWarning::new(
                "agent.style_check_interval_ms",
                "style checks more often than every 100ms add needless load",
            ));
        }

        if agent.include_text_content && agent.text_summary_max_chars == 0 {
            result.add_error(ValidationError::new(
                "agent.text_summary_max_chars",
                "text_summary_max_chars must be greater than 0 when text content is included",
            ));
        }
    }

    fn validate_panel(config: &Config, result: &mut ValidationResult) {
        if config.panel.ack_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "panel.ack_timeout_ms",
                "ack_timeout_ms must be greater than 0",
            ));
        }

        if config.panel.ack_timeout_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "panel.ack_timeout_ms",
                "ack_timeout_ms above one minute makes a hung page agent look frozen",
            ));
        }
    }

    fn validate_highlight(config: &Config, result: &mut ValidationResult) {
        let highlight = &config.highlight;

        if highlight.accent_color.trim().is_empty() {
            result.add_error(ValidationError::new(
                "highlight.accent_color",
                "accent_color cannot be empty",
            ));
        }

        if highlight.outline_width_px == 0 {
            result.add_error(ValidationError::new(
                "highlight.outline_width_px",
                "outline_width_px must be greater than 0, the treatments would be invisible",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level = config.logging.level.to_lowercase();
        // Directive strings such as "dominspect_agent=debug" are passed through untouched.
        if !level.contains('=') && !valid_levels.contains(&level.as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, valid_levels
                ),
            ));
        }
    }
}
