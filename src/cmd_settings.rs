//! `settings` and `check-config` subcommands.

use std::path::Path;

use anyhow::Context;
use dominspect_config::{Config, ConfigValidator, SettingsStore};
use tracing::{info, warn};

use crate::cli::SettingsAction;

pub(crate) fn handle_settings_command(action: SettingsAction, store: &SettingsStore) -> anyhow::Result<()> {
    let settings = match action {
        SettingsAction::Show => store.load()?,
        SettingsAction::Enable => {
            let settings = store.set_enabled(true)?;
            info!("Inspection enabled");
            settings
        }
        SettingsAction::Disable => {
            let settings = store.set_enabled(false)?;
            info!("Inspection disabled");
            settings
        }
    };

    println!("Settings file: {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Refuse an invalid configuration; warnings are logged.
pub(crate) fn validate_config(config: &Config) -> anyhow::Result<()> {
    let warnings = ConfigValidator::validate(config)
        .into_result()
        .context("configuration is invalid (run `dominspect check-config` for details)")?;
    for warning in warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    Ok(())
}

/// Validate `config` (already loaded from `path`) and print the outcome.
pub(crate) fn check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    if path.exists() {
        println!("Configuration: {}", path.display());
    } else {
        println!("Configuration: {} (not found, using defaults)", path.display());
    }

    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        println!("  warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("  error:   {}: {}", error.path, error.message);
    }
    result.into_result().context("configuration is invalid")?;

    println!("Configuration OK");
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_accepts_defaults() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_zero_intervals() {
        let mut config = Config::default();
        config.agent.style_check_interval_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("agent.style_check_interval_ms"));

        let mut config = Config::default();
        config.panel.ack_timeout_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("panel.ack_timeout_ms"));
    }
}
