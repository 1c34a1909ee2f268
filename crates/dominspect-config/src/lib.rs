//! # dominspect Config
//!
//! Configuration management for the inspector actors and the CLI.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::{Settings, SettingsStore};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
