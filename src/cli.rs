//! CLI definitions for dominspect.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dominspect CLI.
#[derive(Parser)]
#[command(name = "dominspect")]
#[command(about = "Explore a document's element tree from an inspection panel")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Settings file path (defaults to the user config directory)
    #[arg(long, env = "DOMINSPECT_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Open an inspection session on a JSON page fixture
    Inspect {
        /// Page fixture (JSON element tree)
        fixture: PathBuf,
    },

    /// Load and validate the configuration file
    CheckConfig,

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the current settings
    Show,

    /// Allow inspection sessions
    Enable,

    /// Refuse to start inspection sessions
    Disable,
}
