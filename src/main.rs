//! dominspect: explore a page's element tree from an inspection panel.

mod cli;
mod cmd_inspect;
mod cmd_settings;
mod logging;

use anyhow::Context;
use clap::Parser;
use dominspect_config::{ConfigLoader, SettingsStore};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("cannot load configuration {}", cli.config.display()))?;
    logging::init_tracing(&config.logging)?;

    let settings = SettingsStore::new(cli.settings.unwrap_or_else(SettingsStore::default_path));

    // check-config reports every problem itself.
    if !matches!(cli.command, Commands::CheckConfig) {
        cmd_settings::validate_config(&config)?;
    }

    match cli.command {
        Commands::Inspect { fixture } => {
            cmd_inspect::handle_inspect_command(config, &fixture, &settings).await
        }
        Commands::CheckConfig => cmd_settings::check_config(&cli.config, &config),
        Commands::Settings { action } => cmd_settings::handle_settings_command(action, &settings),
    }
}
