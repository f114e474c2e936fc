// Polyglot Translation Engine
// Main entry point for the polyglot binary

use clap::Parser;
use polyglot_engine::cli::{Cli, Command, ConfigAction};
use polyglot_engine::config::Config;
use polyglot_engine::handlers::{
    handle_batch, handle_config_show, handle_config_validate, handle_run, OutputFormat,
};
use polyglot_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // The --log flag beats the configured level; RUST_LOG beats both.
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!("Polyglot Engine v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run {
            text,
            context,
            instructions,
            no_conversation,
        } => handle_run(text, context, instructions, no_conversation, &config, format).await,

        Command::Batch { file, instructions } => {
            handle_batch(&file, instructions, &config, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Validate => handle_config_validate(&config),
        },
    }
}
