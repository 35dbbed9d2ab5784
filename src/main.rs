//! Entrain CLI entry point.

use clap::Parser;

use entrain::cli::commands::{calibrate, imitate, load_config, replay, simulate, synthesize};
use entrain::cli::{handle_error, Cli, Commands};
use entrain::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // Logging follows the loaded config; a bad config is reported by the command itself.
    let log_config = load_config(config_path)
        .map(|config| LogConfig::from(&config.logging))
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Simulate(args) => simulate::execute(args, config_path, cli.json),
        Commands::Synthesize(args) => synthesize::execute(args, config_path, cli.json).await,
        Commands::Calibrate(args) => calibrate::execute(args, config_path, cli.json).await,
        Commands::Replay(args) => replay::execute(args, config_path, cli.json).await,
        Commands::Imitate(args) => imitate::execute(args, config_path, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
