use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reasoning_step_tree::{
    cli::{execute_command, Cli},
    config::{Config, LogFormat},
    storage::JsonTreeStore,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Reasoning step tree inspector starting..."
    );

    let store = match cli.dir {
        Some(ref dir) => JsonTreeStore::with_dir(dir),
        None => JsonTreeStore::new(&config.storage),
    };
    info!(dir = %store.dir().display(), "Tree store ready");

    let result = execute_command(cli.command, &config, &store);
    if result.exit_code != 0 {
        error!(exit_code = result.exit_code, "Command failed");
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }

    println!("{}", result.message);
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
