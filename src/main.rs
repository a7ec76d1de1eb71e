mod auth;
mod cli;
mod drive;
mod error;
mod playback;
mod state;
#[cfg(test)]
mod testing;

use clap::Parser;
use cli::{Cli, Commands};
use state::Config;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignores if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config)?.with_overrides(cli.credentials.clone());
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::List => {
            cli::commands::list::run(&config).await?;
        }
        Commands::Play { file_id, name } => {
            cli::commands::play::run(&file_id, name.as_deref(), &config).await?;
        }
        Commands::Browse => {
            cli::commands::browse::run(&config).await?;
        }
        Commands::Token => {
            cli::commands::auth::token(&config).await?;
        }
        Commands::Init { force } => {
            cli::commands::init::run(&config, &cli.config, force)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
