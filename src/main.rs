use std::sync::Arc;

use clap::Parser;

use appwatch::config::AppConfig;
use appwatch::{logging, serve, AppState, PgStore};

#[derive(Debug, Parser)]
#[command(name = "appwatch", about = "Application monitoring backend")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "APPWATCH_CONFIG")]
    config: Option<String>,

    /// Override the listen address from the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }

    logging::init(&config.server.log_level);

    let store = PgStore::connect(&config.database.url, config.database.max_connections).await?;
    let state = AppState::new(Arc::new(store));

    serve(&config.server.bind_addr, state).await?;

    Ok(())
}
