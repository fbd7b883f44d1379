//! WMTS map viewer binary.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use wmts_viewer::{config::Args, logging, ViewerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_json)?;

    let config = ViewerConfig::from_args(&args)?;
    info!(url = %config.url, layer = %config.layer, projection = %config.projection, "Starting WMTS viewer");

    let mut stdout = std::io::stdout().lock();
    wmts_viewer::run(&config, &mut stdout).await?;
    Ok(())
}
