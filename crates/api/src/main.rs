//! Awakey - Main Entry Point

use anyhow::Context;
use api::{init_logging, install_metrics, run_server, AppConfig};
use tracing::info;

/// Config path from `--config <path>` or `AWAKEY_CONFIG`
fn config_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next();
        }
    }
    std::env::var("AWAKEY_CONFIG").ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(config_path().as_deref()).context("loading configuration")?;
    config.validate().context("validating configuration")?;

    init_logging(config.logging.max_level()?, config.logging.json)?;

    info!("=== Awakey v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Engine settings: {:?}", config.dms);

    let metrics = install_metrics().context("installing metrics recorder")?;
    run_server(config, Some(metrics)).await?;

    Ok(())
}
