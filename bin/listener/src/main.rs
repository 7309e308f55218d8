use common::config::{ListenerConfig, LoadFromEnv};
use eyre::Result;
use generic_listener::{ListenerRegistry, LoggingHandler};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cfg = ListenerConfig::load()?;

    let mut registry = ListenerRegistry::new();

    if let Some(chain_cfg) = cfg.erc20.clone() {
        let mut listener = evm::erc20::listener(chain_cfg, cfg.settings.clone());
        listener.add_handler(Box::new(LoggingHandler), &[]);
        registry.add_listener(Box::new(listener)).await?;
    }

    if let Some(chain_cfg) = cfg.governance.clone() {
        let mut listener = evm::governance::listener(chain_cfg);
        listener.add_handler(Box::new(LoggingHandler), &[]);
        registry.add_listener(Box::new(listener)).await?;
    }

    if cfg.substrate.is_some() {
        // substrate chains take an embedder-supplied Api handle; see
        // substrate::listener
        warn!("substrate chain configured but this binary carries no substrate transport");
    }

    if registry.chains().is_empty() {
        warn!("no chains configured, nothing to do");
        return Ok(());
    }

    info!(chains = ?registry.chains(), "listeners running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    registry.shutdown().await;
    info!("all listeners stopped");
    Ok(())
}
