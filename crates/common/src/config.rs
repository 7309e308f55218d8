use config::{Config, File};
use dotenv::dotenv;
use eyre::{eyre, Result};
use serde::{de::DeserializeOwned, Deserialize};

fn config_from_env() -> Result<AppConfig> {
    dotenv().ok();

    let settings = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .list_separator(","),
        )
        .build()?;

    settings.try_deserialize().map_err(eyre::Error::from)
}

pub trait LoadFromEnv: Sized + DeserializeOwned {
    fn load() -> Result<Self>;
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub listener: Option<ListenerConfig>,
}

/// Per-chain options shared by every chain family.
///
/// Copy-on-update: `update_url` builds a fresh value and re-initializes the
/// Api connection, there is no in-place mutation while a subscription is live.
#[derive(Deserialize, Debug, Clone)]
pub struct ChainOptions {
    pub chain: String,
    pub url: String,
    #[serde(default)]
    pub skip_catchup: bool,
    /// Canonical kind names excluded for every handler on this chain.
    #[serde(default)]
    pub excluded_events: Vec<String>,
    pub max_chunk_size: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EnricherSettings {
    /// Transfers at or above this value are broadcast to all watchers;
    /// smaller ones are delivered only to sender and recipient.
    #[serde(default)]
    pub transfer_broadcast_threshold: u128,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EvmChainConfig {
    pub common: ChainOptions,
    pub contract_address: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubstrateChainConfig {
    pub common: ChainOptions,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ListenerConfig {
    #[serde(default)]
    pub settings: EnricherSettings,
    pub erc20: Option<EvmChainConfig>,
    pub governance: Option<EvmChainConfig>,
    pub substrate: Option<SubstrateChainConfig>,
}

impl LoadFromEnv for ListenerConfig {
    fn load() -> Result<Self> {
        config_from_env()?
            .listener
            .ok_or_else(|| eyre!("Configuration for the 'listener' service is missing."))
    }
}
