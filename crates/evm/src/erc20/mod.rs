//! ERC-20 token family: Transfer and Approval logs with threshold-driven
//! notification targeting.

pub mod enricher;
pub mod kinds;
pub mod parser;
pub mod processor;

use std::sync::Arc;

use alloy::{rpc::types::Log, sol, sol_types::SolEvent};
use common::config::{ChainOptions, EnricherSettings, EvmChainConfig};
use generic_listener::{
    ApiConnector, ComponentsBuilder, Family, FamilyComponents, Listener,
};

use crate::{
    poller::EvmPoller,
    provider::{EthProvider, EvmLogSource},
    subscriber::EvmSubscriber,
};

pub use kinds::{Erc20EventData, Erc20EventKind};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);
}

pub(crate) const EVENT_SIGNATURES: &[&str] = &[Transfer::SIGNATURE, Approval::SIGNATURE];

pub struct Erc20Family;

impl Family for Erc20Family {
    const FAMILY: &'static str = "erc20";
    type Api = dyn EvmLogSource;
    type Raw = Vec<Log>;
    type Data = Erc20EventData;
}

/// Standard component bundle for one watched token contract. Token logs are
/// always retrievable historically, so catch-up goes through the poller and
/// there is no storage fetcher.
pub fn components(
    api: Arc<dyn EvmLogSource>,
    options: &ChainOptions,
    settings: EnricherSettings,
) -> FamilyComponents<Erc20Family> {
    FamilyComponents {
        processor: Arc::new(processor::Erc20Processor::new(
            settings,
            options.chain.clone(),
        )),
        subscriber: Box::new(EvmSubscriber::new(Arc::clone(&api), options.chain.clone())),
        poller: Some(Arc::new(EvmPoller::new(api, options.chain.clone()))),
        storage_fetcher: None,
    }
}

/// Builds the listener for one token contract, connecting over websocket.
pub fn listener(config: EvmChainConfig, settings: EnricherSettings) -> Listener<Erc20Family> {
    let contract = config.contract_address.clone();
    let connector: ApiConnector<Erc20Family> = Box::new(move |options| {
        let url = options.url.clone();
        let contract = contract.clone();
        Box::pin(async move {
            let provider = EthProvider::connect(&url, &[contract], EVENT_SIGNATURES).await?;
            Ok(Arc::new(provider) as Arc<dyn EvmLogSource>)
        })
    });
    let builder: ComponentsBuilder<Erc20Family> =
        Box::new(move |api, options| components(api, options, settings.clone()));
    Listener::new(config.common, connector, builder)
}
