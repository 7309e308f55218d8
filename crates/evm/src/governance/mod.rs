//! Governor-style governance family: proposal lifecycle logs, proposal-state
//! enrichment and the snapshot-storage fetcher used when the historical log
//! is not retrievable.

pub mod api;
pub mod enricher;
pub mod kinds;
pub mod parser;
pub mod processor;
pub mod storage_fetcher;

use std::sync::Arc;

use alloy::{rpc::types::Log, sol, sol_types::SolEvent};
use common::config::{ChainOptions, EvmChainConfig};
use generic_listener::{
    ApiConnector, ComponentsBuilder, Family, FamilyComponents, Listener,
};

use crate::{poller::EvmPoller, provider::EvmLogSource, subscriber::EvmSubscriber};

pub use api::{GovernanceApi, GovernorApi, ProposalSnapshot, ProposalStage};
pub use kinds::{GovernanceEventData, GovernanceEventKind};

sol! {
    event ProposalCreated(uint256 id, address proposer, uint256 startBlock, uint256 endBlock, string description);
    event VoteCast(address indexed voter, uint256 proposalId, bool support, uint256 votes);
    event ProposalQueued(uint256 id, uint256 eta);
    event ProposalExecuted(uint256 id);
    event ProposalCanceled(uint256 id);
}

pub(crate) const EVENT_SIGNATURES: &[&str] = &[
    ProposalCreated::SIGNATURE,
    VoteCast::SIGNATURE,
    ProposalQueued::SIGNATURE,
    ProposalExecuted::SIGNATURE,
    ProposalCanceled::SIGNATURE,
];

pub struct GovernanceFamily;

impl Family for GovernanceFamily {
    const FAMILY: &'static str = "governance";
    type Api = dyn GovernanceApi;
    type Raw = Vec<Log>;
    type Data = GovernanceEventData;
}

/// Standard component bundle for one governor contract. Catch-up prefers the
/// storage fetcher: proposal state survives log pruning, and votes are
/// re-queried through the fetcher's side channel.
pub fn components(
    api: Arc<dyn GovernanceApi>,
    options: &ChainOptions,
) -> FamilyComponents<GovernanceFamily> {
    let source: Arc<dyn EvmLogSource> = api.clone();
    FamilyComponents {
        processor: Arc::new(processor::GovernanceProcessor::new(options.chain.clone())),
        subscriber: Box::new(EvmSubscriber::new(
            Arc::clone(&source),
            options.chain.clone(),
        )),
        poller: Some(Arc::new(EvmPoller::new(source, options.chain.clone()))),
        storage_fetcher: Some(Arc::new(storage_fetcher::GovernanceStorageFetcher::new(
            api,
            options.chain.clone(),
        ))),
    }
}

/// Builds the listener for one governor contract, connecting over websocket.
pub fn listener(config: EvmChainConfig) -> Listener<GovernanceFamily> {
    let contract = config.contract_address.clone();
    let connector: ApiConnector<GovernanceFamily> = Box::new(move |options| {
        let url = options.url.clone();
        let contract = contract.clone();
        Box::pin(async move {
            let api = GovernorApi::connect(&url, &contract).await?;
            Ok(Arc::new(api) as Arc<dyn GovernanceApi>)
        })
    });
    let builder: ComponentsBuilder<GovernanceFamily> =
        Box::new(|api, options| components(api, options));
    Listener::new(config.common, connector, builder)
}
