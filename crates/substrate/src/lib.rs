pub mod api;
pub mod enricher;
pub mod kinds;
pub mod parser;
pub mod poller;
pub mod processor;
pub mod subscriber;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

use std::sync::Arc;

use common::config::{ChainOptions, EnricherSettings};
use generic_listener::{Family, FamilyComponents, Listener};

pub use api::{SubstrateApi, TreasuryProposal};
pub use kinds::{SubstrateEventData, SubstrateEventKind};

pub struct SubstrateFamily;

impl Family for SubstrateFamily {
    const FAMILY: &'static str = "substrate";
    type Api = dyn SubstrateApi;
    type Raw = types::RawBlock;
    type Data = SubstrateEventData;
}

/// Standard component bundle for one Substrate chain, bound to one Api
/// handle. Substrate chains catch up by polling historical blocks; there is
/// no storage fetcher because the event log is always retrievable where the
/// blocks themselves are.
pub fn components(
    api: Arc<dyn SubstrateApi>,
    options: &ChainOptions,
    settings: EnricherSettings,
) -> FamilyComponents<SubstrateFamily> {
    FamilyComponents {
        processor: Arc::new(processor::SubstrateProcessor::new(
            Arc::clone(&api),
            settings,
            options.chain.clone(),
        )),
        subscriber: Box::new(subscriber::SubstrateSubscriber::new(
            Arc::clone(&api),
            options.chain.clone(),
        )),
        poller: Some(Arc::new(poller::SubstratePoller::new(
            api,
            options.chain.clone(),
        ))),
        storage_fetcher: None,
    }
}

/// Builds a listener over an embedder-supplied Api handle. The transport
/// bindings behind [`SubstrateApi`] are out of core scope, so there is no
/// url-based constructor here.
pub fn listener(
    options: ChainOptions,
    api: Arc<dyn SubstrateApi>,
    settings: EnricherSettings,
) -> Listener<SubstrateFamily> {
    Listener::with_api(
        options,
        api,
        Box::new(move |api, options| components(api, options, settings.clone())),
    )
}
