use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use common::config::EnricherSettings;
use generic_listener::{ChainEvent, Processor};
use tracing::{debug, error, instrument};

use crate::{
    api::SubstrateApi,
    enricher::{enrich, RawEntry},
    kinds::SubstrateEventData,
    parser,
    types::{Phase, RawBlock, RawEvent},
    SubstrateFamily,
};

pub struct SubstrateProcessor {
    api: Arc<dyn SubstrateApi>,
    settings: EnricherSettings,
    chain: String,
}

impl SubstrateProcessor {
    pub fn new(api: Arc<dyn SubstrateApi>, settings: EnricherSettings, chain: String) -> Self {
        Self {
            api,
            settings,
            chain,
        }
    }
}

#[async_trait]
impl Processor<SubstrateFamily> for SubstrateProcessor {
    #[instrument(skip_all, fields(CHAIN = %self.chain, block = block.number))]
    async fn process(&self, block: RawBlock) -> Vec<ChainEvent<SubstrateEventData>> {
        // Index events by the extrinsic that emitted them. An extrinsic
        // whose event set carries no ExtrinsicSuccess marker failed, and its
        // would-be side effects must not be reported.
        let mut by_extrinsic: HashMap<u32, Vec<&RawEvent>> = HashMap::new();
        for event in &block.events {
            if let Phase::ApplyExtrinsic(index) = event.phase {
                by_extrinsic.entry(index).or_default().push(event);
            }
        }
        let successful: HashSet<u32> = by_extrinsic
            .iter()
            .filter(|(_, events)| {
                events
                    .iter()
                    .any(|e| e.section == "system" && e.method == "ExtrinsicSuccess")
            })
            .map(|(index, _)| *index)
            .collect();

        let mut out = Vec::new();

        for event in &block.events {
            let Some(kind) = parser::parse_event(&event.section, &event.method) else {
                continue;
            };
            match enrich(
                self.api.as_ref(),
                block.number,
                kind,
                RawEntry::Event(event),
                &self.settings,
            )
            .await
            {
                Ok(normalized) => out.push(normalized),
                Err(e) => error!(
                    chain = %self.chain,
                    block = block.number,
                    kind = ?kind,
                    "failed to enrich event, dropping it: {e}"
                ),
            }
        }

        for (index, extrinsic) in block.extrinsics.iter().enumerate() {
            if !successful.contains(&(index as u32)) {
                debug!(
                    chain = %self.chain,
                    block = block.number,
                    index,
                    "skipping failed extrinsic"
                );
                continue;
            }
            let Some(kind) = parser::parse_extrinsic(&extrinsic.section, &extrinsic.method) else {
                continue;
            };
            match enrich(
                self.api.as_ref(),
                block.number,
                kind,
                RawEntry::Extrinsic(extrinsic),
                &self.settings,
            )
            .await
            {
                Ok(normalized) => out.push(normalized),
                Err(e) => error!(
                    chain = %self.chain,
                    block = block.number,
                    kind = ?kind,
                    "failed to enrich extrinsic, dropping it: {e}"
                ),
            }
        }

        out
    }
}
