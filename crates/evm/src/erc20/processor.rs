use alloy::rpc::types::Log;
use async_trait::async_trait;
use common::config::EnricherSettings;
use generic_listener::{ChainEvent, Processor};
use tracing::{error, instrument};

use super::{enricher, parser, Erc20EventData, Erc20Family};

pub struct Erc20Processor {
    settings: EnricherSettings,
    chain: String,
}

impl Erc20Processor {
    pub fn new(settings: EnricherSettings, chain: String) -> Self {
        Self { settings, chain }
    }
}

#[async_trait]
impl Processor<Erc20Family> for Erc20Processor {
    #[instrument(skip_all, fields(CHAIN = %self.chain, logs = logs.len()))]
    async fn process(&self, logs: Vec<Log>) -> Vec<ChainEvent<Erc20EventData>> {
        let mut out = Vec::new();
        for log in &logs {
            let Some(kind) = parser::parse(log.topic0()) else {
                continue;
            };
            match enricher::enrich(kind, log, &self.settings) {
                Ok(event) => out.push(event),
                Err(e) => error!(
                    chain = %self.chain,
                    kind = ?kind,
                    "failed to enrich token log, dropping it: {e}"
                ),
            }
        }
        out
    }
}
