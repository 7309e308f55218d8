use alloy::rpc::types::Log;
use async_trait::async_trait;
use generic_listener::{ChainEvent, Processor};
use tracing::{error, instrument};

use super::{enricher, parser, GovernanceEventData, GovernanceFamily};

pub struct GovernanceProcessor {
    chain: String,
}

impl GovernanceProcessor {
    pub fn new(chain: String) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Processor<GovernanceFamily> for GovernanceProcessor {
    #[instrument(skip_all, fields(CHAIN = %self.chain, logs = logs.len()))]
    async fn process(&self, logs: Vec<Log>) -> Vec<ChainEvent<GovernanceEventData>> {
        let mut out = Vec::new();
        for log in &logs {
            let Some(kind) = parser::parse(log.topic0()) else {
                continue;
            };
            match enricher::enrich(kind, log) {
                Ok(event) => out.push(event),
                Err(e) => error!(
                    chain = %self.chain,
                    kind = ?kind,
                    "failed to enrich governance log, dropping it: {e}"
                ),
            }
        }
        out
    }
}
