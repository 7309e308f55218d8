use alloy::{
    primitives::Address,
    rpc::types::Log,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use generic_listener::ListenerError;

use crate::{
    governance::{GovernanceApi, ProposalSnapshot},
    provider::EvmLogSource,
};

/// Builds an rpc-shaped log carrying `event`, stamped at `block_number`.
pub(crate) fn event_log<E: SolEvent>(block_number: u64, event: &E) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: Address::ZERO,
            data: event.encode_log_data(),
        },
        block_number: Some(block_number),
        log_index: Some(0),
        ..Log::default()
    }
}

pub(crate) fn log_without_block_number<E: SolEvent>(event: &E) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: Address::ZERO,
            data: event.encode_log_data(),
        },
        ..Log::default()
    }
}

/// Canned-answer governance Api for tests. No network anywhere.
#[derive(Default)]
pub(crate) struct MockGovernanceApi {
    pub head: u64,
    pub proposals: Vec<ProposalSnapshot>,
    pub vote_logs: Vec<Log>,
}

#[async_trait]
impl EvmLogSource for MockGovernanceApi {
    async fn latest_block_number(&self) -> Result<u64, ListenerError> {
        Ok(self.head)
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ListenerError> {
        Ok(self
            .vote_logs
            .iter()
            .filter(|log| {
                log.block_number
                    .map(|block| block >= from && block <= to)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn subscribe_logs(&self) -> Result<BoxStream<'static, Log>, ListenerError> {
        Ok(stream::empty().boxed())
    }
}

#[async_trait]
impl GovernanceApi for MockGovernanceApi {
    async fn proposal_count(&self) -> Result<u64, ListenerError> {
        Ok(self.proposals.iter().map(|p| p.id).max().unwrap_or(0))
    }

    async fn proposal(&self, id: u64) -> Result<Option<ProposalSnapshot>, ListenerError> {
        Ok(self.proposals.iter().find(|p| p.id == id).cloned())
    }
}
