use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use generic_listener::ListenerError;

use crate::{
    api::{SubstrateApi, TreasuryProposal},
    types::RawBlock,
};

/// Canned-answer Api used across this crate's tests. No network anywhere.
#[derive(Default)]
pub(crate) struct MockSubstrateApi {
    pub head: u64,
    pub blocks: HashMap<u64, RawBlock>,
    /// Blocks below this height pretend to be pruned away.
    pub pruned_below: u64,
    pub controller: Option<String>,
    pub deposit: Option<(u128, Vec<String>)>,
    pub referendum_end_block: Option<u64>,
    pub treasury: Option<TreasuryProposal>,
    pub stream_blocks: Vec<RawBlock>,
}

#[async_trait]
impl SubstrateApi for MockSubstrateApi {
    async fn latest_block_number(&self) -> Result<u64, ListenerError> {
        Ok(self.head)
    }

    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ListenerError> {
        if number < self.pruned_below {
            return Ok(None);
        }
        Ok(Some(self.blocks.get(&number).cloned().unwrap_or(RawBlock {
            number,
            events: Vec::new(),
            extrinsics: Vec::new(),
        })))
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, RawBlock>, ListenerError> {
        Ok(stream::iter(self.stream_blocks.clone()).boxed())
    }

    async fn bonded_controller(&self, _stash: &str) -> Result<Option<String>, ListenerError> {
        Ok(self.controller.clone())
    }

    async fn proposal_deposit(
        &self,
        _index: u64,
    ) -> Result<Option<(u128, Vec<String>)>, ListenerError> {
        Ok(self.deposit.clone())
    }

    async fn referendum_end(&self, _index: u64) -> Result<Option<u64>, ListenerError> {
        Ok(self.referendum_end_block)
    }

    async fn treasury_proposal(
        &self,
        _index: u64,
    ) -> Result<Option<TreasuryProposal>, ListenerError> {
        Ok(self.treasury.clone())
    }
}
