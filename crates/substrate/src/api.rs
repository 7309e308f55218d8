use async_trait::async_trait;
use futures_util::stream::BoxStream;
use generic_listener::ListenerError;

use crate::types::RawBlock;

/// Treasury proposal snapshot used to enrich `treasury.Proposed`.
#[derive(Debug, Clone)]
pub struct TreasuryProposal {
    pub proposer: String,
    pub beneficiary: String,
    pub value: u128,
    pub bond: u128,
}

/// Opaque capability over one Substrate node connection.
///
/// The generated RPC/metadata bindings behind it are out of core scope;
/// embedders supply an implementation when constructing the listener. The
/// handle is owned exclusively by that listener.
#[async_trait]
pub trait SubstrateApi: Send + Sync {
    async fn latest_block_number(&self) -> Result<u64, ListenerError>;

    /// `None` means the block's state has been pruned away on this node.
    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ListenerError>;

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, RawBlock>, ListenerError>;

    /// staking bonded(stash) -> controller
    async fn bonded_controller(&self, stash: &str) -> Result<Option<String>, ListenerError>;

    /// democracy depositOf(index) -> (deposit, depositors)
    async fn proposal_deposit(
        &self,
        index: u64,
    ) -> Result<Option<(u128, Vec<String>)>, ListenerError>;

    /// democracy referendumInfoOf(index) -> voting end block
    async fn referendum_end(&self, index: u64) -> Result<Option<u64>, ListenerError>;

    /// treasury proposals(index)
    async fn treasury_proposal(
        &self,
        index: u64,
    ) -> Result<Option<TreasuryProposal>, ListenerError>;
}
