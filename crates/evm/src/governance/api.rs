use alloy::{
    primitives::{Address, U256},
    providers::DynProvider,
    rpc::types::Log,
    sol,
};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use generic_listener::ListenerError;

use super::EVENT_SIGNATURES;
use crate::provider::{EthProvider, EvmLogSource};

sol! {
    #[sol(rpc)]
    contract Governor {
        function proposalCount() external view returns (uint256);
        function proposals(uint256 id) external view returns (
            uint256 proposalId,
            address proposer,
            uint256 eta,
            uint256 startBlock,
            uint256 endBlock,
            uint256 forVotes,
            uint256 againstVotes,
            bool canceled,
            bool executed
        );
        function state(uint256 id) external view returns (uint8);
    }
}

/// Current lifecycle stage of a proposal, as the contract reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStage {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalStage {
    pub fn from_code(code: u8) -> Option<Self> {
        use ProposalStage::*;
        let stage = match code {
            0 => Pending,
            1 => Active,
            2 => Canceled,
            3 => Defeated,
            4 => Succeeded,
            5 => Queued,
            6 => Expired,
            7 => Executed,
            _ => return None,
        };
        Some(stage)
    }

    /// A completed proposal can never change again, which is what lets the
    /// backward storage walk stop early.
    pub fn is_completed(self) -> bool {
        matches!(
            self,
            ProposalStage::Canceled
                | ProposalStage::Defeated
                | ProposalStage::Expired
                | ProposalStage::Executed
        )
    }
}

/// Snapshot of one proposal's current storage.
#[derive(Debug, Clone)]
pub struct ProposalSnapshot {
    pub id: u64,
    pub proposer: String,
    pub eta: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub canceled: bool,
    pub executed: bool,
    pub stage: ProposalStage,
}

/// Governor storage reads, layered over the shared log-level view.
#[async_trait]
pub trait GovernanceApi: EvmLogSource {
    async fn proposal_count(&self) -> Result<u64, ListenerError>;

    /// `None` when the id maps to no proposal in storage.
    async fn proposal(&self, id: u64) -> Result<Option<ProposalSnapshot>, ListenerError>;
}

/// Contract-bound implementation over an alloy websocket provider.
pub struct GovernorApi {
    provider: EthProvider,
    contract: Governor::GovernorInstance<DynProvider>,
}

impl GovernorApi {
    pub async fn connect(url: &str, contract_address: &str) -> Result<Self, ListenerError> {
        let provider =
            EthProvider::connect(url, &[contract_address.to_string()], EVENT_SIGNATURES).await?;
        let address = contract_address
            .parse::<Address>()
            .map_err(|e| ListenerError::Rpc(format!("invalid contract address: {e}")))?;
        let contract = Governor::new(address, provider.provider());
        Ok(Self { provider, contract })
    }

    // Block heights and timestamps always fit; saturating beats failing a
    // whole backward walk over one absurd storage slot.
    fn to_u64(value: U256) -> u64 {
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl EvmLogSource for GovernorApi {
    async fn latest_block_number(&self) -> Result<u64, ListenerError> {
        self.provider.latest_block_number().await
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ListenerError> {
        self.provider.logs(from, to).await
    }

    async fn subscribe_logs(&self) -> Result<BoxStream<'static, Log>, ListenerError> {
        self.provider.subscribe_logs().await
    }
}

#[async_trait]
impl GovernanceApi for GovernorApi {
    async fn proposal_count(&self) -> Result<u64, ListenerError> {
        let count = self
            .contract
            .proposalCount()
            .call()
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))?;
        Ok(Self::to_u64(count))
    }

    async fn proposal(&self, id: u64) -> Result<Option<ProposalSnapshot>, ListenerError> {
        let ret = self
            .contract
            .proposals(U256::from(id))
            .call()
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))?;
        if ret.proposalId.is_zero() {
            // the contract returns an all-zero slot for ids it never assigned
            return Ok(None);
        }

        let code = self
            .contract
            .state(U256::from(id))
            .call()
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))?;
        let stage = ProposalStage::from_code(code)
            .ok_or_else(|| ListenerError::Rpc(format!("unknown proposal state {code}")))?;

        Ok(Some(ProposalSnapshot {
            id: Self::to_u64(ret.proposalId),
            proposer: ret.proposer.to_string(),
            eta: Self::to_u64(ret.eta),
            start_block: Self::to_u64(ret.startBlock),
            end_block: Self::to_u64(ret.endBlock),
            canceled: ret.canceled,
            executed: ret.executed,
            stage,
        }))
    }
}
