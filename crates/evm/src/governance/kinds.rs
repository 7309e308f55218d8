use alloy::primitives::U256;
use generic_listener::{EventData, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GovernanceEventKind {
    ProposalCreated,
    VoteCast,
    ProposalQueued,
    ProposalExecuted,
    ProposalCanceled,
}

impl EventKind for GovernanceEventKind {
    fn from_name(name: &str) -> Option<Self> {
        use GovernanceEventKind::*;
        let kind = match name {
            "proposal-created" => ProposalCreated,
            "vote-cast" => VoteCast,
            "proposal-queued" => ProposalQueued,
            "proposal-executed" => ProposalExecuted,
            "proposal-canceled" => ProposalCanceled,
            _ => return None,
        };
        Some(kind)
    }

    fn as_str(&self) -> &'static str {
        use GovernanceEventKind::*;
        match self {
            ProposalCreated => "proposal-created",
            VoteCast => "vote-cast",
            ProposalQueued => "proposal-queued",
            ProposalExecuted => "proposal-executed",
            ProposalCanceled => "proposal-canceled",
        }
    }
}

/// Canonical governance payloads. Closed tagged union.
#[derive(Debug, Clone)]
pub enum GovernanceEventData {
    ProposalCreated {
        id: u64,
        proposer: String,
        start_block: u64,
        end_block: u64,
        /// Carried by the log but not reconstructible from snapshot
        /// storage, hence optional.
        description: Option<String>,
    },
    VoteCast {
        id: u64,
        voter: String,
        support: bool,
        votes: U256,
    },
    ProposalQueued {
        id: u64,
        eta: u64,
    },
    ProposalExecuted {
        id: u64,
    },
    ProposalCanceled {
        id: u64,
    },
}

impl EventData for GovernanceEventData {
    type Kind = GovernanceEventKind;

    fn kind(&self) -> GovernanceEventKind {
        use GovernanceEventData::*;
        match self {
            ProposalCreated { .. } => GovernanceEventKind::ProposalCreated,
            VoteCast { .. } => GovernanceEventKind::VoteCast,
            ProposalQueued { .. } => GovernanceEventKind::ProposalQueued,
            ProposalExecuted { .. } => GovernanceEventKind::ProposalExecuted,
            ProposalCanceled { .. } => GovernanceEventKind::ProposalCanceled,
        }
    }
}
