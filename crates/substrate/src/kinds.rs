use generic_listener::{EventData, EventKind};

/// The closed set of pallet events this family recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubstrateEventKind {
    BalanceTransfer,
    Bonded,
    Unbonded,
    StakingReward,
    DemocracyProposed,
    DemocracySeconded,
    DemocracyStarted,
    DemocracyPassed,
    DemocracyNotPassed,
    DemocracyCancelled,
    TreasuryProposed,
}

impl EventKind for SubstrateEventKind {
    fn from_name(name: &str) -> Option<Self> {
        use SubstrateEventKind::*;
        let kind = match name {
            "balance-transfer" => BalanceTransfer,
            "bonded" => Bonded,
            "unbonded" => Unbonded,
            "staking-reward" => StakingReward,
            "democracy-proposed" => DemocracyProposed,
            "democracy-seconded" => DemocracySeconded,
            "democracy-started" => DemocracyStarted,
            "democracy-passed" => DemocracyPassed,
            "democracy-not-passed" => DemocracyNotPassed,
            "democracy-cancelled" => DemocracyCancelled,
            "treasury-proposed" => TreasuryProposed,
            _ => return None,
        };
        Some(kind)
    }

    fn as_str(&self) -> &'static str {
        use SubstrateEventKind::*;
        match self {
            BalanceTransfer => "balance-transfer",
            Bonded => "bonded",
            Unbonded => "unbonded",
            StakingReward => "staking-reward",
            DemocracyProposed => "democracy-proposed",
            DemocracySeconded => "democracy-seconded",
            DemocracyStarted => "democracy-started",
            DemocracyPassed => "democracy-passed",
            DemocracyNotPassed => "democracy-not-passed",
            DemocracyCancelled => "democracy-cancelled",
            TreasuryProposed => "treasury-proposed",
        }
    }
}

/// Canonical Substrate payloads. Closed tagged union: a new variant forces
/// the enricher and every other consumption site through the compiler before
/// it can ship.
#[derive(Debug, Clone)]
pub enum SubstrateEventData {
    BalanceTransfer {
        sender: String,
        dest: String,
        value: u128,
    },
    Bonded {
        stash: String,
        controller: String,
        amount: u128,
    },
    Unbonded {
        stash: String,
        controller: String,
        amount: u128,
    },
    StakingReward {
        validator: String,
        amount: u128,
    },
    DemocracyProposed {
        proposal_index: u64,
        proposer: String,
        deposit: u128,
    },
    DemocracySeconded {
        proposal_index: u64,
        who: String,
    },
    DemocracyStarted {
        referendum_index: u64,
        vote_threshold: String,
        end_block: u64,
    },
    DemocracyPassed {
        referendum_index: u64,
    },
    DemocracyNotPassed {
        referendum_index: u64,
    },
    DemocracyCancelled {
        referendum_index: u64,
    },
    TreasuryProposed {
        proposal_index: u64,
        proposer: String,
        beneficiary: String,
        value: u128,
        bond: u128,
    },
}

impl EventData for SubstrateEventData {
    type Kind = SubstrateEventKind;

    fn kind(&self) -> SubstrateEventKind {
        use SubstrateEventData::*;
        match self {
            BalanceTransfer { .. } => SubstrateEventKind::BalanceTransfer,
            Bonded { .. } => SubstrateEventKind::Bonded,
            Unbonded { .. } => SubstrateEventKind::Unbonded,
            StakingReward { .. } => SubstrateEventKind::StakingReward,
            DemocracyProposed { .. } => SubstrateEventKind::DemocracyProposed,
            DemocracySeconded { .. } => SubstrateEventKind::DemocracySeconded,
            DemocracyStarted { .. } => SubstrateEventKind::DemocracyStarted,
            DemocracyPassed { .. } => SubstrateEventKind::DemocracyPassed,
            DemocracyNotPassed { .. } => SubstrateEventKind::DemocracyNotPassed,
            DemocracyCancelled { .. } => SubstrateEventKind::DemocracyCancelled,
            TreasuryProposed { .. } => SubstrateEventKind::TreasuryProposed,
        }
    }
}
