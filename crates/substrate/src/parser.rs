use tracing::debug;

use crate::kinds::SubstrateEventKind;

/// Maps a pallet event's section/method to a canonical kind.
///
/// Pure and infallible. Unknown names are a normal, filterable outcome, not
/// an error: chains grow event types faster than parsers learn them.
pub fn parse_event(section: &str, method: &str) -> Option<SubstrateEventKind> {
    use SubstrateEventKind::*;
    let kind = match (section, method) {
        ("balances", "Transfer") => BalanceTransfer,
        ("staking", "Bonded") => Bonded,
        ("staking", "Unbonded") => Unbonded,
        ("staking", "Reward") => StakingReward,
        ("democracy", "Proposed") => DemocracyProposed,
        ("democracy", "Started") => DemocracyStarted,
        ("democracy", "Passed") => DemocracyPassed,
        ("democracy", "NotPassed") => DemocracyNotPassed,
        ("democracy", "Cancelled") => DemocracyCancelled,
        ("treasury", "Proposed") => TreasuryProposed,
        _ => {
            debug!(section, method, "unrecognized pallet event");
            return None;
        }
    };
    Some(kind)
}

/// Maps an extrinsic call to a canonical kind, for the kinds that are only
/// visible as calls rather than as emitted events.
pub fn parse_extrinsic(section: &str, method: &str) -> Option<SubstrateEventKind> {
    match (section, method) {
        ("democracy", "second") => Some(SubstrateEventKind::DemocracySeconded),
        _ => {
            debug!(section, method, "unrecognized extrinsic call");
            None
        }
    }
}
