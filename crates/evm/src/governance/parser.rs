use alloy::{primitives::B256, sol_types::SolEvent};
use tracing::debug;

use super::{
    GovernanceEventKind, ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued,
    VoteCast,
};

/// Maps a log's topic0 to a canonical kind. Pure; unknown signatures are a
/// normal, filterable outcome.
pub fn parse(topic0: Option<&B256>) -> Option<GovernanceEventKind> {
    let signature = topic0?;
    match *signature {
        ProposalCreated::SIGNATURE_HASH => Some(GovernanceEventKind::ProposalCreated),
        VoteCast::SIGNATURE_HASH => Some(GovernanceEventKind::VoteCast),
        ProposalQueued::SIGNATURE_HASH => Some(GovernanceEventKind::ProposalQueued),
        ProposalExecuted::SIGNATURE_HASH => Some(GovernanceEventKind::ProposalExecuted),
        ProposalCanceled::SIGNATURE_HASH => Some(GovernanceEventKind::ProposalCanceled),
        other => {
            debug!(signature = %other, "unrecognized governance event");
            None
        }
    }
}
