use alloy::{primitives::B256, sol_types::SolEvent};
use tracing::debug;

use super::{Approval, Erc20EventKind, Transfer};

/// Maps a log's topic0 to a canonical kind.
///
/// Pure and infallible. Tokens emit plenty of event types beyond the two we
/// track; unknown signatures are a normal, filterable outcome.
pub fn parse(topic0: Option<&B256>) -> Option<Erc20EventKind> {
    let signature = topic0?;
    match *signature {
        Transfer::SIGNATURE_HASH => Some(Erc20EventKind::Transfer),
        Approval::SIGNATURE_HASH => Some(Erc20EventKind::Approval),
        other => {
            debug!(signature = %other, "unrecognized token event");
            None
        }
    }
}
