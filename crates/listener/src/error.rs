use std::time::Duration;

use common::listener::RPC_TIMEOUT;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("connection to {url} failed after {attempts} attempts: {reason}")]
    Connection {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("no listener registered for chain {0}")]
    UnsupportedChain(String),

    #[error("a listener is already registered for chain {0}")]
    DuplicateChain(String),

    #[error("block {0} is no longer available; an archival node must be queried instead")]
    PrunedHistory(u64),

    #[error("invalid block range: start {start} must be below end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("chain rpc call timed out after {0:?}")]
    Timeout(Duration),

    #[error("chain rpc error: {0}")]
    Rpc(String),
}

/// Per-event enrichment failure. Recoverable at the batch level: the
/// processor logs it at error severity and drops the single offending event,
/// the rest of the batch continues.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("missing `{0}` in raw event payload")]
    MissingField(&'static str),

    #[error("failed to decode {event}: {source}")]
    Decode {
        event: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("raw payload for {0} is not the shape this kind requires")]
    UnexpectedShape(&'static str),

    #[error("{field} value {value} does not fit the canonical width")]
    NumberOverflow {
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Api(#[from] ListenerError),
}

/// Bounds a single chain RPC read. Every enricher, poller and storage
/// fetcher network call goes through this.
pub async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, ListenerError>>,
) -> Result<T, ListenerError> {
    match tokio::time::timeout(RPC_TIMEOUT, fut).await {
        Ok(res) => res,
        Err(_) => Err(ListenerError::Timeout(RPC_TIMEOUT)),
    }
}
