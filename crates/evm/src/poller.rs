use std::{marker::PhantomData, sync::Arc};

use alloy::rpc::types::Log;
use async_trait::async_trait;
use common::listener::DEFAULT_CHUNK_SIZE;
use generic_listener::{with_timeout, DisconnectedRange, Family, ListenerError, Poller};
use tracing::{debug, error, warn};

use crate::provider::EvmLogSource;

/// Fetches historical contract logs in bounded block chunks, for catch-up
/// and archival backfill. Shared by the EVM families.
pub struct EvmPoller<F> {
    source: Arc<dyn EvmLogSource>,
    chain: String,
    _family: PhantomData<fn() -> F>,
}

impl<F> EvmPoller<F> {
    pub fn new(source: Arc<dyn EvmLogSource>, chain: String) -> Self {
        Self {
            source,
            chain,
            _family: PhantomData,
        }
    }
}

#[async_trait]
impl<F: Family<Raw = Vec<Log>>> Poller<F> for EvmPoller<F> {
    async fn poll(
        &self,
        range: DisconnectedRange,
        max_chunk: Option<u64>,
    ) -> Result<Vec<Vec<Log>>, ListenerError> {
        let head = with_timeout(self.source.latest_block_number()).await?;
        let mut start = range.start_block.unwrap_or(0);
        let end = range.end_block.unwrap_or(head).min(head);
        if start > end {
            return Err(ListenerError::InvalidRange { start, end });
        }

        if let Some(max) = range.max_results {
            let span = end - start + 1;
            if span > max as u64 {
                warn!(
                    chain = %self.chain,
                    requested = span,
                    kept = max,
                    "range exceeds max results, fetching only the most recent blocks"
                );
                start = end + 1 - max as u64;
            }
        }

        let chunk = max_chunk.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);
        let mut batches = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            let chunk_end = (cursor + chunk - 1).min(end);
            debug!(chain = %self.chain, from = cursor, to = chunk_end, "fetching historical logs");
            let logs = with_timeout(self.source.logs(cursor, chunk_end))
                .await
                .map_err(|e| {
                    // a partial result would be worse than an explicit
                    // failure; old ranges typically need an archival node
                    error!(
                        chain = %self.chain,
                        from = cursor,
                        to = chunk_end,
                        "historical log fetch failed, an archival node may be required: {e}"
                    );
                    e
                })?;
            if !logs.is_empty() {
                batches.push(logs);
            }
            cursor = chunk_end + 1;
        }

        Ok(batches)
    }
}
