use std::sync::Arc;

use async_trait::async_trait;
use common::listener::DEFAULT_CHUNK_SIZE;
use generic_listener::{with_timeout, DisconnectedRange, ListenerError, Poller};
use tracing::{debug, error, warn};

use crate::{api::SubstrateApi, types::RawBlock, SubstrateFamily};

/// Fetches a contiguous historical block range in bounded chunks, for
/// catch-up and archival backfill.
pub struct SubstratePoller {
    api: Arc<dyn SubstrateApi>,
    chain: String,
}

impl SubstratePoller {
    pub fn new(api: Arc<dyn SubstrateApi>, chain: String) -> Self {
        Self { api, chain }
    }
}

#[async_trait]
impl Poller<SubstrateFamily> for SubstratePoller {
    async fn poll(
        &self,
        range: DisconnectedRange,
        max_chunk: Option<u64>,
    ) -> Result<Vec<RawBlock>, ListenerError> {
        let head = with_timeout(self.api.latest_block_number()).await?;
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
        let mut blocks = Vec::with_capacity((end - start + 1) as usize);
        let mut cursor = start;
        while cursor <= end {
            let chunk_end = (cursor + chunk - 1).min(end);
            debug!(chain = %self.chain, from = cursor, to = chunk_end, "fetching historical blocks");
            for number in cursor..=chunk_end {
                match with_timeout(self.api.block(number)).await? {
                    Some(block) => blocks.push(block),
                    None => {
                        // a partial, silently truncated range would be worse
                        // than an explicit failure
                        error!(
                            chain = %self.chain,
                            block = number,
                            "historical block unavailable, an archival node must be queried instead"
                        );
                        return Err(ListenerError::PrunedHistory(number));
                    }
                }
            }
            cursor = chunk_end + 1;
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockSubstrateApi;

    #[tokio::test]
    async fn fetches_the_full_range_in_order() {
        let api = Arc::new(MockSubstrateApi {
            head: 100,
            ..MockSubstrateApi::default()
        });
        let poller = SubstratePoller::new(api, "testnet".into());

        let blocks = poller
            .poll(
                DisconnectedRange {
                    start_block: Some(10),
                    end_block: Some(75),
                    max_results: None,
                },
                Some(20),
            )
            .await
            .expect("poll");

        assert_eq!(blocks.len(), 66);
        assert_eq!(blocks.first().map(|b| b.number), Some(10));
        assert_eq!(blocks.last().map(|b| b.number), Some(75));
    }

    #[tokio::test]
    async fn open_ended_range_stops_at_the_chain_head() {
        let api = Arc::new(MockSubstrateApi {
            head: 42,
            ..MockSubstrateApi::default()
        });
        let poller = SubstratePoller::new(api, "testnet".into());

        let blocks = poller
            .poll(DisconnectedRange::from_block(40), None)
            .await
            .expect("poll");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks.last().map(|b| b.number), Some(42));
    }

    #[tokio::test]
    async fn pruned_history_fails_the_whole_call() {
        let api = Arc::new(MockSubstrateApi {
            head: 100,
            pruned_below: 20,
            ..MockSubstrateApi::default()
        });
        let poller = SubstratePoller::new(api, "testnet".into());

        let err = poller
            .poll(
                DisconnectedRange {
                    start_block: Some(15),
                    end_block: Some(30),
                    max_results: None,
                },
                None,
            )
            .await
            .expect_err("pruned block must fail loudly");
        assert!(matches!(err, ListenerError::PrunedHistory(15)));
    }

    #[tokio::test]
    async fn max_results_keeps_only_the_most_recent_blocks() {
        let api = Arc::new(MockSubstrateApi {
            head: 100,
            ..MockSubstrateApi::default()
        });
        let poller = SubstratePoller::new(api, "testnet".into());

        let blocks = poller
            .poll(
                DisconnectedRange {
                    start_block: Some(0),
                    end_block: Some(99),
                    max_results: Some(10),
                },
                None,
            )
            .await
            .expect("poll");

        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks.first().map(|b| b.number), Some(90));
    }

    #[tokio::test]
    async fn inverted_ranges_are_rejected() {
        let api = Arc::new(MockSubstrateApi {
            head: 100,
            ..MockSubstrateApi::default()
        });
        let poller = SubstratePoller::new(api, "testnet".into());

        let err = poller
            .poll(
                DisconnectedRange {
                    start_block: Some(50),
                    end_block: Some(10),
                    max_results: None,
                },
                None,
            )
            .await
            .expect_err("inverted range");
        assert!(matches!(
            err,
            ListenerError::InvalidRange { start: 50, end: 10 }
        ));
    }
}
