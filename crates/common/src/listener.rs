use std::time::Duration;

/// Bounded retry contract for Api bootstrap: attempt, sleep a fixed delay,
/// retry up to this count, then fail fatally.
pub const CONNECT_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Upper bound for a single chain RPC read made mid-pipeline.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of blocks fetched per historical poll request.
pub const DEFAULT_CHUNK_SIZE: u64 = 30;
