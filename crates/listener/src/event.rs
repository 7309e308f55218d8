use chrono::{DateTime, Utc};

/// A member of one chain family's closed enumeration of recognized event
/// categories.
pub trait EventKind:
    Copy + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
    /// Resolves a canonical kind name (the control-surface spelling, e.g.
    /// "balance-transfer") back to a kind. This is not the chain-native
    /// event name, which the per-family type parsers own.
    fn from_name(name: &str) -> Option<Self>;

    fn as_str(&self) -> &'static str;
}

/// The tagged payload of a canonical event. `kind()` uniquely determines the
/// field set: each family's implementation is a closed enum, so every
/// consumption site is forced through an exhaustive match.
pub trait EventData: Clone + std::fmt::Debug + Send + Sync {
    type Kind: EventKind;

    fn kind(&self) -> Self::Kind;
}

/// The canonical, chain-agnostic record produced by the pipeline.
///
/// Never mutated after creation except for the dispatch layer stamping
/// `chain` and `received` at the moment of handling.
#[derive(Debug, Clone)]
pub struct ChainEvent<D> {
    /// Chain height at which the event occurred, or a synthetic
    /// approximation for storage-reconstructed events.
    pub block_number: u64,
    pub data: D,
    /// Notification allow-list: when present, only these addresses are told.
    pub include_addresses: Option<Vec<String>>,
    /// Notification deny-list: the addresses that caused the event and need
    /// not be re-notified of their own action.
    pub exclude_addresses: Option<Vec<String>>,
    pub chain: Option<String>,
    pub received: Option<DateTime<Utc>>,
}

impl<D> ChainEvent<D> {
    pub fn new(block_number: u64, data: D) -> Self {
        Self {
            block_number,
            data,
            include_addresses: None,
            exclude_addresses: None,
            chain: None,
            received: None,
        }
    }

    // Exactly one of the two applies per event kind; the enricher decides.

    pub fn including(mut self, addresses: Vec<String>) -> Self {
        self.include_addresses = Some(addresses);
        self
    }

    pub fn excluding(mut self, addresses: Vec<String>) -> Self {
        self.exclude_addresses = Some(addresses);
        self
    }
}

/// A block interval believed to contain missed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectedRange {
    /// Absent means "from genesis" (expensive, last resort only).
    pub start_block: Option<u64>,
    /// Absent means "up to current chain head at fetch time".
    pub end_block: Option<u64>,
    pub max_results: Option<usize>,
}

impl DisconnectedRange {
    pub fn from_block(start_block: u64) -> Self {
        Self {
            start_block: Some(start_block),
            ..Self::default()
        }
    }
}
