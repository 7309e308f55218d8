use std::sync::Arc;

use async_trait::async_trait;
use common::config::ChainOptions;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use crate::{
    error::ListenerError,
    event::{ChainEvent, DisconnectedRange, EventData},
};

/// One chain family: the set of types its pipeline is built from.
///
/// Adding a family means implementing these seams and registering one
/// listener, not editing a central switch.
pub trait Family: Send + Sync + 'static {
    const FAMILY: &'static str;

    /// Opaque per-family Api capability. Connection bootstrap and the
    /// low-level bindings behind it are out of core scope.
    type Api: ?Sized + Send + Sync + 'static;

    /// The raw unit one subscription push or one poll chunk yields.
    type Raw: Send + 'static;

    /// The family's closed tagged union of canonical payloads.
    type Data: EventData + 'static;
}

#[async_trait]
pub trait Processor<F: Family>: Send + Sync {
    /// Normalizes one raw batch, preserving the source's relative ordering.
    ///
    /// Never fails as a whole: unrecognized events are dropped at debug
    /// level and a per-event enrichment failure is logged and skipped, so
    /// one malformed event cannot abort the rest of the batch.
    async fn process(&self, raw: F::Raw) -> Vec<ChainEvent<F::Data>>;
}

/// Items a subscriber pushes into the listener's sink, in receipt order.
#[derive(Debug)]
pub enum SubscriberItem<R> {
    /// Transport (re)connected. The owning listener reacts by running
    /// catch-up over the disconnection window.
    Connected,
    Raw(R),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Uninitialized,
    Subscribed,
    Unsubscribed,
}

#[async_trait]
pub trait Subscriber<F: Family>: Send + Sync {
    /// Starts pushing raw units into `sink`. Fails if the initial handshake
    /// cannot be established; disconnects after that are retried with a
    /// fixed delay and each recovery surfaces as [`SubscriberItem::Connected`].
    async fn subscribe(
        &mut self,
        sink: mpsc::Sender<SubscriberItem<F::Raw>>,
    ) -> Result<(), ListenerError>;

    /// Stops delivery of new raw units. Idempotent: calling it without an
    /// active subscription warns and does nothing.
    async fn unsubscribe(&mut self);
}

#[async_trait]
pub trait Poller<F: Family>: Send + Sync {
    /// Fetches a contiguous historical range in bounded chunks. Pruned
    /// history fails the whole call loudly rather than returning a silently
    /// truncated range.
    async fn poll(
        &self,
        range: DisconnectedRange,
        max_chunk: Option<u64>,
    ) -> Result<Vec<F::Raw>, ListenerError>;
}

#[async_trait]
pub trait StorageFetcher<F: Family>: Send + Sync {
    /// Reconstructs the events that must have fired to produce current
    /// snapshot storage, for chains whose historical logs are not
    /// retrievable over the missed window.
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<ChainEvent<F::Data>>, ListenerError>;

    async fn fetch_one(&self, id: &str) -> Result<Vec<ChainEvent<F::Data>>, ListenerError>;
}

/// The component bundle a listener drives, bound to one Api handle.
pub struct FamilyComponents<F: Family> {
    pub processor: Arc<dyn Processor<F>>,
    pub subscriber: Box<dyn Subscriber<F>>,
    pub poller: Option<Arc<dyn Poller<F>>>,
    pub storage_fetcher: Option<Arc<dyn StorageFetcher<F>>>,
}

/// One connection attempt against the chain endpoint. The listener wraps
/// this in its bounded retry loop.
pub type ApiConnector<F> = Box<
    dyn Fn(&ChainOptions) -> BoxFuture<'static, Result<Arc<<F as Family>::Api>, ListenerError>>
        + Send
        + Sync,
>;

/// Builds the family's components bound to a freshly connected Api.
pub type ComponentsBuilder<F> =
    Box<dyn Fn(Arc<<F as Family>::Api>, &ChainOptions) -> FamilyComponents<F> + Send + Sync>;
