use std::{
    collections::HashSet,
    sync::{Arc, Mutex, RwLock},
};

use chrono::Utc;
use common::{
    config::ChainOptions,
    listener::{CONNECT_RETRIES, RETRY_DELAY},
};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, error, info, warn};

use crate::{
    error::ListenerError,
    event::{ChainEvent, DisconnectedRange, EventData, EventKind},
    family::{
        ApiConnector, ComponentsBuilder, Family, FamilyComponents, Poller, Processor,
        StorageFetcher, SubscriberItem,
    },
    handler::{EventHandler, HandlerEntry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Constructed,
    Initialized,
    Subscribed,
}

/// Externally-supplied "last known event block" discovery, usually backed by
/// persistent storage. Optional; its absence is a handled case and catch-up
/// degrades to the in-memory cache or is skipped.
pub type ReconnectRangeFn = Box<
    dyn Fn(String) -> BoxFuture<'static, Result<Option<DisconnectedRange>, ListenerError>>
        + Send
        + Sync,
>;

/// Combines the externally-discovered range with the in-memory last-seen
/// cache, taking the minimum non-null candidate start so whichever source
/// claims the earlier gap wins and no event is missed. Returns `None` when
/// neither source yields a usable start: catch-up never defaults to scanning
/// from genesis implicitly.
pub fn catchup_range(
    last_seen_block: Option<u64>,
    discovered: Option<DisconnectedRange>,
) -> Option<DisconnectedRange> {
    let cached = last_seen_block.map(|block| block + 1);
    let external = discovered.as_ref().and_then(|r| r.start_block);
    let start = match (cached, external) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some(DisconnectedRange {
        start_block: Some(start),
        end_block: discovered.as_ref().and_then(|r| r.end_block),
        max_results: discovered.and_then(|r| r.max_results),
    })
}

/// The dispatch layer: stamps events and runs the ordered handler chain.
/// Shared between the listener and its pump task; also owns the in-memory
/// last-seen-block cache that feeds catch-up.
pub(crate) struct Dispatch<D: EventData> {
    chain: String,
    pub(crate) handlers: Vec<HandlerEntry<D>>,
    global_excluded: RwLock<HashSet<D::Kind>>,
    last_seen_block: Mutex<Option<u64>>,
}

impl<D: EventData> Dispatch<D> {
    fn new(chain: String, global_excluded: HashSet<D::Kind>) -> Self {
        Self {
            chain,
            handlers: Vec::new(),
            global_excluded: RwLock::new(global_excluded),
            last_seen_block: Mutex::new(None),
        }
    }

    pub(crate) fn last_seen_block(&self) -> Option<u64> {
        *self
            .last_seen_block
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn set_excluded(&self, kinds: HashSet<D::Kind>) {
        *self
            .global_excluded
            .write()
            .unwrap_or_else(|e| e.into_inner()) = kinds;
    }

    pub(crate) async fn handle_event(&self, mut event: ChainEvent<D>) {
        let kind = event.data.kind();
        {
            let excluded = self
                .global_excluded
                .read()
                .unwrap_or_else(|e| e.into_inner());
            if excluded.contains(&kind) {
                debug!(
                    chain = %self.chain,
                    kind = kind.as_str(),
                    "event kind is globally excluded"
                );
                return;
            }
        }

        event.chain = Some(self.chain.clone());
        event.received = Some(Utc::now());

        {
            let mut last_seen = self
                .last_seen_block
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if last_seen.map_or(true, |block| event.block_number > block) {
                *last_seen = Some(event.block_number);
            }
        }

        // Explicit result-chaining fold: each handler receives what the
        // previous one returned. A failing handler aborts the chain for this
        // event only.
        let mut prev: Option<Value> = None;
        for entry in &self.handlers {
            if entry.excluded_kinds.contains(&kind) {
                debug!(
                    chain = %self.chain,
                    handler = entry.handler.name(),
                    kind = kind.as_str(),
                    "kind excluded for handler, skipping"
                );
                continue;
            }
            match entry.handler.handle(&event, prev.take()).await {
                Ok(next) => prev = next,
                Err(e) => {
                    error!(
                        chain = %self.chain,
                        handler = entry.handler.name(),
                        block = event.block_number,
                        kind = kind.as_str(),
                        "handler failed, aborting chain for this event: {e:#}"
                    );
                    break;
                }
            }
        }
    }
}

/// The catch-up path, shared between startup and reconnect handling.
struct Catchup<F: Family> {
    chain: String,
    processor: Arc<dyn Processor<F>>,
    poller: Option<Arc<dyn Poller<F>>>,
    storage_fetcher: Option<Arc<dyn StorageFetcher<F>>>,
    dispatch: Arc<Dispatch<F::Data>>,
    discover: Option<Arc<ReconnectRangeFn>>,
    max_chunk: Option<u64>,
}

impl<F: Family> Catchup<F> {
    async fn run(&self) -> Result<(), ListenerError> {
        let discovered = match &self.discover {
            Some(f) => match (f.as_ref())(self.chain.clone()).await {
                Ok(range) => range,
                Err(e) => {
                    warn!(chain = %self.chain, "reconnect range discovery failed: {e}");
                    None
                }
            },
            None => None,
        };

        let Some(range) = catchup_range(self.dispatch.last_seen_block(), discovered) else {
            warn!(
                chain = %self.chain,
                "no known start block from storage or cache, skipping event catchup"
            );
            return Ok(());
        };

        info!(
            chain = %self.chain,
            start = ?range.start_block,
            end = ?range.end_block,
            "catching up missed events"
        );

        // Historical and live events share the same processor/handler path;
        // only the source component differs.
        if let Some(fetcher) = &self.storage_fetcher {
            for event in fetcher.fetch(Some(range), false).await? {
                self.dispatch.handle_event(event).await;
            }
        } else if let Some(poller) = &self.poller {
            for raw in poller.poll(range, self.max_chunk).await? {
                for event in self.processor.process(raw).await {
                    self.dispatch.handle_event(event).await;
                }
            }
        } else {
            warn!(
                chain = %self.chain,
                "chain family has neither poller nor storage fetcher, skipping event catchup"
            );
        }

        Ok(())
    }
}

/// Composition root for one chain: owns the Api handle, wires the family's
/// components together, drives the catch-up-then-subscribe lifecycle and
/// fans normalized events out to the registered handler chain.
pub struct Listener<F: Family> {
    options: ChainOptions,
    state: ListenerState,
    connector: ApiConnector<F>,
    builder: ComponentsBuilder<F>,
    api: Option<Arc<F::Api>>,
    components: Option<FamilyComponents<F>>,
    dispatch: Arc<Dispatch<F::Data>>,
    discover: Option<Arc<ReconnectRangeFn>>,
    pump: Option<JoinHandle<()>>,
}

impl<F: Family> Listener<F> {
    pub fn new(
        options: ChainOptions,
        connector: ApiConnector<F>,
        builder: ComponentsBuilder<F>,
    ) -> Self {
        let excluded = parse_kinds::<F, _>(&options.excluded_events);
        let dispatch = Arc::new(Dispatch::new(options.chain.clone(), excluded));
        Self {
            options,
            state: ListenerState::Constructed,
            connector,
            builder,
            api: None,
            components: None,
            dispatch,
            discover: None,
            pump: None,
        }
    }

    /// Builds the listener around an already-established Api handle,
    /// skipping connection bootstrap. For embedders that own the transport,
    /// and for tests.
    pub fn with_api(
        options: ChainOptions,
        api: Arc<F::Api>,
        builder: ComponentsBuilder<F>,
    ) -> Self {
        let connector: ApiConnector<F> = Box::new(move |_options| {
            let api = Arc::clone(&api);
            Box::pin(async move { Ok(api) })
        });
        Self::new(options, connector, builder)
    }

    pub fn chain(&self) -> &str {
        &self.options.chain
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Registers a handler at the end of the chain, with the kinds it should
    /// be skipped for. Handlers can only be added before subscribing.
    pub fn add_handler(&mut self, handler: Box<dyn EventHandler<F::Data>>, excluded: &[&str]) {
        let excluded_kinds = parse_kinds::<F, _>(excluded);
        match Arc::get_mut(&mut self.dispatch) {
            Some(dispatch) => dispatch.handlers.push(HandlerEntry {
                handler,
                excluded_kinds,
            }),
            None => warn!(
                chain = %self.options.chain,
                "handlers cannot be added while a subscription is live"
            ),
        }
    }

    pub fn with_reconnect_discovery(&mut self, f: ReconnectRangeFn) {
        self.discover = Some(Arc::new(f));
    }

    /// Establishes the Api connection (bounded retries with a fixed delay)
    /// and builds the family components bound to it.
    pub async fn init(&mut self) -> Result<(), ListenerError> {
        let mut attempt = 0;
        let api = loop {
            match (self.connector)(&self.options).await {
                Ok(api) => break api,
                Err(e) => {
                    attempt += 1;
                    if attempt >= CONNECT_RETRIES {
                        return Err(ListenerError::Connection {
                            url: self.options.url.clone(),
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    warn!(
                        chain = %self.options.chain,
                        attempt,
                        "api connection failed, retrying in {RETRY_DELAY:?}: {e}"
                    );
                    sleep(RETRY_DELAY).await;
                }
            }
        };

        self.components = Some((self.builder)(Arc::clone(&api), &self.options));
        self.api = Some(api);
        self.state = ListenerState::Initialized;
        info!(chain = %self.options.chain, family = F::FAMILY, "listener initialized");
        Ok(())
    }

    /// Runs catch-up (unless configured off) and attaches the live
    /// subscription. Attachment failures are logged, not thrown: the
    /// listener stays initialized and `subscribe` can be retried.
    pub async fn subscribe(&mut self) {
        if self.state != ListenerState::Initialized {
            warn!(
                chain = %self.options.chain,
                state = ?self.state,
                "subscribe called on a listener that is not initialized"
            );
            return;
        }
        let Some(components) = self.components.as_mut() else {
            warn!(chain = %self.options.chain, "listener has no components, cannot subscribe");
            return;
        };

        let catchup = Arc::new(Catchup {
            chain: self.options.chain.clone(),
            processor: Arc::clone(&components.processor),
            poller: components.poller.clone(),
            storage_fetcher: components.storage_fetcher.clone(),
            dispatch: Arc::clone(&self.dispatch),
            discover: self.discover.clone(),
            max_chunk: self.options.max_chunk_size,
        });

        if self.options.skip_catchup {
            info!(chain = %self.options.chain, "event catchup disabled by configuration");
        } else if let Err(e) = catchup.run().await {
            warn!(chain = %self.options.chain, "skipping event catchup: {e}");
        }

        let (tx, mut rx) = mpsc::channel(1024);
        if let Err(e) = components.subscriber.subscribe(tx).await {
            error!(chain = %self.options.chain, "failed to attach live subscription: {e}");
            return;
        }

        let processor = Arc::clone(&components.processor);
        let dispatch = Arc::clone(&self.dispatch);
        let chain = self.options.chain.clone();
        self.pump = Some(tokio::spawn(async move {
            // Events are handled strictly one at a time, in the order the
            // processor produced them.
            let mut first_connect = true;
            while let Some(item) = rx.recv().await {
                match item {
                    SubscriberItem::Connected => {
                        if first_connect {
                            first_connect = false;
                            continue;
                        }
                        info!(chain = %chain, "transport reconnected, catching up missed events");
                        if let Err(e) = catchup.run().await {
                            warn!(chain = %chain, "skipping event catchup: {e}");
                        }
                    }
                    SubscriberItem::Raw(raw) => {
                        for event in processor.process(raw).await {
                            dispatch.handle_event(event).await;
                        }
                    }
                }
            }
            debug!(chain = %chain, "subscriber sink closed, pump finished");
        }));

        self.state = ListenerState::Subscribed;
        info!(chain = %self.options.chain, "listener subscribed");
    }

    /// Stops delivery of new raw events. In-flight enrichment and handler
    /// calls are not cancelled; the pump drains what was already pushed.
    pub async fn unsubscribe(&mut self) {
        match self.components.as_mut() {
            Some(components) => components.subscriber.unsubscribe().await,
            None => warn!(
                chain = %self.options.chain,
                "unsubscribe called on a listener that was never initialized"
            ),
        }
        if self.state == ListenerState::Subscribed {
            self.state = ListenerState::Initialized;
        }
        self.pump = None;
    }

    /// Copy-on-update: builds a fresh options value, discards the old Api
    /// handle wholesale and runs the full init-then-subscribe lifecycle
    /// against the new endpoint.
    pub async fn update_url(&mut self, url: String) -> Result<(), ListenerError> {
        info!(chain = %self.options.chain, %url, "updating endpoint, recreating api connection");
        self.unsubscribe().await;

        let mut options = self.options.clone();
        options.url = url;
        self.options = options;
        self.api = None;
        self.components = None;
        self.state = ListenerState::Constructed;

        self.init().await?;
        self.subscribe().await;
        Ok(())
    }

    /// Replaces the global excluded-kind list. Unknown names are warned
    /// about and ignored.
    pub fn set_excluded_events(&self, kinds: &[String]) {
        self.dispatch.set_excluded(parse_kinds::<F, _>(kinds));
    }
}

fn parse_kinds<F: Family, S: AsRef<str>>(names: &[S]) -> HashSet<<F::Data as EventData>::Kind> {
    let mut kinds = HashSet::new();
    for name in names {
        match <F::Data as EventData>::Kind::from_name(name.as_ref()) {
            Some(kind) => {
                kinds.insert(kind);
            }
            None => warn!(name = name.as_ref(), "unknown event kind in exclusion list"),
        }
    }
    kinds
}
