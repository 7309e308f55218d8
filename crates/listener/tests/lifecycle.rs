use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use common::config::ChainOptions;
use generic_listener::{
    ApiConnector, ChainEvent, ComponentsBuilder, DisconnectedRange, EventData, EventHandler,
    EventKind, Family, FamilyComponents, Listener, ListenerError, ListenerRegistry, ListenerState,
    Poller, Processor, StorageFetcher, Subscriber, SubscriberItem, SubscriberState,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TestKind {
    Ping,
    Pong,
}

impl EventKind for TestKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(TestKind::Ping),
            "pong" => Some(TestKind::Pong),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TestKind::Ping => "ping",
            TestKind::Pong => "pong",
        }
    }
}

#[derive(Debug, Clone)]
enum TestData {
    Ping,
    Pong,
}

impl EventData for TestData {
    type Kind = TestKind;

    fn kind(&self) -> TestKind {
        match self {
            TestData::Ping => TestKind::Ping,
            TestData::Pong => TestKind::Pong,
        }
    }
}

struct MockApi;

struct TestFamily;

impl Family for TestFamily {
    const FAMILY: &'static str = "test";
    type Api = MockApi;
    type Raw = Vec<u64>;
    type Data = TestData;
}

struct MockProcessor;

#[async_trait]
impl Processor<TestFamily> for MockProcessor {
    async fn process(&self, raw: Vec<u64>) -> Vec<ChainEvent<TestData>> {
        raw.into_iter()
            .map(|block| ChainEvent::new(block, TestData::Ping))
            .collect()
    }
}

/// Plays a fixed script of items into the sink, then keeps it open until
/// unsubscribed.
struct ScriptedSubscriber {
    script: Vec<SubscriberItem<Vec<u64>>>,
    state: SubscriberState,
    keepalive: Option<mpsc::Sender<SubscriberItem<Vec<u64>>>>,
}

impl ScriptedSubscriber {
    fn new(script: Vec<SubscriberItem<Vec<u64>>>) -> Self {
        Self {
            script,
            state: SubscriberState::Uninitialized,
            keepalive: None,
        }
    }
}

#[async_trait]
impl Subscriber<TestFamily> for ScriptedSubscriber {
    async fn subscribe(
        &mut self,
        sink: mpsc::Sender<SubscriberItem<Vec<u64>>>,
    ) -> Result<(), ListenerError> {
        sink.send(SubscriberItem::Connected)
            .await
            .map_err(|_| ListenerError::Rpc("sink closed".into()))?;
        for item in self.script.drain(..) {
            sink.send(item)
                .await
                .map_err(|_| ListenerError::Rpc("sink closed".into()))?;
        }
        self.keepalive = Some(sink);
        self.state = SubscriberState::Subscribed;
        Ok(())
    }

    async fn unsubscribe(&mut self) {
        self.keepalive = None;
        self.state = SubscriberState::Unsubscribed;
    }
}

struct MockFetcher {
    events: Vec<u64>,
}

#[async_trait]
impl StorageFetcher<TestFamily> for MockFetcher {
    async fn fetch(
        &self,
        _range: Option<DisconnectedRange>,
        _fetch_all_completed: bool,
    ) -> Result<Vec<ChainEvent<TestData>>, ListenerError> {
        Ok(self
            .events
            .iter()
            .map(|block| ChainEvent::new(*block, TestData::Ping))
            .collect())
    }

    async fn fetch_one(&self, _id: &str) -> Result<Vec<ChainEvent<TestData>>, ListenerError> {
        Ok(Vec::new())
    }
}

struct NoPoller;

#[async_trait]
impl Poller<TestFamily> for NoPoller {
    async fn poll(
        &self,
        _range: DisconnectedRange,
        _max_chunk: Option<u64>,
    ) -> Result<Vec<Vec<u64>>, ListenerError> {
        Ok(Vec::new())
    }
}

type Seen = Arc<Mutex<Vec<(u64, Option<Value>)>>>;

struct CollectHandler {
    seen: Seen,
    /// What this handler passes to the next one, keyed off the block number.
    emit: fn(u64) -> Option<Value>,
}

#[async_trait]
impl EventHandler<TestData> for CollectHandler {
    fn name(&self) -> &'static str {
        "collect"
    }

    async fn handle(
        &self,
        event: &ChainEvent<TestData>,
        prev: Option<Value>,
    ) -> eyre::Result<Option<Value>> {
        assert!(event.chain.is_some(), "dispatch must stamp the chain id");
        assert!(event.received.is_some(), "dispatch must stamp received");
        self.seen
            .lock()
            .unwrap()
            .push((event.block_number, prev));
        Ok((self.emit)(event.block_number))
    }
}

struct FailingHandler;

#[async_trait]
impl EventHandler<TestData> for FailingHandler {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn handle(
        &self,
        event: &ChainEvent<TestData>,
        _prev: Option<Value>,
    ) -> eyre::Result<Option<Value>> {
        if event.block_number == 7 {
            eyre::bail!("synthetic handler failure");
        }
        Ok(Some(json!("ok")))
    }
}

fn options(chain: &str) -> ChainOptions {
    ChainOptions {
        chain: chain.to_string(),
        url: "ws://localhost:9944".to_string(),
        skip_catchup: false,
        excluded_events: Vec::new(),
        max_chunk_size: None,
    }
}

fn builder(
    catchup_events: Vec<u64>,
    script: Vec<SubscriberItem<Vec<u64>>>,
) -> ComponentsBuilder<TestFamily> {
    let script = Arc::new(Mutex::new(Some(script)));
    Box::new(move |_api, _options| {
        let script = script.lock().unwrap().take().unwrap_or_default();
        FamilyComponents {
            processor: Arc::new(MockProcessor),
            subscriber: Box::new(ScriptedSubscriber::new(script)),
            poller: Some(Arc::new(NoPoller)),
            storage_fetcher: Some(Arc::new(MockFetcher {
                events: catchup_events.clone(),
            })),
        }
    })
}

async fn wait_for<T>(seen: &Arc<Mutex<Vec<T>>>, count: usize) {
    for _ in 0..200 {
        if seen.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {count} handled events, got {}",
        seen.lock().unwrap().len()
    );
}

#[tokio::test]
async fn catchup_and_live_delivery_share_the_handler_path() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(
            vec![5],
            vec![
                SubscriberItem::Raw(vec![5]), // same block redelivered live
                SubscriberItem::Raw(vec![6]),
            ],
        ),
    );
    listener.with_reconnect_discovery(Box::new(|_chain| {
        Box::pin(async { Ok(Some(DisconnectedRange::from_block(1))) })
    }));
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&seen),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;
    assert_eq!(listener.state(), ListenerState::Subscribed);

    // at-least-once: the storage-reconstructed event and its live duplicate
    // both reach the handler
    wait_for(&seen, 3).await;
    let blocks: Vec<u64> = seen.lock().unwrap().iter().map(|(b, _)| *b).collect();
    assert_eq!(blocks, vec![5, 5, 6]);

    listener.unsubscribe().await;
    assert_eq!(listener.state(), ListenerState::Initialized);
}

#[tokio::test]
async fn reconnect_triggers_catchup_again() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(
            vec![2],
            vec![
                SubscriberItem::Raw(vec![3]),
                // transport dropped and recovered mid-stream
                SubscriberItem::Connected,
                SubscriberItem::Raw(vec![4]),
            ],
        ),
    );
    listener.with_reconnect_discovery(Box::new(|_chain| {
        Box::pin(async { Ok(Some(DisconnectedRange::from_block(1))) })
    }));
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&seen),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;

    // startup catchup (2), live (3), reconnect catchup (2 again), live (4)
    wait_for(&seen, 4).await;
    let blocks: Vec<u64> = seen.lock().unwrap().iter().map(|(b, _)| *b).collect();
    assert_eq!(blocks, vec![2, 3, 2, 4]);
}

#[tokio::test]
async fn handler_chain_passes_the_previous_result_forward() {
    let first: Seen = Arc::new(Mutex::new(Vec::new()));
    let second: Seen = Arc::new(Mutex::new(Vec::new()));

    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(vec![], vec![SubscriberItem::Raw(vec![9])]),
    );
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&first),
            emit: |block| Some(json!({ "row": block })),
        }),
        &[],
    );
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&second),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;

    wait_for(&second, 1).await;
    assert_eq!(first.lock().unwrap()[0].1, None);
    assert_eq!(
        second.lock().unwrap()[0].1,
        Some(json!({ "row": 9 })),
        "second handler must receive the first handler's result"
    );
}

#[tokio::test]
async fn failing_handler_aborts_the_chain_for_that_event_only() {
    let tail: Seen = Arc::new(Mutex::new(Vec::new()));

    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(vec![], vec![SubscriberItem::Raw(vec![7, 8])]),
    );
    listener.add_handler(Box::new(FailingHandler), &[]);
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&tail),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;

    wait_for(&tail, 1).await;
    let blocks: Vec<u64> = tail.lock().unwrap().iter().map(|(b, _)| *b).collect();
    assert_eq!(blocks, vec![8], "block 7's chain aborted, block 8 delivered");
}

#[tokio::test]
async fn per_handler_exclusion_skips_without_breaking_the_chain() {
    let excluded: Seen = Arc::new(Mutex::new(Vec::new()));
    let tail: Seen = Arc::new(Mutex::new(Vec::new()));

    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(vec![], vec![SubscriberItem::Raw(vec![1])]),
    );
    // all test events are pings, so this handler never runs
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&excluded),
            emit: |_| Some(json!("should not appear")),
        }),
        &["ping"],
    );
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&tail),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;

    wait_for(&tail, 1).await;
    assert!(excluded.lock().unwrap().is_empty());
    assert_eq!(tail.lock().unwrap()[0].1, None);
}

#[tokio::test]
async fn globally_excluded_kinds_reach_no_handler() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let mut opts = options("testnet");
    opts.excluded_events = vec!["ping".to_string()];

    let mut listener = Listener::<TestFamily>::with_api(
        opts,
        Arc::new(MockApi),
        builder(vec![], vec![SubscriberItem::Raw(vec![1]), SubscriberItem::Raw(vec![2])]),
    );
    listener.add_handler(
        Box::new(CollectHandler {
            seen: Arc::clone(&seen),
            emit: |_| None,
        }),
        &[],
    );

    listener.init().await.expect("init");
    listener.subscribe().await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn subscribe_before_init_is_a_warning_not_a_panic() {
    let mut listener = Listener::<TestFamily>::with_api(
        options("testnet"),
        Arc::new(MockApi),
        builder(vec![], vec![]),
    );
    listener.subscribe().await;
    assert_eq!(listener.state(), ListenerState::Constructed);
}

#[tokio::test(start_paused = true)]
async fn failed_init_is_fatal_and_registers_nothing() {
    let connector: ApiConnector<TestFamily> = Box::new(|_options| {
        Box::pin(async { Err(ListenerError::Rpc("connection refused".into())) })
    });
    let listener = Listener::<TestFamily>::new(options("testnet"), connector, builder(vec![], vec![]));

    let mut registry = ListenerRegistry::new();
    let err = registry
        .add_listener(Box::new(listener))
        .await
        .expect_err("init must fail after bounded retries");
    assert!(matches!(err, ListenerError::Connection { attempts: 3, .. }));
    assert!(!registry.contains("testnet"));
}

#[tokio::test]
async fn registry_rejects_duplicates_and_unknown_chains() {
    let mut registry = ListenerRegistry::new();

    let make = || {
        let mut listener = Listener::<TestFamily>::with_api(
            options("dupnet"),
            Arc::new(MockApi),
            builder(vec![], vec![]),
        );
        listener.add_handler(
            Box::new(CollectHandler {
                seen: Arc::new(Mutex::new(Vec::new())),
                emit: |_| None,
            }),
            &[],
        );
        Box::new(listener)
    };

    registry.add_listener(make()).await.expect("first add");
    let err = registry.add_listener(make()).await.expect_err("duplicate");
    assert!(matches!(err, ListenerError::DuplicateChain(_)));

    let err = registry
        .remove_listener("unknown")
        .await
        .expect_err("unknown chain");
    assert!(matches!(err, ListenerError::UnsupportedChain(_)));

    registry.remove_listener("dupnet").await.expect("remove");
    assert!(!registry.contains("dupnet"));
}
