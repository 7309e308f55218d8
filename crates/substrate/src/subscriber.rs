use std::sync::Arc;

use async_trait::async_trait;
use common::listener::RETRY_DELAY;
use futures_util::StreamExt;
use generic_listener::{ListenerError, Subscriber, SubscriberItem, SubscriberState};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{api::SubstrateApi, types::RawBlock, SubstrateFamily};

/// Pushes every new block to the listener's sink in receipt order.
///
/// The initial handshake failing is an error; after that, a dropped stream
/// is re-established with a fixed delay and each recovery is surfaced as a
/// `Connected` item so the owning listener can catch up.
pub struct SubstrateSubscriber {
    api: Arc<dyn SubstrateApi>,
    chain: String,
    state: SubscriberState,
    forward: Option<JoinHandle<()>>,
}

impl SubstrateSubscriber {
    pub fn new(api: Arc<dyn SubstrateApi>, chain: String) -> Self {
        Self {
            api,
            chain,
            state: SubscriberState::Uninitialized,
            forward: None,
        }
    }
}

#[async_trait]
impl Subscriber<SubstrateFamily> for SubstrateSubscriber {
    async fn subscribe(
        &mut self,
        sink: mpsc::Sender<SubscriberItem<RawBlock>>,
    ) -> Result<(), ListenerError> {
        let stream = self.api.subscribe_blocks().await?;

        let api = Arc::clone(&self.api);
        let chain = self.chain.clone();
        self.forward = Some(tokio::spawn(async move {
            let mut stream = stream;
            loop {
                if sink.send(SubscriberItem::Connected).await.is_err() {
                    return;
                }
                while let Some(block) = stream.next().await {
                    if sink.send(SubscriberItem::Raw(block)).await.is_err() {
                        debug!(chain = %chain, "listener sink closed, stopping delivery");
                        return;
                    }
                }
                warn!(chain = %chain, "block subscription ended, resubscribing");
                loop {
                    sleep(RETRY_DELAY).await;
                    match api.subscribe_blocks().await {
                        Ok(next) => {
                            stream = next;
                            break;
                        }
                        Err(e) => {
                            warn!(chain = %chain, "resubscribe failed, retrying: {e}")
                        }
                    }
                }
            }
        }));

        self.state = SubscriberState::Subscribed;
        info!(chain = %self.chain, "subscribed to new blocks");
        Ok(())
    }

    async fn unsubscribe(&mut self) {
        if self.state != SubscriberState::Subscribed {
            warn!(chain = %self.chain, "unsubscribe called without an active subscription");
            return;
        }
        if let Some(task) = self.forward.take() {
            task.abort();
        }
        self.state = SubscriberState::Unsubscribed;
        info!(chain = %self.chain, "unsubscribed from new blocks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockSubstrateApi;

    fn block(number: u64) -> RawBlock {
        RawBlock {
            number,
            events: Vec::new(),
            extrinsics: Vec::new(),
        }
    }

    #[tokio::test]
    async fn delivers_connected_then_blocks_in_receipt_order() {
        let api = Arc::new(MockSubstrateApi {
            stream_blocks: vec![block(1), block(2)],
            ..MockSubstrateApi::default()
        });
        let mut subscriber = SubstrateSubscriber::new(api, "testnet".into());

        let (tx, mut rx) = mpsc::channel(16);
        subscriber.subscribe(tx).await.expect("subscribe");

        assert!(matches!(rx.recv().await, Some(SubscriberItem::Connected)));
        match rx.recv().await {
            Some(SubscriberItem::Raw(b)) => assert_eq!(b.number, 1),
            other => panic!("expected raw block, got {other:?}"),
        }
        match rx.recv().await {
            Some(SubscriberItem::Raw(b)) => assert_eq!(b.number, 2),
            other => panic!("expected raw block, got {other:?}"),
        }

        subscriber.unsubscribe().await;
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let api = Arc::new(MockSubstrateApi::default());
        let mut subscriber = SubstrateSubscriber::new(api, "testnet".into());

        // never subscribed: warns, does not panic
        subscriber.unsubscribe().await;

        let (tx, _rx) = mpsc::channel(16);
        subscriber.subscribe(tx).await.expect("subscribe");
        subscriber.unsubscribe().await;
        // second call warns again, still no panic
        subscriber.unsubscribe().await;
    }
}
