use std::{marker::PhantomData, sync::Arc};

use alloy::rpc::types::Log;
use async_trait::async_trait;
use common::listener::RETRY_DELAY;
use futures_util::StreamExt;
use generic_listener::{Family, ListenerError, Subscriber, SubscriberItem, SubscriberState};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::provider::EvmLogSource;

/// Pushes every new contract log to the listener's sink in receipt order.
/// Shared by the EVM families; only the downstream processor differs.
pub struct EvmSubscriber<F> {
    source: Arc<dyn EvmLogSource>,
    chain: String,
    state: SubscriberState,
    forward: Option<JoinHandle<()>>,
    _family: PhantomData<fn() -> F>,
}

impl<F> EvmSubscriber<F> {
    pub fn new(source: Arc<dyn EvmLogSource>, chain: String) -> Self {
        Self {
            source,
            chain,
            state: SubscriberState::Uninitialized,
            forward: None,
            _family: PhantomData,
        }
    }
}

#[async_trait]
impl<F: Family<Raw = Vec<Log>>> Subscriber<F> for EvmSubscriber<F> {
    async fn subscribe(
        &mut self,
        sink: mpsc::Sender<SubscriberItem<Vec<Log>>>,
    ) -> Result<(), ListenerError> {
        // the initial handshake must fail loudly; dropped streams after it
        // are re-established with a fixed delay
        let stream = self.source.subscribe_logs().await?;

        let source = Arc::clone(&self.source);
        let chain = self.chain.clone();
        self.forward = Some(tokio::spawn(async move {
            let mut stream = stream;
            loop {
                if sink.send(SubscriberItem::Connected).await.is_err() {
                    return;
                }
                while let Some(log) = stream.next().await {
                    if sink.send(SubscriberItem::Raw(vec![log])).await.is_err() {
                        debug!(chain = %chain, "listener sink closed, stopping delivery");
                        return;
                    }
                }
                warn!(chain = %chain, "log subscription ended, resubscribing");
                loop {
                    sleep(RETRY_DELAY).await;
                    match source.subscribe_logs().await {
                        Ok(next) => {
                            stream = next;
                            break;
                        }
                        Err(e) => warn!(chain = %chain, "resubscribe failed, retrying: {e}"),
                    }
                }
            }
        }));

        self.state = SubscriberState::Subscribed;
        info!(chain = %self.chain, "subscribed to contract logs");
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
        info!(chain = %self.chain, "unsubscribed from contract logs");
    }
}
