use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::event::{ChainEvent, EventData, EventKind};

/// A consumer of canonical events.
///
/// Handlers run as an ordered chain: each receives the previous handler's
/// return value, which lets e.g. a storage handler pass a row reference to
/// the notification handler behind it. Catch-up may redeliver events also
/// seen live, so handlers must tolerate at-least-once delivery.
#[async_trait]
pub trait EventHandler<D: EventData>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        event: &ChainEvent<D>,
        prev: Option<Value>,
    ) -> eyre::Result<Option<Value>>;
}

pub struct HandlerEntry<D: EventData> {
    pub handler: Box<dyn EventHandler<D>>,
    /// Kinds this handler is skipped for. Checked per event, the handler
    /// stays in the chain.
    pub excluded_kinds: HashSet<D::Kind>,
}

/// Ambient tail handler that logs every canonical event it sees. Passes the
/// accumulator through untouched.
#[derive(Default)]
pub struct LoggingHandler;

#[async_trait]
impl<D: EventData> EventHandler<D> for LoggingHandler {
    fn name(&self) -> &'static str {
        "logger"
    }

    async fn handle(
        &self,
        event: &ChainEvent<D>,
        prev: Option<Value>,
    ) -> eyre::Result<Option<Value>> {
        info!(
            chain = event.chain.as_deref().unwrap_or("?"),
            block = event.block_number,
            kind = event.data.kind().as_str(),
            "handled chain event"
        );
        Ok(prev)
    }
}
