use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::{Filter, Log},
};
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use generic_listener::ListenerError;
use tracing::info;

/// Log-level view over one EVM endpoint, shared by every EVM chain family.
#[async_trait]
pub trait EvmLogSource: Send + Sync {
    async fn latest_block_number(&self) -> Result<u64, ListenerError>;

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ListenerError>;

    async fn subscribe_logs(&self) -> Result<BoxStream<'static, Log>, ListenerError>;
}

/// Websocket-backed provider scoped to the contracts and event signatures
/// one listener watches.
pub struct EthProvider {
    provider: DynProvider,
    addresses: Vec<Address>,
    events: Vec<&'static str>,
}

impl EthProvider {
    /// One connection attempt. The listener owns the bounded retry loop.
    pub async fn connect(
        url: &str,
        addresses: &[String],
        events: &[&'static str],
    ) -> Result<Self, ListenerError> {
        let addresses = addresses
            .iter()
            .map(|addr| addr.parse::<Address>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ListenerError::Rpc(format!("invalid contract address: {e}")))?;

        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(url))
            .await
            .map_err(|e| ListenerError::Rpc(format!("ws connection to {url} failed: {e}")))?;
        info!(%url, "ws connection established");

        Ok(Self {
            provider: DynProvider::new(provider),
            addresses,
            events: events.to_vec(),
        })
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .address(self.addresses.clone())
            .events(self.events.iter().copied())
    }

    /// Raw handle for contract storage reads layered on top of this source.
    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }
}

#[async_trait]
impl EvmLogSource for EthProvider {
    async fn latest_block_number(&self) -> Result<u64, ListenerError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ListenerError> {
        let filter = self.filter().from_block(from).to_block(to);
        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))
    }

    async fn subscribe_logs(&self) -> Result<BoxStream<'static, Log>, ListenerError> {
        let subscription = self
            .provider
            .subscribe_logs(&self.filter())
            .await
            .map_err(|e| ListenerError::Rpc(e.to_string()))?;
        Ok(subscription.into_stream().boxed())
    }
}
