use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use crate::{error::ListenerError, family::Family, listener::Listener};

/// Object-safe facade the registry manages listeners through, so one map can
/// hold listeners of every chain family.
#[async_trait]
pub trait RegisteredListener: Send + Sync {
    fn chain(&self) -> &str;

    async fn init(&mut self) -> Result<(), ListenerError>;
    async fn subscribe(&mut self);
    async fn unsubscribe(&mut self);
    async fn update_url(&mut self, url: String) -> Result<(), ListenerError>;
    fn set_excluded_events(&self, kinds: &[String]);
}

#[async_trait]
impl<F: Family> RegisteredListener for Listener<F> {
    fn chain(&self) -> &str {
        Listener::chain(self)
    }

    async fn init(&mut self) -> Result<(), ListenerError> {
        Listener::init(self).await
    }

    async fn subscribe(&mut self) {
        Listener::subscribe(self).await
    }

    async fn unsubscribe(&mut self) {
        Listener::unsubscribe(self).await
    }

    async fn update_url(&mut self, url: String) -> Result<(), ListenerError> {
        Listener::update_url(self, url).await
    }

    fn set_excluded_events(&self, kinds: &[String]) {
        Listener::set_excluded_events(self, kinds)
    }
}

/// Owned registry of active listeners, one per configured chain.
///
/// Created at process start and passed by reference; entries are added and
/// removed only through these operations, never concurrently for the same
/// key. Every operation validates chain support before touching a listener.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Box<dyn RegisteredListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, chain: &str) -> bool {
        self.listeners.contains_key(chain)
    }

    pub fn chains(&self) -> Vec<&str> {
        self.listeners.keys().map(String::as_str).collect()
    }

    /// Initializes and subscribes the listener, then registers it. A failed
    /// init registers nothing: no half-initialized listener is left behind.
    pub async fn add_listener(
        &mut self,
        mut listener: Box<dyn RegisteredListener>,
    ) -> Result<(), ListenerError> {
        let chain = listener.chain().to_string();
        if self.listeners.contains_key(&chain) {
            return Err(ListenerError::DuplicateChain(chain));
        }

        listener.init().await?;
        listener.subscribe().await;
        info!(%chain, "listener registered");
        self.listeners.insert(chain, listener);
        Ok(())
    }

    pub async fn remove_listener(&mut self, chain: &str) -> Result<(), ListenerError> {
        let mut listener = self
            .listeners
            .remove(chain)
            .ok_or_else(|| ListenerError::UnsupportedChain(chain.to_string()))?;
        listener.unsubscribe().await;
        info!(%chain, "listener removed");
        Ok(())
    }

    pub async fn update_url(&mut self, chain: &str, url: String) -> Result<(), ListenerError> {
        let listener = self
            .listeners
            .get_mut(chain)
            .ok_or_else(|| ListenerError::UnsupportedChain(chain.to_string()))?;
        listener.update_url(url).await
    }

    pub fn set_excluded_events(&self, chain: &str, kinds: &[String]) -> Result<(), ListenerError> {
        let listener = self
            .listeners
            .get(chain)
            .ok_or_else(|| ListenerError::UnsupportedChain(chain.to_string()))?;
        listener.set_excluded_events(kinds);
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        for listener in self.listeners.values_mut() {
            listener.unsubscribe().await;
        }
        self.listeners.clear();
    }
}
