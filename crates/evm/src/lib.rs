pub mod erc20;
pub mod governance;
pub mod poller;
pub mod provider;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod test_util;

pub use poller::EvmPoller;
pub use provider::{EthProvider, EvmLogSource};
pub use subscriber::EvmSubscriber;
