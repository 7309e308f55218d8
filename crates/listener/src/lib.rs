pub mod error;
pub mod event;
pub mod family;
pub mod handler;
pub mod listener;
pub mod registry;

pub use error::{with_timeout, EnrichError, ListenerError};
pub use event::{ChainEvent, DisconnectedRange, EventData, EventKind};
pub use family::{
    ApiConnector, ComponentsBuilder, Family, FamilyComponents, Poller, Processor, StorageFetcher,
    Subscriber, SubscriberItem, SubscriberState,
};
pub use handler::{EventHandler, HandlerEntry, LoggingHandler};
pub use listener::{catchup_range, Listener, ListenerState, ReconnectRangeFn};
pub use registry::{ListenerRegistry, RegisteredListener};
