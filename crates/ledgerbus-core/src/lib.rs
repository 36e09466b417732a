//! # ledgerbus Core
//!
//! Core types for ledgerbus: messages and channels, the thread safe message
//! bus with its listener registry, and the interfaces used to bridge a bus
//! to a remote peer.

pub mod error;
pub mod message;
pub mod message_bus;
pub mod remote;

pub use error::{ConfigError, ConnectionError, Error, Result};

pub use message::{ChannelEvent, Message, MessageChannel, MessageProperty, Payload};

// Re-export the bus for convenience
pub use message_bus::{
    init_message_bus, message_bus, message_bus_named, ListenerHandle, MessageBus,
    MessageBusConfig, MessageListener, RemoteInbox, DEFAULT_BUS_NAME, DEFAULT_HANDSHAKE_TIMEOUT,
};

pub use remote::{
    Credential, DataStoreType, Endpoint, RemoteConnector, RemoteIdentity, RemoteTransport,
};
