//! # ledgerbus Communication
//!
//! Remote transports for the ledgerbus message bus. Provides an in-process
//! message hub that relays messages between buses and the connector a bus
//! uses to reach it.

pub mod hub;

pub use hub::{
    ClientId, ClientInfo, HubConfig, HubConnector, HubError, HubTransport, MessageHub,
};
