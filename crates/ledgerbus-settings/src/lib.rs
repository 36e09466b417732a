//! ledgerbus Settings Crate
//!
//! Handles application configuration and settings persistence.

pub mod config;

pub use config::{BusSettings, Config, RemoteSettings};
