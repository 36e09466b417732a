//! Process-wide named bus instances.
//!
//! Instances are created on first lookup and live for the rest of the
//! process.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::bus::{MessageBus, MessageBusConfig};

/// Name of the bus reserved for interactive/UI use
pub const DEFAULT_BUS_NAME: &str = "default";

static BUSES: OnceLock<Mutex<HashMap<String, Arc<MessageBus>>>> = OnceLock::new();

fn buses() -> &'static Mutex<HashMap<String, Arc<MessageBus>>> {
    BUSES.get_or_init(Default::default)
}

/// Get or create the bus reserved for UI use
pub fn message_bus() -> Arc<MessageBus> {
    message_bus_named(DEFAULT_BUS_NAME)
}

/// Get or create the bus registered under `name`
pub fn message_bus_named(name: &str) -> Arc<MessageBus> {
    let mut buses = buses().lock();
    buses
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(MessageBus::new(name)))
        .clone()
}

/// Create the bus registered under `name` with a custom configuration.
///
/// Must be called before any lookup of `name`. Returns the configuration
/// back if the bus already exists.
pub fn init_message_bus(
    name: &str,
    config: MessageBusConfig,
) -> Result<Arc<MessageBus>, MessageBusConfig> {
    let mut buses = buses().lock();
    if buses.contains_key(name) {
        return Err(config);
    }
    let bus = Arc::new(MessageBus::with_config(name, config));
    buses.insert(name.to_string(), bus.clone());
    Ok(bus)
}

impl MessageBus {
    /// Returns the message bus instance intended for UI use
    pub fn instance() -> Arc<MessageBus> {
        message_bus()
    }

    /// Returns the named message bus instance, creating it if needed
    pub fn get_instance(name: &str) -> Arc<MessageBus> {
        message_bus_named(name)
    }
}

/// Convenience macro to fire a message on the UI bus
#[macro_export]
macro_rules! fire {
    ($message:expr) => {
        $crate::message_bus::message_bus().fire_event($message)
    };
}
