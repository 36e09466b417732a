//! # ledgerbus
//!
//! A process-local message bus that can bridge to a remote peer, turning a
//! single-process event system into a notification channel between a
//! data-owning process and its UI clients.
//!
//! ## Architecture
//!
//! ledgerbus is organized as a workspace with multiple crates:
//!
//! 1. **ledgerbus-core** - Messages, channels, the message bus and the
//!    remote transport interfaces
//! 2. **ledgerbus-communication** - In-process message hub and its transport
//! 3. **ledgerbus-settings** - Configuration files
//! 4. **ledgerbus** - Logging setup and the demo binary

pub use ledgerbus_communication::{HubConfig, HubConnector, HubError, MessageHub};
pub use ledgerbus_core::{
    message_bus, message_bus_named, ChannelEvent, ConnectionError, Credential, DataStoreType,
    Error, Message, MessageBus, MessageBusConfig, MessageChannel, MessageListener,
    MessageProperty, Result,
};
pub use ledgerbus_settings::{BusSettings, Config, RemoteSettings};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// What the demo observed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoReport {
    /// Messages the data-owning bus delivered locally
    pub server_deliveries: usize,
    /// Messages relayed to the UI bus
    pub ui_deliveries: usize,
}

struct CountingListener {
    label: &'static str,
    count: AtomicUsize,
}

impl MessageListener for CountingListener {
    fn message_posted(&self, message: &Message) {
        self.count.fetch_add(1, Ordering::SeqCst);
        tracing::info!("[{}] {}", self.label, message);
    }
}

/// Run a data-owning bus and a UI bus bridged through a message hub.
///
/// The hub is bound on the configured endpoint and shut down again before
/// returning.
pub fn run_demo(config: &Config, password: &Credential) -> anyhow::Result<DemoReport> {
    config.validate()?;
    let remote = &config.remote;

    let hub = MessageHub::bind(
        &remote.host,
        remote.port,
        HubConfig {
            password: password.clone(),
            data_base_path: "demo://books".to_string(),
            store_type: DataStoreType::H2Database,
            answer_handshake: true,
        },
    )?;

    let server = MessageBus::with_config("demo-server", config.bus.to_bus_config());
    let ui = MessageBus::with_config(remote.bus_name.clone(), config.bus.to_bus_config());
    for bus in [&server, &ui] {
        bus.set_connector(Arc::new(HubConnector));
        bus.set_remote(&remote.host, remote.port, password)?;
    }
    tracing::info!(
        "UI bus bound to {} store at {}",
        ui.remote_data_store_type()
            .map_or_else(|| "unknown".to_string(), |t| t.to_string()),
        ui.remote_data_base_path().unwrap_or_default()
    );

    let server_listener = Arc::new(CountingListener {
        label: "server",
        count: AtomicUsize::new(0),
    });
    let ui_listener = Arc::new(CountingListener {
        label: "ui",
        count: AtomicUsize::new(0),
    });
    server.register_listener(&server_listener, &MessageChannel::ALL);
    ui.register_listener(&ui_listener, &MessageChannel::ALL);

    server.fire_event(
        Message::for_event(ChannelEvent::AccountAdd)
            .with_property(MessageProperty::Account, "Checking"),
    );
    server.fire_event(
        Message::for_event(ChannelEvent::TransactionAdd)
            .with_property(MessageProperty::Description, "Opening balance"),
    );
    // Stays on the server side.
    server.fire_event(Message::for_event(ChannelEvent::BackgroundProcessStarted));

    let wait = Duration::from_secs(5);
    server.wait_idle(wait);
    ui.wait_idle(wait);

    let report = DemoReport {
        server_deliveries: server_listener.count.load(Ordering::SeqCst),
        ui_deliveries: ui_listener.count.load(Ordering::SeqCst),
    };

    ui.set_local();
    server.set_local();
    hub.shutdown();
    Ok(report)
}
