//! Message bus implementation.
//!
//! Provides the core MessageBus struct: the listener registry, the single
//! delivery worker and the optional binding to a remote transport.

use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::listener::{ListenerHandle, ListenerKey, ListenerRegistration};
use super::registry::ListenerRegistry;
use crate::error::{ConnectionError, Result};
use crate::message::{ChannelEvent, Message, MessageChannel};
use crate::remote::{Credential, DataStoreType, Endpoint, RemoteConnector, RemoteTransport};

/// Maximum wait for a valid handshake response from the remote bus
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a message bus
#[derive(Debug, Clone)]
pub struct MessageBusConfig {
    /// How long to wait for the remote identity after connecting.
    pub handshake_timeout: Duration,
    /// Prefix of the delivery worker thread name.
    pub worker_name_prefix: String,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            worker_name_prefix: "message-bus".to_string(),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

enum WorkItem {
    Deliver(Message),
    Barrier(std::sync::mpsc::SyncSender<()>),
}

/// Entry point for messages arriving from a remote peer.
///
/// Handed to a transport when it is opened. Delivered messages are marked
/// remote and queued behind everything already fired on the bus. The inbox
/// does not keep the bus alive.
#[derive(Clone)]
pub struct RemoteInbox {
    bus: String,
    sender: Option<mpsc::WeakUnboundedSender<WorkItem>>,
}

impl RemoteInbox {
    /// An inbox that discards everything, for throwaway transports
    pub fn detached() -> Self {
        Self {
            bus: String::new(),
            sender: None,
        }
    }

    /// Name of the bus this inbox feeds
    pub fn bus_name(&self) -> &str {
        &self.bus
    }

    /// Queue a message received from the peer.
    ///
    /// Returns false if the bus is gone or the inbox is detached.
    pub fn deliver(&self, message: Message) -> bool {
        let Some(sender) = self.sender.as_ref().and_then(|s| s.upgrade()) else {
            debug!(bus = %self.bus, %message, "Dropping remote message, no bus attached");
            return false;
        };
        sender.send(WorkItem::Deliver(message.into_remote())).is_ok()
    }
}

impl std::fmt::Debug for RemoteInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteInbox")
            .field("bus", &self.bus)
            .field("attached", &self.sender.is_some())
            .finish()
    }
}

/// State shared between the bus handle and its delivery worker
struct BusShared {
    name: String,
    registry: ListenerRegistry,
    transport: RwLock<Option<Arc<dyn RemoteTransport>>>,
}

impl BusShared {
    fn bound_transport(&self) -> Option<Arc<dyn RemoteTransport>> {
        self.transport.read().clone()
    }

    fn run(&self, mut receiver: mpsc::UnboundedReceiver<WorkItem>) {
        debug!(bus = %self.name, "Delivery worker started");
        while let Some(item) = receiver.blocking_recv() {
            match item {
                WorkItem::Deliver(message) => self.deliver(&message),
                WorkItem::Barrier(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!(bus = %self.name, "Delivery worker stopped");
    }

    fn deliver(&self, message: &Message) {
        let channel = message.channel();

        if message.is_remote() && message.event() == ChannelEvent::RemoteShutdown {
            if let Some(transport) = self.bound_transport() {
                if !transport.is_connected() {
                    self.release_transport(&transport);
                }
            }
        }

        if let Some(listeners) = self.registry.snapshot(channel) {
            let mut found_dead = false;
            for registration in listeners.iter() {
                let Some(listener) = registration.upgrade() else {
                    found_dead = true;
                    continue;
                };
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| listener.message_posted(message)));
                if outcome.is_err() {
                    error!(bus = %self.name, %message, "Listener panicked while handling message");
                }
            }
            if found_dead {
                let pruned = self.registry.prune(channel);
                debug!(bus = %self.name, %channel, pruned, "Pruned dropped listeners");
            }
        }

        if message.should_forward() {
            if let Some(transport) = self.bound_transport() {
                if let Err(e) = transport.send_message(message) {
                    warn!(bus = %self.name, %message, "Failed to forward message: {}", e);
                    if matches!(
                        e,
                        ConnectionError::ConnectionLost { .. } | ConnectionError::NotConnected
                    ) {
                        self.release_transport(&transport);
                    }
                }
            }
        }
    }

    /// Unbind `transport` if it is still the bound one
    fn release_transport(&self, transport: &Arc<dyn RemoteTransport>) {
        let released = {
            let mut bound = self.transport.write();
            let same = bound
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, transport));
            if same {
                bound.take()
            } else {
                None
            }
        };
        if let Some(transport) = released {
            transport.disconnect();
            warn!(bus = %self.name, "Remote connection lost, continuing in local mode");
        }
    }
}

/// Thread safe message bus
///
/// Messages fired on a bus are delivered in submission order by a single
/// worker thread. Listeners are held by weak reference only.
pub struct MessageBus {
    shared: Arc<BusShared>,
    sender: mpsc::UnboundedSender<WorkItem>,
    config: MessageBusConfig,
    /// Serializes `set_remote` and `set_local`.
    connection: Mutex<()>,
    connector: RwLock<Option<Arc<dyn RemoteConnector>>>,
}

impl MessageBus {
    /// Create a standalone bus with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MessageBusConfig::default())
    }

    /// Create a standalone bus with custom configuration
    pub fn with_config(name: impl Into<String>, config: MessageBusConfig) -> Self {
        let name = name.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(BusShared {
            name: name.clone(),
            registry: ListenerRegistry::default(),
            transport: RwLock::new(None),
        });

        let worker = shared.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("{}-{}", config.worker_name_prefix, name))
            .spawn(move || worker.run(receiver));
        if let Err(e) = spawned {
            error!(bus = %name, "Failed to start delivery worker: {}", e);
        }

        Self {
            shared,
            sender,
            config,
            connection: Mutex::new(()),
            connector: RwLock::new(None),
        }
    }

    /// Name given to this bus instance
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Get the current configuration
    pub fn config(&self) -> &MessageBusConfig {
        &self.config
    }

    /// Install the factory used by `set_remote` and `shut_down_remote_server`
    pub fn set_connector(&self, connector: Arc<dyn RemoteConnector>) {
        *self.connector.write() = Some(connector);
    }

    /// Register a listener on each of `channels`.
    ///
    /// A listener already registered on a channel is left as is and the
    /// attempt is logged.
    pub fn register_listener<H: ListenerHandle>(&self, listener: &H, channels: &[MessageChannel]) {
        let weak = listener.downgrade_listener();
        for &channel in channels {
            let registration = ListenerRegistration::new(weak.clone());
            if self.shared.registry.insert(channel, registration) {
                debug!(bus = %self.name(), %channel, "Listener registered");
            } else {
                warn!(
                    bus = %self.name(),
                    %channel,
                    "An attempt was made to install a duplicate listener"
                );
            }
        }
    }

    /// Remove a listener from each of `channels`
    pub fn unregister_listener<H: ListenerHandle>(
        &self,
        listener: &H,
        channels: &[MessageChannel],
    ) {
        let key = ListenerKey::of(&listener.downgrade_listener());
        for &channel in channels {
            let removed = self.shared.registry.remove(channel, key);
            if removed > 0 {
                debug!(bus = %self.name(), %channel, "Listener unregistered");
            }
        }
    }

    /// Number of live listeners on `channel`
    pub fn listener_count(&self, channel: MessageChannel) -> usize {
        self.shared.registry.live_count(channel)
    }

    /// Number of registrations stored for `channel`, including ones whose
    /// listener has been dropped but not yet pruned
    pub fn registration_count(&self, channel: MessageChannel) -> usize {
        self.shared.registry.stored_count(channel)
    }

    /// Post a message. Returns immediately; delivery happens on the worker.
    pub fn fire_event(&self, message: Message) {
        if self.sender.send(WorkItem::Deliver(message)).is_err() {
            warn!(bus = %self.name(), "Delivery worker is not running, message dropped");
        }
    }

    /// Wait until every message fired before this call has been processed.
    ///
    /// Must not be called from a listener callback; it would wait on itself
    /// until `timeout`. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let (done, wait) = std::sync::mpsc::sync_channel(1);
        if self.sender.send(WorkItem::Barrier(done)).is_err() {
            return false;
        }
        wait.recv_timeout(timeout).is_ok()
    }

    /// Inbox for a transport bound to this bus
    pub fn inbox(&self) -> RemoteInbox {
        RemoteInbox {
            bus: self.name().to_string(),
            sender: Some(self.sender.downgrade()),
        }
    }

    /// Bind the bus to a remote server, replacing any existing binding.
    ///
    /// Fails if the transport cannot connect or the server does not complete
    /// the handshake within the configured timeout. On failure the bus is
    /// left in local mode.
    pub fn set_remote(&self, host: &str, port: u16, credential: &Credential) -> Result<()> {
        let _guard = self.connection.lock();
        self.disconnect_from_server();
        self.connect_to_server(host, port, credential)
    }

    /// Return to purely local delivery
    pub fn set_local(&self) {
        let _guard = self.connection.lock();
        self.disconnect_from_server();
    }

    /// Whether a transport is currently bound
    pub fn is_remote(&self) -> bool {
        self.shared.transport.read().is_some()
    }

    /// Location of the remote data store, if a transport is bound
    pub fn remote_data_base_path(&self) -> Option<String> {
        self.shared
            .bound_transport()
            .and_then(|t| t.remote_data_location())
    }

    /// Kind of the remote data store, if a transport is bound
    pub fn remote_data_store_type(&self) -> Option<DataStoreType> {
        self.shared
            .bound_transport()
            .and_then(|t| t.remote_data_kind())
    }

    /// Issue a shutdown request to a remote server.
    ///
    /// Uses a throwaway transport; the bus binding is not touched.
    pub fn shut_down_remote_server(
        &self,
        host: &str,
        port: u16,
        credential: &Credential,
    ) -> Result<()> {
        let endpoint = self.checked_endpoint(host, port)?;
        let connector = self.connector()?;

        let client = connector.open(&endpoint, self.name(), RemoteInbox::detached());
        client.connect(credential)?;
        let sent = client.send_shutdown_request();
        client.disconnect();
        sent?;

        info!(bus = %self.name(), %endpoint, "Shutdown request sent");
        Ok(())
    }

    fn connector(&self) -> Result<Arc<dyn RemoteConnector>> {
        self.connector.read().clone().ok_or_else(|| {
            ConnectionError::NoConnector {
                bus: self.name().to_string(),
            }
            .into()
        })
    }

    fn checked_endpoint(&self, host: &str, port: u16) -> Result<Endpoint> {
        Endpoint::new(host, port).map_err(|e| {
            error!(bus = %self.name(), host, port, "Rejected remote endpoint: {}", e);
            e.into()
        })
    }

    fn disconnect_from_server(&self) {
        let previous = self.shared.transport.write().take();
        if let Some(transport) = previous {
            transport.disconnect();
            debug!(bus = %self.name(), "Remote transport disconnected");
        }
    }

    fn connect_to_server(&self, host: &str, port: u16, credential: &Credential) -> Result<()> {
        let endpoint = self.checked_endpoint(host, port)?;
        let connector = self.connector()?;

        let transport = connector.open(&endpoint, self.name(), self.inbox());
        if let Err(e) = transport.connect(credential) {
            warn!(bus = %self.name(), %endpoint, "Failed to connect: {}", e);
            return Err(e.into());
        }

        // The connection only counts once the server has told us about its
        // data store.
        let timeout = self.config.handshake_timeout;
        if !transport.identity().wait_complete(timeout) {
            transport.disconnect();
            warn!(
                bus = %self.name(),
                %endpoint,
                "Did not receive a valid response from the server"
            );
            return Err(ConnectionError::HandshakeTimeout {
                timeout_ms: millis(timeout),
            }
            .into());
        }

        *self.shared.transport.write() = Some(transport);
        info!(bus = %self.name(), %endpoint, "Connected to remote message server");
        Ok(())
    }
}

impl Drop for MessageBus {
    fn drop(&mut self) {
        self.disconnect_from_server();
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("name", &self.shared.name)
            .field("remote", &self.is_remote())
            .field("config", &self.config)
            .finish()
    }
}
