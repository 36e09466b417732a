//! In-process message hub
//!
//! The hub plays the part of the remote message server for buses living in
//! the same process. It owns the handshake metadata of the data store,
//! authenticates clients, and relays every message it receives from one
//! client to all the others.
//!
//! Hubs are bound to an [`Endpoint`] in a process-wide table so transports
//! can find them by host and port.

mod transport;

pub use transport::{HubConnector, HubTransport};

use chrono::{DateTime, Utc};
use ledgerbus_core::{
    ChannelEvent, ConnectionError, Credential, DataStoreType, Endpoint, Message, RemoteInbox,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while binding a hub
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Another hub already serves this endpoint
    #[error("Endpoint {endpoint} is already bound")]
    EndpointInUse {
        /// The contested endpoint.
        endpoint: String,
    },

    /// Host or port rejected
    #[error(transparent)]
    InvalidEndpoint(#[from] ConnectionError),
}

/// Configuration for a message hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Credential clients must present.
    pub password: Credential,
    /// Location of the data store announced during the handshake.
    pub data_base_path: String,
    /// Kind of the data store announced during the handshake.
    pub store_type: DataStoreType,
    /// Whether to answer the handshake at all. Disabled only to simulate a
    /// peer that never completes it.
    pub answer_handshake: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            password: Credential::default(),
            data_base_path: String::new(),
            store_type: DataStoreType::H2Database,
            answer_handshake: true,
        }
    }
}

/// Identifier of a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client({})", &self.0.to_string()[..8])
    }
}

/// Snapshot of a connected client
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: ClientId,
    /// Name of the bus on the client side.
    pub bus_name: String,
    pub connected_at: DateTime<Utc>,
}

struct HubClient {
    info: ClientInfo,
    inbox: RemoteInbox,
}

/// Metadata a hub hands to a client that passed authentication
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) id: ClientId,
    pub(crate) handshake: Option<(String, DataStoreType)>,
}

static HUBS: OnceLock<Mutex<HashMap<Endpoint, Arc<MessageHub>>>> = OnceLock::new();

fn hubs() -> &'static Mutex<HashMap<Endpoint, Arc<MessageHub>>> {
    HUBS.get_or_init(Default::default)
}

/// Relay between buses connected to the same endpoint
pub struct MessageHub {
    endpoint: Endpoint,
    config: HubConfig,
    clients: RwLock<HashMap<ClientId, HubClient>>,
    running: AtomicBool,
}

impl MessageHub {
    /// Start a hub on `host:port`
    pub fn bind(host: &str, port: u16, config: HubConfig) -> Result<Arc<Self>, HubError> {
        let endpoint = Endpoint::new(host, port)?;
        let mut table = hubs().lock();
        if table.contains_key(&endpoint) {
            return Err(HubError::EndpointInUse {
                endpoint: endpoint.to_string(),
            });
        }

        let hub = Arc::new(Self {
            endpoint: endpoint.clone(),
            config,
            clients: RwLock::new(HashMap::new()),
            running: AtomicBool::new(true),
        });
        table.insert(endpoint, hub.clone());
        tracing::info!("Message hub listening on {}", hub.endpoint);
        Ok(hub)
    }

    /// Find the hub serving `endpoint`
    pub fn lookup(endpoint: &Endpoint) -> Option<Arc<Self>> {
        hubs().lock().get(endpoint).cloned()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Currently connected clients
    pub fn clients(&self) -> Vec<ClientInfo> {
        self.clients
            .read()
            .values()
            .map(|c| c.info.clone())
            .collect()
    }

    /// Authenticate a client and start relaying to it
    pub(crate) fn attach(
        &self,
        credential: &Credential,
        bus_name: &str,
        inbox: RemoteInbox,
    ) -> Result<Session, ConnectionError> {
        if !self.is_running() {
            return Err(ConnectionError::Refused {
                host: self.endpoint.host().to_string(),
                port: self.endpoint.port(),
            });
        }
        if credential != &self.config.password {
            tracing::warn!("Rejected client for bus '{}' on {}", bus_name, self.endpoint);
            return Err(ConnectionError::AuthenticationFailed {
                host: self.endpoint.host().to_string(),
                port: self.endpoint.port(),
            });
        }

        let id = ClientId::new();
        let client = HubClient {
            info: ClientInfo {
                id,
                bus_name: bus_name.to_string(),
                connected_at: Utc::now(),
            },
            inbox,
        };
        self.clients.write().insert(id, client);
        tracing::debug!("{} attached for bus '{}'", id, bus_name);

        let handshake = self.config.answer_handshake.then(|| {
            (
                self.config.data_base_path.clone(),
                self.config.store_type,
            )
        });
        Ok(Session { id, handshake })
    }

    /// Stop relaying to a client
    pub(crate) fn detach(&self, id: ClientId) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!("{} detached", id);
        }
    }

    /// Send `message` to every client except its sender.
    ///
    /// Returns the number of clients that accepted it.
    pub(crate) fn relay(&self, from: ClientId, message: &Message) -> usize {
        let clients = self.clients.read();
        clients
            .iter()
            .filter(|(id, _)| **id != from)
            .filter(|(_, client)| client.inbox.deliver(message.clone()))
            .count()
    }

    /// Stop the hub, release its endpoint and tell every client.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        {
            let mut table = hubs().lock();
            let bound_here = table
                .get(&self.endpoint)
                .is_some_and(|hub| std::ptr::eq(Arc::as_ptr(hub), self));
            if bound_here {
                table.remove(&self.endpoint);
            }
        }

        let clients: Vec<HubClient> = self.clients.write().drain().map(|(_, c)| c).collect();
        for client in &clients {
            client
                .inbox
                .deliver(Message::for_event(ChannelEvent::RemoteShutdown));
        }
        tracing::info!(
            "Message hub on {} stopped, {} client(s) notified",
            self.endpoint,
            clients.len()
        );
    }
}

impl std::fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHub")
            .field("endpoint", &self.endpoint)
            .field("clients", &self.client_count())
            .field("running", &self.is_running())
            .finish()
    }
}
