//! Remote transport interfaces.
//!
//! The bus never speaks a wire protocol itself. It asks a [`RemoteConnector`]
//! for a [`RemoteTransport`] bound to an [`Endpoint`] and drives it through
//! connect, handshake, forwarding and disconnect.

use std::sync::Arc;

use super::identity::{DataStoreType, RemoteIdentity};
use crate::error::ConnectionError;
use crate::message::Message;
use crate::message_bus::RemoteInbox;

/// Address of a remote message server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint, rejecting an empty host or a zero port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConnectionError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConnectionError::InvalidParameters {
                reason: "remote host must not be empty".to_string(),
            });
        }
        if port == 0 {
            return Err(ConnectionError::InvalidParameters {
                reason: "remote port must be positive".to_string(),
            });
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Secret presented to the remote server when connecting
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Connection to a remote message server
///
/// Methods take `&self`; implementations use interior mutability so the bus
/// worker can forward while the connection lock is held elsewhere.
pub trait RemoteTransport: Send + Sync {
    /// Authenticate and open the connection
    fn connect(&self, credential: &Credential) -> Result<(), ConnectionError>;

    /// Close the connection. Must be idempotent.
    fn disconnect(&self);

    /// Forward a locally originated message to the peer
    fn send_message(&self, message: &Message) -> Result<(), ConnectionError>;

    /// Ask the peer to shut itself down
    fn send_shutdown_request(&self) -> Result<(), ConnectionError>;

    /// Handshake metadata recorded by this transport
    fn identity(&self) -> &RemoteIdentity;

    /// Whether the peer is still reachable through this transport
    fn is_connected(&self) -> bool {
        true
    }

    /// Location of the remote data store, once the peer has reported it
    fn remote_data_location(&self) -> Option<String> {
        self.identity().data_base_path()
    }

    /// Kind of the remote data store, once the peer has reported it
    fn remote_data_kind(&self) -> Option<DataStoreType> {
        self.identity().store_type()
    }
}

/// Factory for transports
pub trait RemoteConnector: Send + Sync {
    /// Create an unconnected transport for `endpoint`.
    ///
    /// Messages received from the peer must be handed to `inbox`.
    fn open(&self, endpoint: &Endpoint, bus_name: &str, inbox: RemoteInbox)
        -> Arc<dyn RemoteTransport>;
}
