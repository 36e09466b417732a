//! Bus-side transport for the in-process hub.

use ledgerbus_core::{
    ConnectionError, Credential, DataStoreType, Endpoint, Message, RemoteConnector,
    RemoteIdentity, RemoteInbox, RemoteTransport,
};
use parking_lot::Mutex;
use std::sync::Arc;

use super::{ClientId, MessageHub};

/// Transport connecting a bus to a [`MessageHub`]
pub struct HubTransport {
    endpoint: Endpoint,
    bus_name: String,
    inbox: RemoteInbox,
    identity: RemoteIdentity,
    session: Mutex<Option<(Arc<MessageHub>, ClientId)>>,
}

impl HubTransport {
    pub fn new(endpoint: Endpoint, bus_name: impl Into<String>, inbox: RemoteInbox) -> Self {
        Self {
            endpoint,
            bus_name: bus_name.into(),
            inbox,
            identity: RemoteIdentity::new(),
            session: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Current session. A session on a stopped hub is dropped together with
    /// its handshake metadata.
    fn active_session(&self) -> Result<(Arc<MessageHub>, ClientId), ConnectionError> {
        let mut session = self.session.lock();
        let stopped = session
            .as_ref()
            .is_some_and(|(hub, _)| !hub.is_running());
        if stopped {
            session.take();
            self.identity.clear();
            return Err(ConnectionError::ConnectionLost {
                reason: format!("hub on {} stopped", self.endpoint),
            });
        }
        session.clone().ok_or(ConnectionError::NotConnected)
    }
}

impl RemoteTransport for HubTransport {
    fn connect(&self, credential: &Credential) -> Result<(), ConnectionError> {
        let hub = MessageHub::lookup(&self.endpoint).ok_or_else(|| ConnectionError::Refused {
            host: self.endpoint.host().to_string(),
            port: self.endpoint.port(),
        })?;

        let session = hub.attach(credential, &self.bus_name, self.inbox.clone())?;
        if let Some((path, store_type)) = session.handshake {
            self.identity.set_data_base_path(path);
            self.identity.set_store_type(store_type);
        }

        let previous = self.session.lock().replace((hub, session.id));
        if let Some((old_hub, old_id)) = previous {
            old_hub.detach(old_id);
        }
        tracing::debug!("Bus '{}' attached to hub on {}", self.bus_name, self.endpoint);
        Ok(())
    }

    fn disconnect(&self) {
        let session = self.session.lock().take();
        if let Some((hub, id)) = session {
            hub.detach(id);
            tracing::debug!("Bus '{}' detached from hub on {}", self.bus_name, self.endpoint);
        }
        self.identity.clear();
    }

    fn send_message(&self, message: &Message) -> Result<(), ConnectionError> {
        let (hub, id) = self.active_session()?;
        let delivered = hub.relay(id, message);
        tracing::trace!("Relayed {} to {} client(s)", message, delivered);
        Ok(())
    }

    fn send_shutdown_request(&self) -> Result<(), ConnectionError> {
        let (hub, _) = self.active_session()?;
        hub.shutdown();
        Ok(())
    }

    fn identity(&self) -> &RemoteIdentity {
        &self.identity
    }

    fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|(hub, _)| hub.is_running())
    }

    fn remote_data_location(&self) -> Option<String> {
        self.active_session()
            .ok()
            .and_then(|_| self.identity.data_base_path())
    }

    fn remote_data_kind(&self) -> Option<DataStoreType> {
        self.active_session()
            .ok()
            .and_then(|_| self.identity.store_type())
    }
}

/// Connector producing [`HubTransport`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct HubConnector;

impl RemoteConnector for HubConnector {
    fn open(
        &self,
        endpoint: &Endpoint,
        bus_name: &str,
        inbox: RemoteInbox,
    ) -> Arc<dyn RemoteTransport> {
        Arc::new(HubTransport::new(endpoint.clone(), bus_name, inbox))
    }
}
