//! Shared test doubles for bus integration tests

#![allow(dead_code)]

use ledgerbus_core::{
    ConnectionError, Credential, DataStoreType, Endpoint, Message, MessageListener, RemoteConnector,
    RemoteIdentity, RemoteInbox, RemoteTransport,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(5);

/// Listener forwarding every message into a channel
pub struct Recorder {
    tx: Mutex<Sender<Message>>,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, Receiver<Message>) {
        let (tx, rx) = channel();
        (Arc::new(Self { tx: Mutex::new(tx) }), rx)
    }
}

impl MessageListener for Recorder {
    fn message_posted(&self, message: &Message) {
        let _ = self.tx.lock().send(message.clone());
    }
}

/// How the mock peer behaves on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBehavior {
    /// Accept and report identity right away.
    Answer,
    /// Accept but never report identity.
    Silent,
    /// Refuse the connection.
    Refuse,
}

/// Transport double recording every call
pub struct MockTransport {
    pub endpoint: Endpoint,
    pub inbox: RemoteInbox,
    behavior: PeerBehavior,
    identity: RemoteIdentity,
    pub sent: Mutex<Vec<Message>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub shutdowns: AtomicUsize,
    /// Once set, the peer is gone and sends fail.
    pub lost: AtomicBool,
}

impl RemoteTransport for MockTransport {
    fn connect(&self, _credential: &Credential) -> Result<(), ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            PeerBehavior::Refuse => Err(ConnectionError::Refused {
                host: self.endpoint.host().to_string(),
                port: self.endpoint.port(),
            }),
            PeerBehavior::Silent => Ok(()),
            PeerBehavior::Answer => {
                self.identity.set_data_base_path("/srv/books.h2");
                self.identity.set_store_type(DataStoreType::H2Database);
                Ok(())
            }
        }
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn send_message(&self, message: &Message) -> Result<(), ConnectionError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(ConnectionError::ConnectionLost {
                reason: "peer went away".to_string(),
            });
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn send_shutdown_request(&self) -> Result<(), ConnectionError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn identity(&self) -> &RemoteIdentity {
        &self.identity
    }

    fn is_connected(&self) -> bool {
        !self.lost.load(Ordering::SeqCst)
    }
}

/// Connector handing out mock transports and remembering them
pub struct MockConnector {
    behavior: PeerBehavior,
    pub opened: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockConnector {
    pub fn new(behavior: PeerBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> Arc<MockTransport> {
        self.opened.lock().last().cloned().expect("no transport opened")
    }
}

impl RemoteConnector for MockConnector {
    fn open(
        &self,
        endpoint: &Endpoint,
        _bus_name: &str,
        inbox: RemoteInbox,
    ) -> Arc<dyn RemoteTransport> {
        let transport = Arc::new(MockTransport {
            endpoint: endpoint.clone(),
            inbox,
            behavior: self.behavior,
            identity: RemoteIdentity::new(),
            sent: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            lost: AtomicBool::new(false),
        });
        self.opened.lock().push(transport.clone());
        transport
    }
}
