//! Remote identity metadata exchanged during the handshake.
//!
//! A transport is only usable once the peer has told us where its data store
//! lives and what kind of store it is. Transports record that metadata in a
//! [`RemoteIdentity`]; the bus waits on it with a deadline.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Kind of data store owned by the remote process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStoreType {
    /// Compressed single-file object store.
    BinaryXStream,
    /// Plain XML file.
    Xml,
    /// Embedded H2 SQL database.
    H2Database,
    /// Embedded HSQL database.
    HsqlDatabase,
}

impl DataStoreType {
    /// Whether a server can share this store with remote clients
    pub fn is_remote_capable(&self) -> bool {
        matches!(self, DataStoreType::H2Database | DataStoreType::HsqlDatabase)
    }
}

impl std::fmt::Display for DataStoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BinaryXStream => write!(f, "Binary XStream"),
            Self::Xml => write!(f, "XML"),
            Self::H2Database => write!(f, "H2 Database"),
            Self::HsqlDatabase => write!(f, "HSQL Database"),
        }
    }
}

#[derive(Debug, Default)]
struct IdentityState {
    data_base_path: Option<String>,
    store_type: Option<DataStoreType>,
}

impl IdentityState {
    fn is_complete(&self) -> bool {
        self.data_base_path.is_some() && self.store_type.is_some()
    }
}

/// Handshake metadata reported by a remote peer
#[derive(Debug, Default)]
pub struct RemoteIdentity {
    state: Mutex<IdentityState>,
    ready: Condvar,
}

impl RemoteIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the remote data store location. Empty paths are ignored.
    pub fn set_data_base_path(&self, path: impl Into<String>) {
        let path = path.into();
        if path.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        state.data_base_path = Some(path);
        self.ready.notify_all();
    }

    /// Record the remote data store kind
    pub fn set_store_type(&self, store_type: DataStoreType) {
        let mut state = self.state.lock();
        state.store_type = Some(store_type);
        self.ready.notify_all();
    }

    pub fn data_base_path(&self) -> Option<String> {
        self.state.lock().data_base_path.clone()
    }

    pub fn store_type(&self) -> Option<DataStoreType> {
        self.state.lock().store_type
    }

    /// Both pieces of metadata have arrived
    pub fn is_complete(&self) -> bool {
        self.state.lock().is_complete()
    }

    /// Forget any recorded metadata
    pub fn clear(&self) {
        let mut state = self.state.lock();
        *state = IdentityState::default();
    }

    /// Block until both pieces of metadata are present or `timeout` elapses.
    ///
    /// Returns true if the identity is complete.
    pub fn wait_complete(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while !state.is_complete() {
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut state, deadline).timed_out() {
                        return state.is_complete();
                    }
                }
                // Too far out to represent, so wait without a limit.
                None => self.ready.wait(&mut state),
            }
        }
        true
    }
}
