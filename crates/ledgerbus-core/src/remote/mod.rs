//! Remote bridging: transports, connectors and handshake metadata.

mod identity;
mod transport;

pub use identity::{DataStoreType, RemoteIdentity};
pub use transport::{Credential, Endpoint, RemoteConnector, RemoteTransport};
