//! Message channels.
//!
//! Channels partition traffic on the bus. Listeners subscribe per channel and
//! only receive messages posted to the channels they registered for.

use serde::{Deserialize, Serialize};

/// Topic partition used to route messages to interested listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageChannel {
    /// Account structure changes.
    Account,
    /// Budget changes.
    Budget,
    /// Commodity, currency and security changes.
    Commodity,
    /// Engine configuration changes.
    Config,
    /// Reminder changes.
    Reminder,
    /// Process-internal events; never forwarded to a remote peer.
    System,
    /// Transaction changes.
    Transaction,
}

impl MessageChannel {
    /// Every channel, in declaration order.
    pub const ALL: [MessageChannel; 7] = [
        MessageChannel::Account,
        MessageChannel::Budget,
        MessageChannel::Commodity,
        MessageChannel::Config,
        MessageChannel::Reminder,
        MessageChannel::System,
        MessageChannel::Transaction,
    ];

    /// Whether messages on this channel may leave the process
    pub fn is_forwardable(&self) -> bool {
        !matches!(self, MessageChannel::System)
    }
}

impl std::fmt::Display for MessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageChannel::Account => "ACCOUNT",
            MessageChannel::Budget => "BUDGET",
            MessageChannel::Commodity => "COMMODITY",
            MessageChannel::Config => "CONFIG",
            MessageChannel::Reminder => "REMINDER",
            MessageChannel::System => "SYSTEM",
            MessageChannel::Transaction => "TRANSACTION",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_system_is_local() {
        for channel in MessageChannel::ALL {
            assert_eq!(channel.is_forwardable(), channel != MessageChannel::System);
        }
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&MessageChannel::Transaction).unwrap();
        assert_eq!(json, "\"TRANSACTION\"");
        assert_eq!(MessageChannel::Transaction.to_string(), "TRANSACTION");
    }
}
