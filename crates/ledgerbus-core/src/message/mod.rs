//! # Messages
//!
//! A [`Message`] is an immutable value posted on a [`MessageChannel`]. It
//! carries the [`ChannelEvent`] kind, an origin flag telling whether it
//! arrived from a remote peer, and an opaque property payload.

mod channel;
mod event;

pub use channel::MessageChannel;
pub use event::{ChannelEvent, MessageProperty};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property payload of a message
pub type Payload = BTreeMap<MessageProperty, serde_json::Value>;

/// Immutable message posted on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    channel: MessageChannel,
    event: ChannelEvent,
    /// Set once the message has crossed from a remote peer.
    #[serde(skip)]
    remote: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    payload: Payload,
}

impl Message {
    /// Create a local message on an explicit channel
    pub fn new(channel: MessageChannel, event: ChannelEvent) -> Self {
        Self {
            channel,
            event,
            remote: false,
            payload: Payload::new(),
        }
    }

    /// Create a local message on the event's default channel
    pub fn for_event(event: ChannelEvent) -> Self {
        Self::new(event.default_channel(), event)
    }

    /// Attach a payload property
    pub fn with_property(
        mut self,
        property: MessageProperty,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.payload.insert(property, value.into());
        self
    }

    /// Mark this message as having arrived from a remote peer
    pub fn into_remote(mut self) -> Self {
        self.remote = true;
        self
    }

    pub fn channel(&self) -> MessageChannel {
        self.channel
    }

    pub fn event(&self) -> ChannelEvent {
        self.event
    }

    /// Whether the message originated on a remote peer
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Get a payload property
    pub fn property(&self, property: MessageProperty) -> Option<&serde_json::Value> {
        self.payload.get(&property)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether the bus should hand this message to a bound transport.
    ///
    /// Remote messages are never re-sent and system messages never leave
    /// the process.
    pub fn should_forward(&self) -> bool {
        !self.remote && self.channel.is_forwardable()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel, self.event)?;
        if self.remote {
            write!(f, " (remote)")?;
        }
        Ok(())
    }
}
