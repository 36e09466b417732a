//! # Message Bus Module
//!
//! Thread safe publish/subscribe bus with optional remote bridging.
//!
//! ## Overview
//!
//! - Listeners register per channel and are held by weak reference; dropping
//!   the last strong reference unsubscribes them implicitly
//! - `fire_event` never blocks; one worker per bus delivers messages in the
//!   order they were fired
//! - A bus can be bound to one remote transport at a time. Local, non-system
//!   messages are forwarded to it; messages that came from the remote side
//!   are never sent back
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledgerbus_core::message_bus::{message_bus, MessageListener};
//! use ledgerbus_core::message::{ChannelEvent, Message, MessageChannel};
//!
//! let listener = Arc::new(|message: &Message| {
//!     println!("Posted: {}", message);
//! });
//! message_bus().register_listener(&listener, &[MessageChannel::Account]);
//!
//! message_bus().fire_event(Message::for_event(ChannelEvent::AccountAdd));
//! ```

mod bus;
mod instances;
mod listener;
mod registry;

pub use bus::{MessageBus, MessageBusConfig, RemoteInbox, DEFAULT_HANDSHAKE_TIMEOUT};
pub use instances::{init_message_bus, message_bus, message_bus_named, DEFAULT_BUS_NAME};
pub use listener::{ListenerHandle, MessageListener};
