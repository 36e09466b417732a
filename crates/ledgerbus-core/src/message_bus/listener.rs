//! Message listener interface
//!
//! Defines the listener trait and the non-owning registrations the bus keeps
//! for each subscribed listener.

use std::sync::{Arc, Weak};

use crate::message::Message;

/// Listener trait for bus messages
///
/// Implement this trait to receive messages posted on the channels the
/// listener was registered for. Callbacks run on the bus worker thread.
pub trait MessageListener: Send + Sync {
    /// Called for every message delivered to this listener
    fn message_posted(&self, message: &Message);
}

impl<F> MessageListener for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn message_posted(&self, message: &Message) {
        self(message)
    }
}

/// Anything the bus can hold a weak reference to.
///
/// Implemented for `Arc<L>` of a concrete listener and for
/// `Arc<dyn MessageListener>`.
pub trait ListenerHandle {
    /// Downgrade to the non-owning reference stored by the bus
    fn downgrade_listener(&self) -> Weak<dyn MessageListener>;
}

impl<L: MessageListener + 'static> ListenerHandle for Arc<L> {
    fn downgrade_listener(&self) -> Weak<dyn MessageListener> {
        let weak: Weak<L> = Arc::downgrade(self);
        weak
    }
}

impl ListenerHandle for Arc<dyn MessageListener> {
    fn downgrade_listener(&self) -> Weak<dyn MessageListener> {
        Arc::downgrade(self)
    }
}

/// Identity of a listener, derived from its allocation address.
///
/// The address stays reserved while any registration still holds a weak
/// reference to it, so keys never collide with a live registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ListenerKey(usize);

impl ListenerKey {
    pub(crate) fn of(weak: &Weak<dyn MessageListener>) -> Self {
        Self(Weak::as_ptr(weak) as *const () as usize)
    }
}

/// Non-owning channel registration
#[derive(Clone)]
pub(crate) struct ListenerRegistration {
    key: ListenerKey,
    listener: Weak<dyn MessageListener>,
}

impl ListenerRegistration {
    pub(crate) fn new(listener: Weak<dyn MessageListener>) -> Self {
        Self {
            key: ListenerKey::of(&listener),
            listener,
        }
    }

    pub(crate) fn key(&self) -> ListenerKey {
        self.key
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn MessageListener>> {
        self.listener.upgrade()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.listener.strong_count() > 0
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}
