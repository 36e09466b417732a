//! Channel to listener registry.
//!
//! Each channel maps to a copy-on-write list of registrations. Delivery takes
//! a cheap snapshot of the list and releases the lock before any callback
//! runs, so listeners may register or unregister from inside a callback.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::listener::{ListenerKey, ListenerRegistration};
use crate::message::MessageChannel;

type ListenerSet = Arc<Vec<ListenerRegistration>>;

#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    channels: RwLock<HashMap<MessageChannel, ListenerSet>>,
}

impl ListenerRegistry {
    /// Add a registration unless the listener is already present.
    ///
    /// Dead registrations found during the duplicate scan are dropped.
    /// Returns false for a duplicate.
    pub(crate) fn insert(&self, channel: MessageChannel, registration: ListenerRegistration) -> bool {
        let mut channels = self.channels.write();
        let set = Arc::make_mut(channels.entry(channel).or_default());
        set.retain(ListenerRegistration::is_alive);

        if set.iter().any(|r| r.key() == registration.key()) {
            return false;
        }
        set.push(registration);
        true
    }

    /// Remove every registration of `key` on `channel`, plus any dead ones.
    ///
    /// Returns the number of registrations of `key` that were removed.
    pub(crate) fn remove(&self, channel: MessageChannel, key: ListenerKey) -> usize {
        let mut channels = self.channels.write();
        let Some(set) = channels.get_mut(&channel) else {
            return 0;
        };
        let set = Arc::make_mut(set);
        let mut removed = 0;
        set.retain(|r| {
            if r.key() == key {
                removed += 1;
                false
            } else {
                r.is_alive()
            }
        });
        removed
    }

    /// Current registrations for `channel`
    pub(crate) fn snapshot(&self, channel: MessageChannel) -> Option<ListenerSet> {
        self.channels.read().get(&channel).cloned()
    }

    /// Drop dead registrations on `channel`, returning how many were removed
    pub(crate) fn prune(&self, channel: MessageChannel) -> usize {
        let mut channels = self.channels.write();
        let Some(set) = channels.get_mut(&channel) else {
            return 0;
        };
        if set.iter().all(ListenerRegistration::is_alive) {
            return 0;
        }
        let set = Arc::make_mut(set);
        let before = set.len();
        set.retain(ListenerRegistration::is_alive);
        before - set.len()
    }

    /// Number of live registrations on `channel`
    pub(crate) fn live_count(&self, channel: MessageChannel) -> usize {
        self.channels
            .read()
            .get(&channel)
            .map_or(0, |set| set.iter().filter(|r| r.is_alive()).count())
    }

    /// Number of stored registrations on `channel`, dead ones included
    pub(crate) fn stored_count(&self, channel: MessageChannel) -> usize {
        self.channels.read().get(&channel).map_or(0, |set| set.len())
    }
}
