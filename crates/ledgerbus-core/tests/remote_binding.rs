//! Tests for binding a bus to a remote transport

mod common;

use common::{MockConnector, PeerBehavior, Recorder, WAIT};
use ledgerbus_core::{
    ChannelEvent, Credential, DataStoreType, Message, MessageBus, MessageBusConfig, MessageChannel,
};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

fn bus_with(name: &str, behavior: PeerBehavior, timeout: Duration) -> (MessageBus, std::sync::Arc<MockConnector>) {
    let bus = MessageBus::with_config(
        name,
        MessageBusConfig {
            handshake_timeout: timeout,
            ..Default::default()
        },
    );
    let connector = MockConnector::new(behavior);
    bus.set_connector(connector.clone());
    (bus, connector)
}

#[test]
fn test_local_then_remote_end_to_end() {
    let (bus, connector) = bus_with("e2e", PeerBehavior::Answer, Duration::from_secs(5));
    let (first, first_rx) = Recorder::new();
    let (second, second_rx) = Recorder::new();
    bus.register_listener(&first, &[MessageChannel::Account]);
    bus.register_listener(&second, &[MessageChannel::Account]);

    // Local only: both listeners, no transport involved.
    bus.fire_event(Message::for_event(ChannelEvent::AccountAdd));
    assert!(bus.wait_idle(WAIT));
    assert_eq!(first_rx.try_iter().count(), 1);
    assert_eq!(second_rx.try_iter().count(), 1);
    assert!(connector.opened.lock().is_empty());

    bus.set_remote("host", 1234, &Credential::from("pw")).unwrap();
    assert!(bus.is_remote());
    assert_eq!(bus.remote_data_base_path().as_deref(), Some("/srv/books.h2"));
    assert_eq!(bus.remote_data_store_type(), Some(DataStoreType::H2Database));

    bus.fire_event(Message::for_event(ChannelEvent::AccountAdd));
    assert!(bus.wait_idle(WAIT));
    assert_eq!(first_rx.try_iter().count(), 1);
    assert_eq!(second_rx.try_iter().count(), 1);

    let transport = connector.last();
    assert_eq!(transport.endpoint.to_string(), "host:1234");
    assert_eq!(transport.sent.lock().len(), 1);
}

#[test]
fn test_remote_messages_are_not_echoed() {
    let (bus, connector) = bus_with("no-echo", PeerBehavior::Answer, Duration::from_secs(5));
    let (listener, rx) = Recorder::new();
    bus.register_listener(&listener, &[MessageChannel::Transaction]);
    bus.set_remote("host", 1234, &Credential::default()).unwrap();

    let transport = connector.last();
    assert!(transport.inbox.deliver(Message::for_event(ChannelEvent::TransactionAdd)));
    bus.fire_event(Message::for_event(ChannelEvent::TransactionRemove).into_remote());
    assert!(bus.wait_idle(WAIT));

    let received: Vec<_> = rx.try_iter().collect();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|m| m.is_remote()));
    assert!(transport.sent.lock().is_empty());
}

#[test]
fn test_system_messages_stay_local() {
    let (bus, connector) = bus_with("system", PeerBehavior::Answer, Duration::from_secs(5));
    let (listener, rx) = Recorder::new();
    bus.register_listener(&listener, &[MessageChannel::System]);
    bus.set_remote("host", 1234, &Credential::default()).unwrap();

    bus.fire_event(Message::for_event(ChannelEvent::FileClosing));
    assert!(bus.wait_idle(WAIT));

    assert_eq!(rx.try_iter().count(), 1);
    assert!(connector.last().sent.lock().is_empty());
}

#[test]
fn test_forwarding_without_local_listeners() {
    let (bus, connector) = bus_with("forward-only", PeerBehavior::Answer, Duration::from_secs(5));
    bus.set_remote("host", 1234, &Credential::default()).unwrap();

    bus.fire_event(Message::for_event(ChannelEvent::BudgetAdd));
    assert!(bus.wait_idle(WAIT));
    assert_eq!(connector.last().sent.lock().len(), 1);
}

#[test]
fn test_handshake_timeout() {
    let timeout = Duration::from_millis(300);
    let (bus, connector) = bus_with("timeout", PeerBehavior::Silent, timeout);

    let start = Instant::now();
    let err = bus
        .set_remote("host", 1234, &Credential::default())
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout());
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_secs(2));
    assert!(!bus.is_remote());
    assert_eq!(bus.remote_data_base_path(), None);
    assert_eq!(connector.last().disconnects.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lost_connection_returns_bus_to_local() {
    let (bus, connector) = bus_with("lost", PeerBehavior::Answer, Duration::from_secs(5));
    let (listener, rx) = Recorder::new();
    bus.register_listener(&listener, &[MessageChannel::Account]);
    bus.set_remote("host", 1234, &Credential::default()).unwrap();
    let transport = connector.last();

    transport.lost.store(true, Ordering::SeqCst);
    bus.fire_event(Message::for_event(ChannelEvent::AccountAdd));
    assert!(bus.wait_idle(WAIT));

    assert_eq!(rx.try_iter().count(), 1);
    assert!(!bus.is_remote());
    assert_eq!(bus.remote_data_base_path(), None);
    assert_eq!(bus.remote_data_store_type(), None);
    assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);

    // Later messages stay local without touching the dead transport.
    bus.fire_event(Message::for_event(ChannelEvent::AccountModify));
    assert!(bus.wait_idle(WAIT));
    assert!(transport.sent.lock().is_empty());
}

#[test]
fn test_lost_connection_keeps_newer_binding() {
    let (bus, connector) = bus_with("lost-rebind", PeerBehavior::Answer, Duration::from_secs(5));
    bus.set_remote("first", 1000, &Credential::default()).unwrap();
    let first = connector.last();
    bus.set_remote("second", 2000, &Credential::default()).unwrap();
    let second = connector.last();

    // A stale notice for the old peer must not unbind the new one.
    first.lost.store(true, Ordering::SeqCst);
    assert!(second
        .inbox
        .deliver(Message::for_event(ChannelEvent::RemoteShutdown)));
    assert!(bus.wait_idle(WAIT));
    assert!(bus.is_remote());

    bus.fire_event(Message::for_event(ChannelEvent::BudgetAdd));
    assert!(bus.wait_idle(WAIT));
    assert_eq!(second.sent.lock().len(), 1);
}

#[test]
fn test_remote_shutdown_notice_unbinds_dead_transport() {
    let (bus, connector) = bus_with("notice", PeerBehavior::Answer, Duration::from_secs(5));
    let (listener, rx) = Recorder::new();
    bus.register_listener(&listener, &[MessageChannel::System]);
    bus.set_remote("host", 1234, &Credential::default()).unwrap();
    let transport = connector.last();

    transport.lost.store(true, Ordering::SeqCst);
    assert!(transport
        .inbox
        .deliver(Message::for_event(ChannelEvent::RemoteShutdown)));
    assert!(bus.wait_idle(WAIT));

    assert_eq!(rx.try_iter().count(), 1);
    assert!(!bus.is_remote());
    assert_eq!(bus.remote_data_base_path(), None);
}

#[test]
fn test_refused_connection_leaves_bus_local() {
    let (bus, connector) = bus_with("refused", PeerBehavior::Refuse, Duration::from_secs(5));

    let err = bus
        .set_remote("host", 1234, &Credential::default())
        .unwrap_err();
    assert!(err.is_connection_error());
    assert!(!err.is_timeout());
    assert!(!bus.is_remote());
    assert_eq!(connector.last().connects.load(Ordering::SeqCst), 1);

    // Firing afterwards only delivers locally.
    bus.fire_event(Message::for_event(ChannelEvent::AccountAdd));
    assert!(bus.wait_idle(WAIT));
    assert!(connector.last().sent.lock().is_empty());
}

#[test]
fn test_set_remote_replaces_previous_binding() {
    let (bus, connector) = bus_with("replace", PeerBehavior::Answer, Duration::from_secs(5));
    bus.set_remote("first", 1000, &Credential::default()).unwrap();
    bus.set_remote("second", 2000, &Credential::default()).unwrap();

    let opened = connector.opened.lock().clone();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[0].disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(opened[1].disconnects.load(Ordering::SeqCst), 0);

    bus.fire_event(Message::for_event(ChannelEvent::ReminderAdd));
    assert!(bus.wait_idle(WAIT));
    assert!(opened[0].sent.lock().is_empty());
    assert_eq!(opened[1].sent.lock().len(), 1);
}

#[test]
fn test_set_local_unbinds() {
    let (bus, connector) = bus_with("set-local", PeerBehavior::Answer, Duration::from_secs(5));
    bus.set_remote("host", 1234, &Credential::default()).unwrap();
    bus.set_local();

    assert!(!bus.is_remote());
    assert_eq!(bus.remote_data_store_type(), None);
    assert_eq!(connector.last().disconnects.load(Ordering::SeqCst), 1);

    // Idempotent.
    bus.set_local();
    assert_eq!(connector.last().disconnects.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_uses_throwaway_transport() {
    let (bus, connector) = bus_with("shutdown", PeerBehavior::Answer, Duration::from_secs(5));
    bus.set_remote("host", 1234, &Credential::default()).unwrap();
    let bound = connector.last();

    bus.shut_down_remote_server("host", 1234, &Credential::default())
        .unwrap();

    let throwaway = connector.last();
    assert!(!std::sync::Arc::ptr_eq(&bound, &throwaway));
    assert_eq!(throwaway.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(throwaway.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(bound.shutdowns.load(Ordering::SeqCst), 0);
    assert!(bus.is_remote());
}

#[test]
fn test_concurrent_set_remote_keeps_one_binding() {
    let (bus, connector) = bus_with("concurrent", PeerBehavior::Answer, Duration::from_secs(5));
    let bus = std::sync::Arc::new(bus);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    bus.set_remote("host", 1234, &Credential::default()).is_ok()
                } else {
                    bus.set_local();
                    true
                }
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    // Every transport except possibly the last bound one has been torn down.
    let opened = connector.opened.lock().clone();
    let live = opened
        .iter()
        .filter(|t| t.disconnects.load(Ordering::SeqCst) == 0)
        .count();
    assert_eq!(live, usize::from(bus.is_remote()));
}
