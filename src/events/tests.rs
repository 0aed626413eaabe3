//! Tests for listener registries.

use std::sync::{Arc, Mutex};

use rstest::rstest;
use wireline_testing::{LoggerHandle, logger};

use super::*;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |event: &str| {
        sink.lock().expect("recorder lock").push(event.to_owned());
    })
}

#[test]
fn listeners_run_in_registration_order() {
    let bus = EventBus::default();
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        bus.messages()
            .add(move |_: &str| order.lock().expect("order lock").push(tag));
    }
    assert_eq!(bus.messages().dispatch("x"), 3);
    assert_eq!(*order.lock().expect("order lock"), ["first", "second", "third"]);
}

#[test]
fn removed_listener_stops_receiving() {
    let bus = EventBus::default();
    let (seen, listener) = recorder();
    let id = bus.messages().add(listener);
    bus.messages().dispatch("before");
    assert!(bus.messages().remove(id));
    assert!(!bus.messages().remove(id), "second removal finds nothing");
    bus.messages().dispatch("after");
    assert_eq!(*seen.lock().expect("recorder lock"), ["before"]);
}

#[test]
fn bus_remove_searches_every_registry() {
    let bus = EventBus::default();
    let id = bus.disconnects().add(|_: &DisconnectReason| {});
    assert_eq!(bus.disconnects().len(), 1);
    assert!(bus.remove(id));
    assert!(bus.disconnects().is_empty());
}

#[test]
fn changes_during_dispatch_apply_to_next_event() {
    let bus = Arc::new(EventBus::default());
    let calls = Arc::new(AtomicU64::new(0));
    let own_id: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

    let remover = {
        let bus = Arc::clone(&bus);
        let calls = Arc::clone(&calls);
        let own_id = Arc::clone(&own_id);
        move |_: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = own_id.lock().expect("id lock").take() {
                bus.messages().remove(id);
            }
        }
    };
    *own_id.lock().expect("id lock") = Some(bus.messages().add(remover));

    let (seen, late) = recorder();
    let late = Mutex::new(Some(late));
    let adder = Arc::clone(&bus);
    bus.messages().add(move |_: &str| {
        if let Some(late) = late.lock().expect("late lock").take() {
            adder.messages().add(late);
        }
    });

    assert_eq!(bus.messages().dispatch("one"), 2);
    assert!(seen.lock().expect("recorder lock").is_empty());
    assert_eq!(bus.messages().dispatch("two"), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().expect("recorder lock"), ["two"]);
}

#[rstest]
fn panicking_listener_does_not_stop_others(mut logger: LoggerHandle) {
    logger.clear();
    let bus = EventBus::default();
    bus.messages().add(|_: &str| panic!("boom"));
    let (seen, listener) = recorder();
    bus.messages().add(listener);

    assert_eq!(bus.messages().dispatch("still delivered"), 2);
    assert_eq!(*seen.lock().expect("recorder lock"), ["still delivered"]);

    let mut found = false;
    while let Some(record) = logger.pop() {
        if record.args().contains("event listener panicked")
            && record.args().contains("registry=message")
            && record.args().contains("panic=boom")
        {
            found = true;
        }
    }
    assert!(found, "panic should be logged with its registry");
}

#[test]
fn clear_drops_every_listener() {
    let bus = EventBus::default();
    bus.raw_bytes().add(|_: &Bytes| {});
    bus.raw_bytes().add(|_: &Bytes| {});
    bus.raw_bytes().clear();
    assert_eq!(bus.raw_bytes().dispatch(&Bytes::from_static(b"x")), 0);
}

#[test]
fn log_lines_reach_log_listeners() {
    let bus = EventBus::default();
    let (seen, listener) = recorder();
    bus.logs().add(listener);
    bus.log(format_args!("read completed: {} bytes", 5));
    assert_eq!(*seen.lock().expect("recorder lock"), ["read completed: 5 bytes"]);
}

#[test]
fn listener_ids_are_unique() {
    let bus = EventBus::default();
    let a = bus.messages().add(|_: &str| {});
    let b = bus.logs().add(|_: &str| {});
    assert_ne!(a, b);
    assert_ne!(a.as_u64(), b.as_u64());
}
