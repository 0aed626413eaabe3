//! Metric helpers for `wireline`.
//!
//! This module defines metric names and thin helpers over the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops. The library never installs a recorder.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking connected sessions.
pub const SESSIONS_CONNECTED: &str = "wireline_sessions_connected";
/// Name of the counter tracking messages delivered to listeners.
pub const MESSAGES_RECEIVED: &str = "wireline_messages_received_total";
/// Name of the counter tracking bytes read from sockets.
pub const BYTES_RECEIVED: &str = "wireline_bytes_received_total";
/// Name of the counter tracking messages queued for sending.
pub const MESSAGES_SENT: &str = "wireline_messages_sent_total";
/// Name of the counter tracking disconnects, labelled by reason.
pub const DISCONNECTS: &str = "wireline_disconnects_total";

#[cfg(feature = "metrics")]
fn as_u64(value: usize) -> u64 { u64::try_from(value).unwrap_or(u64::MAX) }

/// Increment the connected sessions gauge.
#[cfg(feature = "metrics")]
pub fn inc_connected() { gauge!(SESSIONS_CONNECTED).increment(1.0); }

/// Decrement the connected sessions gauge.
#[cfg(feature = "metrics")]
pub fn dec_connected() { gauge!(SESSIONS_CONNECTED).decrement(1.0); }

/// Record a chunk of `bytes` read from the socket.
#[cfg(feature = "metrics")]
pub fn inc_bytes_received(bytes: usize) { counter!(BYTES_RECEIVED).increment(as_u64(bytes)); }

/// Record `count` messages delivered to listeners.
#[cfg(feature = "metrics")]
pub fn inc_messages_received(count: usize) {
    counter!(MESSAGES_RECEIVED).increment(as_u64(count));
}

/// Record one message queued for sending.
#[cfg(feature = "metrics")]
pub fn inc_messages_sent() { counter!(MESSAGES_SENT).increment(1); }

/// Record a disconnect with its reason label.
#[cfg(feature = "metrics")]
pub fn inc_disconnects(reason: &'static str) {
    counter!(DISCONNECTS, "reason" => reason).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub fn inc_connected() {}

#[cfg(not(feature = "metrics"))]
pub fn dec_connected() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_bytes_received(_bytes: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_messages_received(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_messages_sent() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_disconnects(_reason: &'static str) {}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use rstest::rstest;

    use super::*;

    fn counter_value(name: &str, record: impl FnOnce()) -> u64 {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, record);
        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, ..)| key.key().name() == name)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(count) => count,
                other => panic!("expected counter for {name}, got {other:?}"),
            })
            .unwrap_or_default()
    }

    #[rstest]
    #[case(0, 0)]
    #[case(3, 3)]
    fn messages_received_counts_batches(#[case] count: usize, #[case] expected: u64) {
        assert_eq!(
            counter_value(MESSAGES_RECEIVED, || inc_messages_received(count)),
            expected
        );
    }

    #[test]
    fn bytes_received_accumulates() {
        let total = counter_value(BYTES_RECEIVED, || {
            inc_bytes_received(10);
            inc_bytes_received(5);
        });
        assert_eq!(total, 15);
    }

    #[test]
    fn disconnects_are_labelled_by_reason() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || inc_disconnects("remote_closed"));
        let labelled = snapshotter.snapshot().into_vec().into_iter().any(|(key, ..)| {
            key.key().name() == DISCONNECTS
                && key
                    .key()
                    .labels()
                    .any(|label| label.key() == "reason" && label.value() == "remote_closed")
        });
        assert!(labelled, "disconnect counter should carry the reason label");
    }
}
