//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{future::Future, time::Duration};

use tokio::sync::mpsc;
use wireline::ClientSession;

/// Upper bound for any single awaited step.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `future`, failing the test if it takes longer than [`STEP_TIMEOUT`].
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(STEP_TIMEOUT, future)
        .await
        .expect("step timed out")
}

/// Forward every message the session delivers into a channel.
pub fn collect_messages(session: &ClientSession) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.on_message(move |msg| {
        let _ = tx.send(msg.to_owned());
    });
    rx
}

/// Forward the label of every disconnect event into a channel.
pub fn collect_disconnects(session: &ClientSession) -> mpsc::UnboundedReceiver<&'static str> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.on_disconnected(move |reason| {
        let _ = tx.send(reason.label());
    });
    rx
}
