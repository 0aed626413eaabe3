//! Read and write loops of a connected session.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, debug_span, info, warn};

use super::{SessionInner, lock};
use crate::{
    codec::CodecError,
    error::DisconnectReason,
    metrics,
    transport::{ClientStream, TransportReader, TransportWriter},
};

impl SessionInner {
    /// Publish one chunk: raw bytes first, then every complete message.
    ///
    /// The framing lock is released before any listener runs. Messages that
    /// precede a framing error in the chunk are published before the error
    /// is returned.
    fn deliver(&self, chunk: &[u8]) -> Result<(), CodecError> {
        self.events
            .log(format_args!("read completed: {} bytes", chunk.len()));
        metrics::inc_bytes_received(chunk.len());
        if !self.events.raw_bytes().is_empty() {
            self.events
                .raw_bytes()
                .dispatch(&Bytes::copy_from_slice(chunk));
        }

        self.events.log(format_args!("protocol handoff"));
        let mut messages = Vec::new();
        let result = match lock(&self.framing).as_mut() {
            Some(framing) => framing.process_text_into(chunk, &mut messages),
            None => Ok(()),
        };
        for message in &messages {
            self.events.messages().dispatch(message);
        }
        metrics::inc_messages_received(messages.len());
        result
    }

    /// Publish the single disconnect event and release waiters.
    fn finish(&self) {
        self.shutdown.cancel();
        let reason = lock(&self.reason)
            .take()
            .unwrap_or(DisconnectReason::Requested);
        metrics::dec_connected();
        metrics::inc_disconnects(reason.label());
        if reason.is_error() {
            warn!(reason = %reason, "connection lost");
        } else {
            info!(reason = %reason, "connection closed");
        }
        self.events.log(format_args!("disconnected: {reason}"));
        self.events.disconnects().dispatch(&reason);
        self.terminated.cancel();
    }
}

/// Await reads one at a time until the connection ends, then publish the
/// disconnect event.
pub(super) async fn read_loop<T: ClientStream>(
    mut reader: TransportReader<T>,
    inner: Arc<SessionInner>,
) {
    let span = debug_span!("session.read_loop", buffer.capacity = reader.capacity());
    async {
        loop {
            let outcome = tokio::select! {
                biased;
                () = inner.shutdown.cancelled() => None,
                result = reader.read() => Some(result),
            };
            let failure = match outcome {
                None => break,
                Some(Ok(chunk)) => match inner.deliver(chunk) {
                    Ok(()) => continue,
                    Err(err) => DisconnectReason::Framing(err),
                },
                Some(Err(err)) => DisconnectReason::from_read(err),
            };
            if !inner.begin_disconnect(failure) {
                debug!("read failure after disconnect ignored");
            }
            break;
        }
        inner.finish();
    }
    .instrument(span)
    .await;
}

/// Write queued frames in order until the connection ends.
///
/// Frames still queued at that point are dropped.
pub(super) async fn write_loop<T: ClientStream>(
    mut writer: TransportWriter<T>,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    inner: Arc<SessionInner>,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = inner.shutdown.cancelled() => break,
            frame = outbound.recv() => frame,
        };
        let Some(frame) = frame else { break };
        let written = tokio::select! {
            biased;
            () = inner.shutdown.cancelled() => break,
            result = writer.write(&frame) => result,
        };
        if let Err(err) = written {
            if !inner.begin_disconnect(DisconnectReason::from_write(err)) {
                debug!("write failure after disconnect ignored");
            }
            break;
        }
    }
    outbound.close();
    writer.close().await;
}
