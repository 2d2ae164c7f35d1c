//! Transport lifecycle adapter.
//!
//! The transport owns the stream: it accepts the connection, frames and
//! decodes messages and decides when the stream is over. The session only
//! maps those events onto the handler - every message goes to `process`,
//! both termination paths clear per-stream state so a later stream through
//! the same transport slot starts anonymous.

use std::fmt;

use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use vrl::value::Value;

use crate::handler::MetricStreamHandler;
use crate::instrument::IngestInstruments;
use crate::receiver::RecordReceiver;

/// How a stream ended, from the session's perspective. The transport uses
/// this to acknowledge the outward-facing stream before closing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed,
}

pub struct MetricStreamSession<R, I> {
    handler: MetricStreamHandler<R, I>,
}

impl<R: RecordReceiver, I: IngestInstruments> MetricStreamSession<R, I> {
    pub fn new(handler: MetricStreamHandler<R, I>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &MetricStreamHandler<R, I> {
        &self.handler
    }

    /// A decoded batch arrived on the stream.
    pub fn on_next(&mut self, message: &Value) {
        self.handler.process(message);
    }

    /// The transport reported a stream failure. No retry happens here; the
    /// peer is expected to open a fresh stream.
    pub fn on_error(&mut self, error: &dyn fmt::Display) {
        warn!(%error, "error receiving metrics stream");
        self.handler.reset();
    }

    /// The peer closed the stream cleanly.
    pub fn on_completed(&mut self) {
        self.handler.reset();
    }

    /// Drive the session from a stream of decoded messages until it ends.
    pub async fn run<S, E>(&mut self, mut messages: S) -> SessionOutcome
    where
        S: Stream<Item = Result<Value, E>> + Unpin,
        E: fmt::Display,
    {
        while let Some(next) = messages.next().await {
            match next {
                Ok(message) => self.on_next(&message),
                Err(error) => {
                    self.on_error(&error);
                    return SessionOutcome::Failed;
                }
            }
        }
        self.on_completed();
        SessionOutcome::Completed
    }
}
