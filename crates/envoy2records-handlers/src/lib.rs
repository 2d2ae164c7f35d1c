//! Stateful per-stream processing of envoy metrics batches.
//!
//! One `MetricStreamHandler` is bound to exactly one inbound stream: it
//! resolves the reporting node's identity from the first batch, normalizes
//! gauge points into instance metric records and emits one instance
//! heartbeat per batch. `MetricStreamSession` maps transport lifecycle
//! events onto the handler.

pub mod handler;
pub mod instrument;
pub mod receiver;
pub mod session;

pub use handler::{MetricStreamHandler, StreamIdentity};
pub use instrument::{IngestInstruments, LatencyTimer, MeterInstruments};
pub use receiver::RecordReceiver;
pub use session::{MetricStreamSession, SessionOutcome};
