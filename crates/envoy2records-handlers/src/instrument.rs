//! Self-observability hooks for the ingestion path.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Instrumentation seam for per-point accounting.
pub trait IngestInstruments {
    /// Called once for every gauge point taken off the stream.
    fn point_received(&self);
    /// Called with the per-point processing span.
    fn point_latency(&self, elapsed: Duration);
}

/// Default instruments publishing through the process-wide `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeterInstruments;

impl IngestInstruments for MeterInstruments {
    fn point_received(&self) {
        counter!("envoy.metrics.in.points", 1);
    }

    fn point_latency(&self, elapsed: Duration) {
        histogram!("envoy.metrics.in.latency_seconds", elapsed.as_secs_f64());
    }
}

/// Scoped latency measurement: started when constructed, observed when
/// dropped, so the histogram sees every exit path of the measured block.
pub struct LatencyTimer<'a, I: IngestInstruments> {
    instruments: &'a I,
    started: Instant,
}

impl<'a, I: IngestInstruments> LatencyTimer<'a, I> {
    pub fn start(instruments: &'a I) -> Self {
        Self {
            instruments,
            started: Instant::now(),
        }
    }
}

impl<I: IngestInstruments> Drop for LatencyTimer<'_, I> {
    fn drop(&mut self) {
        self.instruments.point_latency(self.started.elapsed());
    }
}
