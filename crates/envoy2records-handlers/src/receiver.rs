use envoy2records_core::{InstanceHeartbeat, InstanceMetricRecord};

/// Downstream boundary for normalized output.
///
/// Submission is fire-and-forget: the handler never consumes a return value
/// and never blocks on the receiver. Backpressure, batching and persistence
/// are the receiver's concern.
pub trait RecordReceiver {
    fn receive_metric(&self, record: InstanceMetricRecord);
    fn receive_heartbeat(&self, heartbeat: InstanceHeartbeat);
}
