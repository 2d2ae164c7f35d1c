// Channel-backed record sink
//
// The receiver half of the pipeline boundary: handlers push records here
// without waiting, a drain task consumes them on behalf of the downstream
// aggregation pipeline.

use envoy2records_core::{InstanceHeartbeat, InstanceMetricRecord};
use envoy2records_handlers::RecordReceiver;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::debug;

/// One normalized record on its way downstream.
#[derive(Debug, Clone)]
pub enum OutboundRecord {
    Metric(InstanceMetricRecord),
    Heartbeat(InstanceHeartbeat),
}

/// Fire-and-forget receiver shared by all stream sessions.
#[derive(Clone)]
pub struct ChannelReceiver {
    sender: mpsc::UnboundedSender<OutboundRecord>,
}

impl ChannelReceiver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RecordReceiver for ChannelReceiver {
    fn receive_metric(&self, record: InstanceMetricRecord) {
        // A closed downstream drops records; the ingest path never blocks.
        let _ = self.sender.send(OutboundRecord::Metric(record));
    }

    fn receive_heartbeat(&self, heartbeat: InstanceHeartbeat) {
        let _ = self.sender.send(OutboundRecord::Heartbeat(heartbeat));
    }
}

/// Drain outbound records until every sender is gone.
pub async fn drain(mut records: mpsc::UnboundedReceiver<OutboundRecord>) {
    while let Some(record) = records.recv().await {
        match record {
            OutboundRecord::Metric(metric) => {
                counter!("envoy.records.metrics.out", 1);
                debug!(
                    metric = %metric.metric_name,
                    service = %metric.service_name,
                    instance = %metric.instance_name,
                    value = metric.value,
                    bucket = metric.time_bucket,
                    "forwarding instance metric"
                );
            }
            OutboundRecord::Heartbeat(heartbeat) => {
                counter!("envoy.records.heartbeats.out", 1);
                debug!(
                    service_id = %heartbeat.service_id,
                    instance = %heartbeat.instance_name,
                    bucket = heartbeat.time_bucket,
                    "forwarding instance heartbeat"
                );
            }
        }
    }
}
