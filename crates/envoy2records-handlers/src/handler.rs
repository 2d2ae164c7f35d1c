//! Per-stream batch processing.

use envoy2records_core::{
    family_name, family_points, family_type, id, minute_time_bucket, normalize_timestamp_ms,
    point_timestamp_ms, point_value, resolve_array, resolve_string, InstanceHeartbeat,
    InstanceMetricRecord, MetricFamilyType,
};
use tracing::{debug, trace};
use vrl::value::Value;

use crate::instrument::{IngestInstruments, LatencyTimer, MeterInstruments};
use crate::receiver::RecordReceiver;

/// Identity of the node reporting on a stream.
///
/// Resolved from the first batch only. After the resolution attempt either
/// both names are populated or both are empty: a missing node id falls back
/// to the cluster and a missing cluster falls back to the node id, so a
/// stream is either fully identified or fully anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamIdentity {
    service_name: Option<String>,
    instance_name: Option<String>,
}

impl StreamIdentity {
    fn resolve(message: &Value) -> Self {
        let node_id = resolve_string(message, "identifier.node.id", "");
        let cluster = resolve_string(message, "identifier.node.cluster", "");

        let mut instance_name = (!node_id.is_empty()).then_some(node_id);
        let mut service_name = (!cluster.is_empty()).then_some(cluster);
        if instance_name.is_none() {
            instance_name = service_name.clone();
        }
        if service_name.is_none() {
            service_name = instance_name.clone();
        }

        Self {
            service_name,
            instance_name,
        }
    }

    pub fn is_known(&self) -> bool {
        self.names().is_some()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    fn names(&self) -> Option<(&str, &str)> {
        match (self.service_name.as_deref(), self.instance_name.as_deref()) {
            (Some(service), Some(instance)) => Some((service, instance)),
            _ => None,
        }
    }
}

/// Converts metrics batches from one stream into normalized records.
///
/// Exactly one handler instance serves one logical stream; the transport
/// delivers its batches in order, one at a time. Identity resolution happens
/// on the first batch only, so moving the handler between worker threads is
/// safe as long as ownership moves with it (`&mut self` sequencing is the
/// whole synchronization story).
pub struct MetricStreamHandler<R, I = MeterInstruments> {
    receiver: R,
    instruments: I,
    identity: StreamIdentity,
    identity_resolved: bool,
}

impl<R: RecordReceiver> MetricStreamHandler<R> {
    pub fn new(receiver: R) -> Self {
        Self::with_instruments(receiver, MeterInstruments)
    }
}

impl<R: RecordReceiver, I: IngestInstruments> MetricStreamHandler<R, I> {
    pub fn with_instruments(receiver: R, instruments: I) -> Self {
        Self {
            receiver,
            instruments,
            identity: StreamIdentity::default(),
            identity_resolved: false,
        }
    }

    /// Identity as currently resolved for this stream.
    pub fn identity(&self) -> &StreamIdentity {
        &self.identity
    }

    /// Process one batch message.
    ///
    /// Never fails: malformed shapes degrade to defaults and simply produce
    /// fewer records. Batches arriving before any identifying metadata has
    /// been seen are dropped silently.
    pub fn process(&mut self, message: &Value) {
        trace!(?message, "received metrics batch");

        // The resolution attempt happens exactly once per stream, even when
        // it yields nothing: a producer that omitted its identity on the
        // first batch is anonymous for the stream's whole lifetime.
        if !self.identity_resolved {
            self.identity_resolved = true;
            self.identity = StreamIdentity::resolve(message);
        }

        let (service_name, instance_name) = match self.identity.names() {
            Some(names) => names,
            None => {
                debug!("dropping batch from unidentified stream");
                return;
            }
        };
        debug!(
            service = service_name,
            instance = instance_name,
            "envoy metrics reported"
        );

        let service_id = id::service_id(service_name);
        let service_instance_id = id::service_instance_id(&service_id, instance_name);

        // Carries the most recent corrected gauge timestamp across the whole
        // family loop; skipped families leave it untouched.
        let mut last_timestamp_ms = 0;

        for family in resolve_array(message, "envoy_metrics") {
            match family_type(family) {
                MetricFamilyType::Gauge => {
                    let metric_name = family_name(family);
                    for point in family_points(family) {
                        self.instruments.point_received();
                        let _timer = LatencyTimer::start(&self.instruments);

                        last_timestamp_ms = normalize_timestamp_ms(point_timestamp_ms(point));
                        self.receiver.receive_metric(InstanceMetricRecord {
                            service_id: service_id.clone(),
                            service_instance_id: service_instance_id.clone(),
                            service_name: service_name.to_string(),
                            instance_name: instance_name.to_string(),
                            metric_name: metric_name.clone(),
                            value: point_value(point),
                            time_bucket: minute_time_bucket(last_timestamp_ms),
                        });
                    }
                }
                MetricFamilyType::Other => continue,
            }
        }

        // One liveness signal per batch, whatever the batch contained.
        self.receiver.receive_heartbeat(InstanceHeartbeat {
            service_id,
            instance_name: instance_name.to_string(),
            time_bucket: minute_time_bucket(last_timestamp_ms),
        });
    }

    /// Clear all per-stream state so the handler can serve a fresh stream.
    ///
    /// Must run when the stream terminates, normally or not; consecutive
    /// streams never inherit identity. Idempotent.
    pub fn reset(&mut self) {
        self.identity_resolved = false;
        self.identity = StreamIdentity::default();
    }
}
