//! Behavioral suite for the stream handler: identity lifecycle, timestamp
//! normalization, record/heartbeat cardinality and instrumentation counts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use envoy2records_core::{InstanceHeartbeat, InstanceMetricRecord};
use envoy2records_handlers::{IngestInstruments, MetricStreamHandler, RecordReceiver};
use ordered_float::NotNan;
use vrl::value::{ObjectMap, Value};

#[derive(Clone, Default)]
struct CapturingReceiver {
    metrics: Arc<Mutex<Vec<InstanceMetricRecord>>>,
    heartbeats: Arc<Mutex<Vec<InstanceHeartbeat>>>,
}

impl CapturingReceiver {
    fn metrics(&self) -> Vec<InstanceMetricRecord> {
        self.metrics.lock().unwrap().clone()
    }

    fn heartbeats(&self) -> Vec<InstanceHeartbeat> {
        self.heartbeats.lock().unwrap().clone()
    }
}

impl RecordReceiver for CapturingReceiver {
    fn receive_metric(&self, record: InstanceMetricRecord) {
        self.metrics.lock().unwrap().push(record);
    }

    fn receive_heartbeat(&self, heartbeat: InstanceHeartbeat) {
        self.heartbeats.lock().unwrap().push(heartbeat);
    }
}

#[derive(Clone, Default)]
struct CountingInstruments {
    points: Arc<AtomicUsize>,
    latencies: Arc<AtomicUsize>,
}

impl IngestInstruments for CountingInstruments {
    fn point_received(&self) {
        self.points.fetch_add(1, Ordering::SeqCst);
    }

    fn point_latency(&self, _elapsed: Duration) {
        self.latencies.fetch_add(1, Ordering::SeqCst);
    }
}

fn text(value: &str) -> Value {
    Value::Bytes(Bytes::copy_from_slice(value.as_bytes()))
}

fn gauge_point(value: f64, timestamp_ms: i64) -> Value {
    let mut gauge = ObjectMap::new();
    gauge.insert(
        "value".into(),
        Value::Float(NotNan::new(value).expect("finite test value")),
    );
    let mut point = ObjectMap::new();
    point.insert("gauge".into(), Value::Object(gauge));
    point.insert("timestamp_ms".into(), Value::Integer(timestamp_ms));
    Value::Object(point)
}

fn family(name: &str, raw_type: i64, points: Vec<Value>) -> Value {
    let mut family = ObjectMap::new();
    family.insert("name".into(), text(name));
    family.insert("type".into(), Value::Integer(raw_type));
    family.insert("metric".into(), Value::Array(points));
    Value::Object(family)
}

fn gauge_family(name: &str, points: &[(f64, i64)]) -> Value {
    family(
        name,
        1,
        points
            .iter()
            .map(|(value, timestamp_ms)| gauge_point(*value, *timestamp_ms))
            .collect(),
    )
}

fn batch(node_id: Option<&str>, cluster: Option<&str>, families: Vec<Value>) -> Value {
    let mut node = ObjectMap::new();
    if let Some(node_id) = node_id {
        node.insert("id".into(), text(node_id));
    }
    if let Some(cluster) = cluster {
        node.insert("cluster".into(), text(cluster));
    }
    let mut identifier = ObjectMap::new();
    identifier.insert("node".into(), Value::Object(node));
    let mut root = ObjectMap::new();
    root.insert("identifier".into(), Value::Object(identifier));
    root.insert("envoy_metrics".into(), Value::Array(families));
    Value::Object(root)
}

fn handler(
    receiver: &CapturingReceiver,
    instruments: &CountingInstruments,
) -> MetricStreamHandler<CapturingReceiver, CountingInstruments> {
    MetricStreamHandler::with_instruments(receiver.clone(), instruments.clone())
}

#[test]
fn test_cluster_only_identity_populates_both_names() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        None,
        Some("edge"),
        vec![gauge_family("server_uptime", &[(1.0, 60_000)])],
    ));

    let metrics = receiver.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].service_name, "edge");
    assert_eq!(metrics[0].instance_name, "edge");
}

#[test]
fn test_node_id_only_identity_populates_both_names() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        None,
        vec![gauge_family("server_uptime", &[(1.0, 60_000)])],
    ));

    let metrics = receiver.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].service_name, "router-1");
    assert_eq!(metrics[0].instance_name, "router-1");
}

#[test]
fn test_identity_is_resolved_from_first_batch_only() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![gauge_family("server_uptime", &[(1.0, 60_000)])],
    ));
    // Later batches may carry different identifiers; they are ignored.
    handler.process(&batch(
        Some("router-9"),
        Some("ingress"),
        vec![gauge_family("server_uptime", &[(2.0, 120_000)])],
    ));

    let metrics = receiver.metrics();
    assert_eq!(metrics.len(), 2);
    assert!(metrics
        .iter()
        .all(|record| record.service_name == "edge" && record.instance_name == "router-1"));
}

#[test]
fn test_unidentified_stream_drops_batches_for_its_whole_lifetime() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        None,
        None,
        vec![gauge_family("server_uptime", &[(1.0, 60_000)])],
    ));
    assert!(receiver.metrics().is_empty());
    assert!(receiver.heartbeats().is_empty());
    assert_eq!(instruments.points.load(Ordering::SeqCst), 0);

    // Resolution is attempted exactly once: identity arriving later on the
    // same stream does not revive it.
    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![gauge_family("server_uptime", &[(2.0, 120_000)])],
    ));
    assert!(receiver.metrics().is_empty());
    assert!(receiver.heartbeats().is_empty());
}

#[test]
fn test_nanosecond_timestamps_are_corrected_before_bucketing() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![gauge_family(
            "server_uptime",
            &[(1.0, 1552303033488741055), (2.0, 1690000000000)],
        )],
    ));

    let metrics = receiver.metrics();
    assert_eq!(metrics.len(), 2);
    // 1552303033488741055 ns -> 1552303033488 ms.
    assert_eq!(metrics[0].time_bucket, 1552303033488 / 60_000);
    // Plausible milliseconds pass through untouched.
    assert_eq!(metrics[1].time_bucket, 1690000000000 / 60_000);
}

#[test]
fn test_one_heartbeat_per_batch_regardless_of_point_count() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![
            gauge_family("server_uptime", &[(10.0, 60_000), (11.0, 120_000)]),
            gauge_family("memory_allocated", &[(20.0, 180_000)]),
            gauge_family("memory_heap_size", &[(30.0, 240_000), (31.0, 300_000)]),
        ],
    ));

    assert_eq!(receiver.metrics().len(), 5);
    let heartbeats = receiver.heartbeats();
    assert_eq!(heartbeats.len(), 1);
    // The heartbeat carries the bucket of the last processed point.
    assert_eq!(heartbeats[0].time_bucket, 5);
    assert_eq!(heartbeats[0].instance_name, "router-1");
    assert_eq!(instruments.points.load(Ordering::SeqCst), 5);
    assert_eq!(instruments.latencies.load(Ordering::SeqCst), 5);
}

#[test]
fn test_non_gauge_families_are_skipped_without_instrumentation() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![
            family("requests_total", 0, vec![gauge_point(5.0, 60_000)]),
            family("request_duration", 4, vec![gauge_point(6.0, 120_000)]),
        ],
    ));

    assert!(receiver.metrics().is_empty());
    assert_eq!(instruments.points.load(Ordering::SeqCst), 0);
    assert_eq!(instruments.latencies.load(Ordering::SeqCst), 0);

    // Identity is known, so the liveness signal still fires - with no gauge
    // point processed its timestamp is zero.
    let heartbeats = receiver.heartbeats();
    assert_eq!(heartbeats.len(), 1);
    assert_eq!(heartbeats[0].time_bucket, 0);
}

#[test]
fn test_heartbeat_reuses_last_gauge_timestamp_when_trailing_family_is_skipped() {
    // Long-standing quirk kept on purpose: the timestamp variable spans the
    // whole family loop, so a skipped trailing family leaves the previous
    // gauge family's last timestamp in place instead of zeroing it.
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![
            gauge_family("server_uptime", &[(1.0, 600_000)]),
            family("requests_total", 0, vec![gauge_point(5.0, 999_000)]),
        ],
    ));

    let heartbeats = receiver.heartbeats();
    assert_eq!(heartbeats.len(), 1);
    assert_eq!(heartbeats[0].time_bucket, 10);
}

#[test]
fn test_empty_batch_from_identified_stream_still_heartbeats() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(Some("router-1"), Some("edge"), vec![]));

    assert!(receiver.metrics().is_empty());
    let heartbeats = receiver.heartbeats();
    assert_eq!(heartbeats.len(), 1);
    assert_eq!(heartbeats[0].time_bucket, 0);
}

#[test]
fn test_records_carry_derived_ids_and_names() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![gauge_family("server_uptime", &[(42.5, 60_000)])],
    ));

    let metrics = receiver.metrics();
    assert_eq!(metrics.len(), 1);
    let record = &metrics[0];
    assert_eq!(record.metric_name, "server_uptime");
    assert_eq!(record.value, 42.5);
    assert_eq!(record.time_bucket, 1);
    assert_eq!(record.service_id, envoy2records_core::id::service_id("edge"));
    assert_eq!(
        record.service_instance_id,
        envoy2records_core::id::service_instance_id(&record.service_id, "router-1")
    );

    let heartbeats = receiver.heartbeats();
    assert_eq!(heartbeats[0].service_id, record.service_id);
}

#[test]
fn test_reset_clears_identity_and_is_idempotent() {
    let receiver = CapturingReceiver::default();
    let instruments = CountingInstruments::default();
    let mut handler = handler(&receiver, &instruments);

    handler.process(&batch(
        Some("router-1"),
        Some("edge"),
        vec![gauge_family("server_uptime", &[(1.0, 60_000)])],
    ));
    assert!(handler.identity().is_known());

    handler.reset();
    let cleared = handler.identity().clone();
    handler.reset();
    assert_eq!(handler.identity(), &cleared);
    assert!(!handler.identity().is_known());

    // A reused handler behaves like a brand new stream.
    handler.process(&batch(
        Some("router-9"),
        Some("ingress"),
        vec![gauge_family("server_uptime", &[(2.0, 120_000)])],
    ));
    let metrics = receiver.metrics();
    assert_eq!(metrics.last().unwrap().service_name, "ingress");
    assert_eq!(metrics.last().unwrap().instance_name, "router-9");
}
