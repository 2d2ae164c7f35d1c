//! Conversion of decoded stream messages into the generic value tree the
//! normalization core walks.
//!
//! Strings become bytes leaves, integers stay integers, doubles become
//! NaN-safe float leaves and repeated fields become arrays. Absent optional
//! sub-messages are omitted entirely so the resolver's missing-field handling
//! applies, rather than surfacing as explicit nulls.

use bytes::Bytes;
use ordered_float::NotNan;
use vrl::value::{ObjectMap, Value};

use crate::{
    Histogram, Identifier, LabelPair, Metric, MetricFamily, Node, StreamMetricsMessage, Summary,
};

fn text(value: String) -> Value {
    Value::Bytes(Bytes::from(value))
}

fn float(value: f64) -> Value {
    NotNan::new(value).map(Value::Float).unwrap_or(Value::Null)
}

impl From<StreamMetricsMessage> for Value {
    fn from(message: StreamMetricsMessage) -> Self {
        let mut root = ObjectMap::new();
        if let Some(identifier) = message.identifier {
            root.insert("identifier".into(), identifier.into());
        }
        root.insert(
            "envoy_metrics".into(),
            Value::Array(message.envoy_metrics.into_iter().map(Value::from).collect()),
        );
        Value::Object(root)
    }
}

impl From<Identifier> for Value {
    fn from(identifier: Identifier) -> Self {
        let mut map = ObjectMap::new();
        if let Some(node) = identifier.node {
            map.insert("node".into(), node.into());
        }
        Value::Object(map)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        let mut map = ObjectMap::new();
        map.insert("id".into(), text(node.id));
        map.insert("cluster".into(), text(node.cluster));
        map.insert("build_version".into(), text(node.build_version));
        Value::Object(map)
    }
}

impl From<MetricFamily> for Value {
    fn from(family: MetricFamily) -> Self {
        let mut map = ObjectMap::new();
        map.insert("name".into(), text(family.name));
        map.insert("help".into(), text(family.help));
        map.insert("type".into(), Value::Integer(i64::from(family.r#type)));
        map.insert(
            "metric".into(),
            Value::Array(family.metric.into_iter().map(Value::from).collect()),
        );
        Value::Object(map)
    }
}

impl From<Metric> for Value {
    fn from(metric: Metric) -> Self {
        let mut map = ObjectMap::new();
        map.insert(
            "label".into(),
            Value::Array(metric.label.into_iter().map(Value::from).collect()),
        );
        if let Some(gauge) = metric.gauge {
            map.insert("gauge".into(), single_value(gauge.value));
        }
        if let Some(counter) = metric.counter {
            map.insert("counter".into(), single_value(counter.value));
        }
        if let Some(untyped) = metric.untyped {
            map.insert("untyped".into(), single_value(untyped.value));
        }
        if let Some(summary) = metric.summary {
            map.insert("summary".into(), summary.into());
        }
        if let Some(histogram) = metric.histogram {
            map.insert("histogram".into(), histogram.into());
        }
        map.insert("timestamp_ms".into(), Value::Integer(metric.timestamp_ms));
        Value::Object(map)
    }
}

/// `{value: f}` wrapper shared by gauge, counter and untyped samples.
fn single_value(value: f64) -> Value {
    let mut map = ObjectMap::new();
    map.insert("value".into(), float(value));
    Value::Object(map)
}

impl From<LabelPair> for Value {
    fn from(label: LabelPair) -> Self {
        let mut map = ObjectMap::new();
        map.insert("name".into(), text(label.name));
        map.insert("value".into(), text(label.value));
        Value::Object(map)
    }
}

impl From<Summary> for Value {
    fn from(summary: Summary) -> Self {
        let mut map = ObjectMap::new();
        map.insert(
            "sample_count".into(),
            Value::Integer(summary.sample_count as i64),
        );
        map.insert("sample_sum".into(), float(summary.sample_sum));
        map.insert(
            "quantile".into(),
            Value::Array(
                summary
                    .quantile
                    .into_iter()
                    .map(|quantile| {
                        let mut map = ObjectMap::new();
                        map.insert("quantile".into(), float(quantile.quantile));
                        map.insert("value".into(), float(quantile.value));
                        Value::Object(map)
                    })
                    .collect(),
            ),
        );
        Value::Object(map)
    }
}

impl From<Histogram> for Value {
    fn from(histogram: Histogram) -> Self {
        let mut map = ObjectMap::new();
        map.insert(
            "sample_count".into(),
            Value::Integer(histogram.sample_count as i64),
        );
        map.insert("sample_sum".into(), float(histogram.sample_sum));
        map.insert(
            "bucket".into(),
            Value::Array(
                histogram
                    .bucket
                    .into_iter()
                    .map(|bucket| {
                        let mut map = ObjectMap::new();
                        map.insert(
                            "cumulative_count".into(),
                            Value::Integer(bucket.cumulative_count as i64),
                        );
                        map.insert("upper_bound".into(), float(bucket.upper_bound));
                        Value::Object(map)
                    })
                    .collect(),
            ),
        );
        Value::Object(map)
    }
}
