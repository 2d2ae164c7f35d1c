//! Read-only accessors over metric-family nodes of a decoded batch.
//!
//! Families follow the Prometheus client model:
//! `{name, type, metric: [{gauge: {value}, timestamp_ms}]}`. Accessors share
//! the resolver's degrade-to-default contract so a partially populated family
//! yields empty names, zero values and zero timestamps instead of errors.

use crate::path::{resolve, resolve_array, resolve_string};
use vrl::value::Value;

/// Wire value of the gauge variant in the Prometheus client-model `MetricType`
/// enumeration.
const GAUGE_TYPE: i64 = 1;

/// Closed classification of a metric family. Only gauges are normalized;
/// every other family type is skipped by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamilyType {
    Gauge,
    Other,
}

impl MetricFamilyType {
    pub fn from_raw(raw: i64) -> Self {
        if raw == GAUGE_TYPE {
            MetricFamilyType::Gauge
        } else {
            MetricFamilyType::Other
        }
    }
}

pub fn family_type(family: &Value) -> MetricFamilyType {
    match resolve(family, "type") {
        Some(Value::Integer(raw)) => MetricFamilyType::from_raw(*raw),
        _ => MetricFamilyType::Other,
    }
}

pub fn family_name(family: &Value) -> String {
    resolve_string(family, "name", "")
}

pub fn family_points(family: &Value) -> &[Value] {
    resolve_array(family, "metric")
}

/// Gauge value of a single point; 0.0 when absent or oddly shaped.
pub fn point_value(point: &Value) -> f64 {
    match resolve(point, "gauge.value") {
        Some(Value::Float(value)) => value.into_inner(),
        Some(Value::Integer(value)) => *value as f64,
        _ => 0.0,
    }
}

/// Reported point timestamp, prior to unit normalization.
pub fn point_timestamp_ms(point: &Value) -> i64 {
    match resolve(point, "timestamp_ms") {
        Some(Value::Integer(timestamp)) => *timestamp,
        _ => 0,
    }
}
