//! Normalized records handed to the downstream pipeline.

use serde::{Deserialize, Serialize};

/// One gauge observation, normalized for aggregation.
///
/// Derived and immutable: one record per (family, point) pair. Ownership
/// passes to the record receiver on emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMetricRecord {
    pub service_id: String,
    pub service_instance_id: String,
    pub service_name: String,
    pub instance_name: String,
    pub metric_name: String,
    pub value: f64,
    pub time_bucket: i64,
}

/// Liveness signal for a service instance, at most one per batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHeartbeat {
    pub service_id: String,
    pub instance_name: String,
    pub time_bucket: i64,
}
