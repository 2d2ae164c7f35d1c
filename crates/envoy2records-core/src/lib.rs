// envoy2records-core - Platform-agnostic normalization logic
//
// This crate contains the PURE logic for turning decoded envoy metrics-batch
// messages into normalized instance metric records. No I/O, no async, no
// runtime dependencies: field resolution, timestamp normalization, identifier
// derivation and record construction are all deterministic for the same input.

pub mod family;
pub mod id;
pub mod path;
pub mod records;
pub mod time;

// Re-export commonly used items
pub use family::{family_name, family_points, family_type, point_timestamp_ms, point_value};
pub use family::MetricFamilyType;
pub use path::{resolve, resolve_array, resolve_string};
pub use records::{InstanceHeartbeat, InstanceMetricRecord};
pub use time::{minute_time_bucket, normalize_timestamp_ms};
