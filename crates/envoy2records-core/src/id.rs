//! Stable identifier derivation.
//!
//! Service and instance ids are pure functions of the reported names, so the
//! same envoy node maps to the same ids across reconnects and receiver
//! restarts. Names are base64-encoded to keep arbitrary producer strings safe
//! inside downstream id fields; the `.1` suffix is the normal-service
//! discriminator expected by the aggregation layer.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Derive the service id for a service name.
pub fn service_id(service_name: &str) -> String {
    format!("{}.1", STANDARD.encode(service_name))
}

/// Derive the instance id for an instance name within a service.
pub fn service_instance_id(service_id: &str, instance_name: &str) -> String {
    format!("{}_{}", service_id, STANDARD.encode(instance_name))
}
