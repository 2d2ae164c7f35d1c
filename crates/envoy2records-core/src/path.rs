//! Dotted-path resolution over decoded message trees.
//!
//! Envoy builds vary in which identifier and metadata fields they populate,
//! so the receiver never binds to a fixed message schema. Instead it walks a
//! generic value tree (objects, arrays, scalar leaves) one dotted segment at
//! a time and degrades to a caller-supplied default whenever a segment is
//! absent or has an unexpected shape.

use vrl::value::{KeyString, Value};

const EMPTY: &[Value] = &[];

/// Walk `path` ("a.b.c") through nested object fields of `message`.
///
/// Returns `None` when any intermediate segment is missing or the node at a
/// segment is not an object. Pure read, never panics.
pub fn resolve<'a>(message: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = message;
    for segment in path.split('.') {
        match node {
            Value::Object(map) => {
                node = map.get(&KeyString::from(segment))?;
            }
            _ => return None,
        }
    }
    Some(node)
}

/// Resolve a string leaf, falling back to `default` for anything that is not
/// a bytes value at the end of the path. Invalid UTF-8 is replaced, not
/// rejected, since identifiers only feed logging and id derivation.
pub fn resolve_string(message: &Value, path: &str, default: &str) -> String {
    match resolve(message, path) {
        Some(Value::Bytes(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        _ => default.to_string(),
    }
}

/// Resolve a repeated field. Absent or non-array nodes resolve to an empty
/// slice so callers can iterate unconditionally.
pub fn resolve_array<'a>(message: &'a Value, path: &str) -> &'a [Value] {
    match resolve(message, path) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => EMPTY,
    }
}
