//! Ordered parse strategies for backend responses.
//!
//! The backend answers lookups either with a single object or with an array
//! of objects, and names the identifier `device_id` or `id`. Each strategy
//! tries one shape and returns `None` when it does not apply; the first
//! strategy that yields a value wins.

use serde_json::Value;

use crate::backend::{ClaimStatus, DeviceRecord};
use crate::ids::DeviceId;

/// Strategy extracting a value of type `T` from a JSON body.
pub type Strategy<T> = fn(&Value) -> Option<T>;

/// Strategies for the device identifier of a lookup response, in order.
pub const DEVICE_ID_STRATEGIES: &[Strategy<DeviceId>] = &[
    object_device_id,
    object_id,
    array_first_device_id,
    array_first_id,
];

/// Apply `strategies` in order and return the first hit.
pub fn first_match<T>(value: &Value, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(value))
}

/// Device identifier of a lookup response (object or array).
pub fn device_id_of(value: &Value) -> Option<DeviceId> {
    first_match(value, DEVICE_ID_STRATEGIES)
}

/// First device record of a lookup response (object or array).
pub fn first_device_record(value: &Value) -> Option<DeviceRecord> {
    let candidate = match value {
        Value::Object(_) => value,
        Value::Array(items) => items.first()?,
        _ => return None,
    };
    serde_json::from_value(candidate.clone()).ok()
}

/// Device rows of a listing response. Rows that are not objects are skipped.
pub fn device_records(value: &Value) -> Vec<DeviceRecord> {
    let rows = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => std::slice::from_ref(value),
        _ => return Vec::new(),
    };
    rows.iter()
        .filter_map(|row| serde_json::from_value(row.clone()).ok())
        .collect()
}

/// Bound device of a claim-status response.
pub fn claim_bound_device(value: &Value) -> Option<DeviceId> {
    serde_json::from_value::<ClaimStatus>(value.clone())
        .ok()
        .and_then(|status| status.bound_device())
}

fn string_field(value: &Value, field: &str) -> Option<DeviceId> {
    value
        .as_object()?
        .get(field)?
        .as_str()
        .and_then(DeviceId::non_empty)
}

fn object_device_id(value: &Value) -> Option<DeviceId> {
    string_field(value, "device_id")
}

fn object_id(value: &Value) -> Option<DeviceId> {
    string_field(value, "id")
}

fn array_first_device_id(value: &Value) -> Option<DeviceId> {
    value.as_array()?.first().and_then(object_device_id)
}

fn array_first_id(value: &Value) -> Option<DeviceId> {
    value.as_array()?.first().and_then(object_id)
}
