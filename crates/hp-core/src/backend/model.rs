use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::{ClaimCode, DeviceId, PlantId, UserId};

/// Device row as returned by `/devices` and `/devices/lookup`.
///
/// Every field is optional on the wire; the backend omits what it does not know.
/// A field of the wrong type reads as absent instead of failing the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_id: Option<DeviceId>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<DeviceId>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<UserId>,
    #[serde(
        default,
        rename = "ownerAttached",
        deserialize_with = "lenient_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_attached: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub plant_id: Option<PlantId>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub firmware_version: Option<String>,
    /// Unix seconds.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen_at: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub online: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub humidity: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub water: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub temp: Option<f64>,
}

impl DeviceRecord {
    pub fn with_id(device_id: DeviceId) -> Self {
        Self {
            device_id: Some(device_id),
            ..Self::default()
        }
    }

    /// Identifier of the record: `device_id`, else `id`, ignoring blanks.
    pub fn identifier(&self) -> Option<DeviceId> {
        [self.device_id.as_ref(), self.id.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|id| DeviceId::non_empty(id.as_str()))
    }

    /// Whether the record shows the device bound to `user`.
    ///
    /// Without a known user only the explicit attached flag counts.
    pub fn is_attached_to(&self, user: Option<UserId>) -> bool {
        if self.owner_attached == Some(true) {
            return true;
        }
        match (user, self.owner_id) {
            (Some(user), Some(owner)) => user == owner,
            _ => false,
        }
    }
}

/// Claim record as returned by `/claims/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient")]
    pub reserved_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub consumed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub device_id: Option<DeviceId>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub expired: Option<bool>,
}

impl ClaimStatus {
    /// Device bound by the claim, once fulfilled.
    pub fn bound_device(&self) -> Option<DeviceId> {
        self.device_id
            .as_ref()
            .and_then(|id| DeviceId::non_empty(id.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: PlantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub avatar: Option<i64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Read an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|value| serde_json::from_value(value).ok()))
}

/// Accept `true`/`false`, `0`/`1` or null for boolean columns.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

/// Body of `POST /devices/attach`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachRequest {
    pub device_id: DeviceId,
    pub plant_id: PlantId,
    pub claim: ClaimCode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_record_reads_owner_attached_flag() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "device_id": "hpfs-785",
            "owner_id": 7,
            "ownerAttached": true,
            "online": true
        }))
        .unwrap();
        assert_eq!(record.identifier(), Some(DeviceId::from("hpfs-785")));
        assert_eq!(record.owner_id, Some(UserId::new(7)));
        assert_eq!(record.owner_attached, Some(true));
    }

    #[test]
    fn test_device_record_accepts_integer_flags() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "device_id": "hpfs-785",
            "online": 1,
            "last_seen_at": 1718000000,
            "humidity": 41,
            "ownerAttached": null
        }))
        .unwrap();
        assert_eq!(record.online, Some(true));
        assert_eq!(record.last_seen_at, Some(1_718_000_000));
        assert_eq!(record.humidity, Some(41.0));
        assert_eq!(record.owner_attached, None);
    }

    #[test]
    fn test_device_record_tolerates_mistyped_fields() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 42,
            "device_id": "hpfs-785",
            "owner_id": 1,
            "firmware_version": 3,
            "last_seen_at": "2025-08-18T10:00:00Z",
            "water": "high"
        }))
        .unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.identifier(), Some(DeviceId::from("hpfs-785")));
        assert_eq!(record.owner_id, Some(UserId::new(1)));
        assert_eq!(record.firmware_version, None);
        assert_eq!(record.last_seen_at, None);
        assert_eq!(record.water, None);
    }

    #[test]
    fn test_claim_status_tolerates_mistyped_fields() {
        let status: ClaimStatus = serde_json::from_value(json!({
            "code": 785,
            "user_id": "seven",
            "device_id": "hpfs-785",
            "expired": 0
        }))
        .unwrap();
        assert_eq!(status.code, None);
        assert_eq!(status.user_id, None);
        assert_eq!(status.expired, Some(false));
        assert_eq!(status.bound_device(), Some(DeviceId::from("hpfs-785")));
    }

    #[test]
    fn test_identifier_falls_back_to_id_and_skips_blank() {
        let record = DeviceRecord {
            device_id: Some(DeviceId::from("  ")),
            id: Some(DeviceId::from("hpfs-111")),
            ..DeviceRecord::default()
        };
        assert_eq!(record.identifier(), Some(DeviceId::from("hpfs-111")));
    }

    #[test]
    fn test_is_attached_to() {
        let owned = DeviceRecord {
            owner_id: Some(UserId::new(1)),
            ..DeviceRecord::default()
        };
        assert!(owned.is_attached_to(Some(UserId::new(1))));
        assert!(!owned.is_attached_to(Some(UserId::new(2))));
        assert!(!owned.is_attached_to(None));

        let flagged = DeviceRecord {
            owner_attached: Some(true),
            ..DeviceRecord::default()
        };
        assert!(flagged.is_attached_to(None));
    }

    #[test]
    fn test_attach_request_body() {
        let body = AttachRequest {
            device_id: DeviceId::from("hpfs-785"),
            plant_id: PlantId::new(3),
            claim: ClaimCode::parse("785").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"device_id": "hpfs-785", "plant_id": 3, "claim": "785"})
        );
    }
}
