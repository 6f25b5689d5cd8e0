//! Access tokens and the identity they carry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::UserId;

/// Persisted backend credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthTokens {
    /// User id carried by the access token, if it can be read.
    pub fn user_id(&self) -> Option<UserId> {
        decode_user_id(&self.access)
    }
}

/// Read the user id from a JWT payload without verifying the signature.
///
/// Looks at `user_id` first, then `sub`; either may be a number or a
/// numeric string.
pub fn decode_user_id(jwt: &str) -> Option<UserId> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    ["user_id", "sub"]
        .iter()
        .find_map(|key| claims.get(*key).and_then(numeric_claim))
        .map(UserId::new)
}

fn numeric_claim(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt_with(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_user_id_claim_wins_over_sub() {
        let token = jwt_with(json!({"user_id": 42, "sub": "7"}));
        assert_eq!(decode_user_id(&token), Some(UserId::new(42)));
    }

    #[test]
    fn test_sub_as_string_or_number() {
        assert_eq!(
            decode_user_id(&jwt_with(json!({"sub": "17"}))),
            Some(UserId::new(17))
        );
        assert_eq!(
            decode_user_id(&jwt_with(json!({"sub": 18}))),
            Some(UserId::new(18))
        );
    }

    #[test]
    fn test_unreadable_tokens() {
        assert_eq!(decode_user_id("not-a-jwt"), None);
        assert_eq!(decode_user_id("a.!!!.c"), None);
        assert_eq!(decode_user_id(&jwt_with(json!({"sub": "alice"}))), None);
    }
}
