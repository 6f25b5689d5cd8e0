use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Length of a claim code as printed in the setup network name.
pub const CLAIM_CODE_LEN: usize = 3;

/// Errors produced when parsing user-entered claim codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimCodeError {
    #[error("claim code is empty")]
    Empty,
    #[error("claim code must be exactly {expected} digits, got {actual} characters")]
    InvalidLength { expected: usize, actual: usize },
    #[error("claim code must contain ASCII digits only")]
    NonDigit,
}

/// Short numeric code read off the device's setup network name.
///
/// 设备临时网络名称中的短码（三位数字）。
///
/// Identifies both the setup SSID suffix and the server-side claim record.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimCode(String);

impl ClaimCode {
    /// Parse a claim code. Exactly three ASCII digits, nothing else.
    pub fn parse(raw: &str) -> Result<Self, ClaimCodeError> {
        if raw.is_empty() {
            return Err(ClaimCodeError::Empty);
        }
        let actual = raw.chars().count();
        if actual != CLAIM_CODE_LEN {
            return Err(ClaimCodeError::InvalidLength {
                expected: CLAIM_CODE_LEN,
                actual,
            });
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClaimCodeError::NonDigit);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClaimCode {
    type Err = ClaimCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClaimCode {
    type Error = ClaimCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClaimCode> for String {
    fn from(code: ClaimCode) -> Self {
        code.0
    }
}

impl Display for ClaimCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
