//! Typed "absence" results.
//!
//! Presence checks (device probes, backend lookups) never propagate errors:
//! a failed request and "not there yet" are the same answer at this layer.
//! The reason is still kept so it can be logged and asserted in tests.

use std::fmt::{Display, Formatter};

/// Why a lookup produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absence {
    /// Request succeeded but carried nothing usable.
    NotFound,
    /// Transport failure, DNS failure or request timeout.
    Unreachable(String),
    /// Non-2xx status code.
    Status(u16),
    /// Body did not match any accepted shape.
    Malformed(String),
}

impl Display for Absence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Absence::NotFound => write!(f, "not found"),
            Absence::Unreachable(reason) => write!(f, "unreachable: {reason}"),
            Absence::Status(code) => write!(f, "status {code}"),
            Absence::Malformed(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

/// Result of a presence query: a value, or a typed absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Absent(Absence),
}

impl<T> Lookup<T> {
    pub fn not_found() -> Self {
        Lookup::Absent(Absence::NotFound)
    }

    /// Build from an optional value.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::not_found(),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Absent(reason) => Lookup::Absent(reason),
        }
    }

    /// Chain a fallible step; absence short-circuits.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Lookup::Found(value) => f(value),
            Lookup::Absent(reason) => Lookup::Absent(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert_eq!(Lookup::from_option(Some(1)), Lookup::Found(1));
        assert_eq!(
            Lookup::<i32>::from_option(None),
            Lookup::Absent(Absence::NotFound)
        );
    }

    #[test]
    fn test_and_then_short_circuits_on_absence() {
        let absent: Lookup<i32> = Lookup::Absent(Absence::Status(404));
        let chained = absent.and_then(|v| Lookup::Found(v + 1));
        assert_eq!(chained, Lookup::Absent(Absence::Status(404)));
        assert_eq!(Lookup::Found(1).and_then(|v| Lookup::Found(v + 1)).found(), Some(2));
    }
}
