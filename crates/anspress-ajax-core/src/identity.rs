//! Who is making a request.
//!
//! Caller format:
//! - `anonymous` - no logged-in user
//! - `user:<id>` - an authenticated user with a non-zero numeric id

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric user id. Zero is reserved for anonymous callers.
pub type UserId = u64;

/// The identity attached to an inbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Caller {
    /// Nobody is logged in.
    #[default]
    Anonymous,
    /// A logged-in user.
    User(UserId),
}

impl Caller {
    /// Create an authenticated caller.
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// The user id, if authenticated.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }

    /// Id used when binding nonces to a caller; anonymous callers share `0`.
    pub fn uid(&self) -> UserId {
        self.user_id().unwrap_or(0)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl FromStr for Caller {
    type Err = CallerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "anonymous" {
            return Ok(Self::Anonymous);
        }

        let id = s
            .strip_prefix("user:")
            .ok_or_else(|| CallerParseError::UnknownForm(s.to_string()))?;

        match id.parse::<UserId>() {
            Ok(0) | Err(_) => Err(CallerParseError::InvalidUserId(id.to_string())),
            Ok(id) => Ok(Self::User(id)),
        }
    }
}

impl TryFrom<String> for Caller {
    type Error = CallerParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Caller> for String {
    fn from(caller: Caller) -> Self {
        caller.to_string()
    }
}

/// Error parsing a caller string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallerParseError {
    #[error("caller must be 'anonymous' or 'user:<id>', got: {0}")]
    UnknownForm(String),
    #[error("user id must be a positive integer, got: {0}")]
    InvalidUserId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user() {
        let caller: Caller = "user:42".parse().unwrap();
        assert_eq!(caller, Caller::user(42));
        assert!(caller.is_authenticated());
        assert_eq!(caller.uid(), 42);
    }

    #[test]
    fn parse_anonymous() {
        let caller: Caller = "anonymous".parse().unwrap();
        assert!(!caller.is_authenticated());
        assert_eq!(caller.user_id(), None);
        assert_eq!(caller.uid(), 0);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(
            "user:0".parse::<Caller>(),
            Err(CallerParseError::InvalidUserId("0".into()))
        );
        assert!("user:abc".parse::<Caller>().is_err());
        assert!(matches!(
            "admin".parse::<Caller>(),
            Err(CallerParseError::UnknownForm(_))
        ));
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Caller::user(7)).unwrap();
        assert_eq!(json, "\"user:7\"");
        let back: Caller = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Caller::user(7));
    }
}
