//! The contract every AJAX action implements.

use crate::ActionContext;
use crate::nonce::DEFAULT_NONCE_KEY;
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Wire name of an action: `ap_` followed by the lower-cased handler name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub const PREFIX: &'static str = "ap_";

    /// Derive the wire name from a handler's registration key.
    pub fn for_handler(name: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, name.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ActionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Outcome of an action's permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Granted,
    /// Rejected with the standard "not enough permissions" notice.
    Denied,
    /// Rejected with a custom notice.
    DeniedWith(String),
}

impl Permission {
    /// `Granted` when `allowed`, otherwise `Denied`.
    pub fn when(allowed: bool) -> Self {
        if allowed { Self::Granted } else { Self::Denied }
    }

    /// Grant only to logged-in callers.
    pub fn logged_in(ctx: &ActionContext) -> Self {
        Self::when(ctx.caller().is_authenticated())
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<bool> for Permission {
    fn from(allowed: bool) -> Self {
        Self::when(allowed)
    }
}

/// One AJAX action.
///
/// The pipeline checks the nonce, calls [`authorize`](Self::authorize), then
/// runs [`logged_in`](Self::logged_in) or [`nopriv`](Self::nopriv) depending
/// on the caller, and finally sends the response. `authorize` has no default:
/// every action states who may run it.
pub trait AjaxAction: Send + Sync {
    /// Registration key. The wire name is derived with [`ActionName::for_handler`].
    fn name(&self) -> &'static str;

    /// Nonce key the request must carry a valid `__nonce` for.
    /// `None` or an empty key skips nonce verification.
    fn nonce_key(&self) -> Option<&str> {
        Some(DEFAULT_NONCE_KEY)
    }

    /// Decide whether the request may proceed.
    fn authorize(&self, ctx: &ActionContext) -> Permission;

    /// Runs for authenticated callers.
    fn logged_in(&self, _ctx: &mut ActionContext) {}

    /// Runs for anonymous callers.
    fn nopriv(&self, _ctx: &mut ActionContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_prefixed_and_lowercased() {
        assert_eq!(ActionName::for_handler("PostComment").as_str(), "ap_postcomment");
        assert_eq!(ActionName::for_handler("vote").to_string(), "ap_vote");
    }

    #[test]
    fn permission_from_bool() {
        assert_eq!(Permission::from(true), Permission::Granted);
        assert_eq!(Permission::when(false), Permission::Denied);
        assert!(!Permission::DeniedWith("no".into()).is_granted());
    }
}
