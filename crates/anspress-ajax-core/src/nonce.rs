//! Request nonces.
//!
//! A nonce is bound to a key (what the caller intends to do), the caller, and
//! a time window. [`HmacNonces`] splits its lifetime into two ticks: a nonce
//! minted in the current tick verifies as [`NonceAge::Fresh`], one from the
//! previous tick as [`NonceAge::Aging`], anything older fails.

use crate::Caller;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

/// Nonce key checked when an action does not choose its own.
pub const DEFAULT_NONCE_KEY: &str = "ap_default";

/// Number of hex characters in a minted nonce.
const NONCE_LEN: usize = 10;

type HmacSha256 = Hmac<Sha256>;

/// How old an accepted nonce is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Minted in the current tick.
    Fresh,
    /// Minted in the previous tick.
    Aging,
}

/// Checks the security token sent with a request.
pub trait NonceVerifier: Send + Sync {
    /// Verify `nonce` for `key` on behalf of `caller`. `None` means rejected.
    fn verify(&self, nonce: &str, key: &str, caller: &Caller) -> Option<NonceAge>;
}

/// Error building a nonce service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    #[error("nonce secret cannot be empty")]
    EmptySecret,
    #[error("nonce lifetime must be at least 2 seconds")]
    LifetimeTooShort,
}

/// Time-windowed nonces signed with HMAC-SHA256.
#[derive(Clone)]
pub struct HmacNonces {
    mac: HmacSha256,
    lifetime: Duration,
}

impl HmacNonces {
    /// One day, matching the usual WordPress nonce life.
    pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(86_400);

    /// Create a nonce service keyed with `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, NonceError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(NonceError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| NonceError::EmptySecret)?;
        Ok(Self {
            mac,
            lifetime: Self::DEFAULT_LIFETIME,
        })
    }

    /// Override the nonce lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Result<Self, NonceError> {
        if lifetime.as_secs() < 2 {
            return Err(NonceError::LifetimeTooShort);
        }
        self.lifetime = lifetime;
        Ok(self)
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a nonce for `key` and `caller`, valid from now.
    pub fn create(&self, key: &str, caller: &Caller) -> String {
        self.create_at(key, caller, unix_now())
    }

    /// Mint a nonce as if the clock read `now` (seconds since the epoch).
    pub fn create_at(&self, key: &str, caller: &Caller, now: u64) -> String {
        self.digest(self.tick(now), key, caller)
    }

    /// Verify a nonce as if the clock read `now`.
    pub fn verify_at(&self, nonce: &str, key: &str, caller: &Caller, now: u64) -> Option<NonceAge> {
        if nonce.is_empty() {
            return None;
        }
        let tick = self.tick(now);
        if self.matches(nonce, tick, key, caller) {
            return Some(NonceAge::Fresh);
        }
        if tick > 0 && self.matches(nonce, tick - 1, key, caller) {
            return Some(NonceAge::Aging);
        }
        None
    }

    fn tick(&self, now: u64) -> u64 {
        let half = (self.lifetime.as_secs() / 2).max(1);
        now.div_ceil(half)
    }

    fn matches(&self, nonce: &str, tick: u64, key: &str, caller: &Caller) -> bool {
        let expected = self.digest(tick, key, caller);
        expected.as_bytes().ct_eq(nonce.as_bytes()).into()
    }

    fn digest(&self, tick: u64, key: &str, caller: &Caller) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{}|{}|{}", tick, key, caller.uid()).as_bytes());
        let mut encoded = hex::encode(mac.finalize().into_bytes());
        encoded.truncate(NONCE_LEN);
        encoded
    }
}

impl NonceVerifier for HmacNonces {
    fn verify(&self, nonce: &str, key: &str, caller: &Caller) -> Option<NonceAge> {
        self.verify_at(nonce, key, caller, unix_now())
    }
}

impl std::fmt::Debug for HmacNonces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacNonces")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
