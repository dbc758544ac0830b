//! Identity types: `PoolId` (config fingerprint), `BrowserId` (random token),
//! `PageId` (per-browser counter), and the composite `SessionId`.

use crate::error::PoolError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic fingerprint of a canonicalized pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PoolId(String);

impl PoolId {
    /// Hash the canonical JSON form of a config into a short hex fingerprint.
    ///
    /// Two create-requests with an identical canonicalized config collide on
    /// this id, which is the basis for `PoolAdmin`'s idempotent `create_pool`.
    pub fn from_canonical_json(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(&digest[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-known id string (e.g. parsed out of a `SessionId`)
    /// without re-hashing it.
    pub fn from_raw<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short random token identifying a browser within its pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BrowserId(String);

impl BrowserId {
    pub fn new_random() -> Self {
        use rand::Rng;
        const CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::thread_rng();
        let token: String = (0..8)
            .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-known id string (e.g. parsed out of a `SessionId`).
    pub fn from_raw<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing id of a page within its owning browser.
pub type PageId = u64;

/// The composite, externally visible handle to a page: `<pool>_<browser>_<page>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionId {
    pub pool_id: String,
    pub browser_id: String,
    pub page_id: PageId,
}

impl SessionId {
    pub fn new(pool_id: &PoolId, browser_id: &BrowserId, page_id: PageId) -> Self {
        Self {
            pool_id: pool_id.as_str().to_string(),
            browser_id: browser_id.as_str().to_string(),
            page_id,
        }
    }

    /// Parse a composite session id. Any shape other than exactly three
    /// `_`-separated parts is a client error.
    pub fn parse(raw: &str) -> Result<Self, PoolError> {
        let parts: Vec<&str> = raw.split('_').collect();
        if parts.len() != 3 {
            return Err(PoolError::invalid_session_id(raw));
        }
        let page_id: PageId = parts[2]
            .parse()
            .map_err(|_| PoolError::invalid_session_id(raw))?;
        Ok(Self {
            pool_id: parts[0].to_string(),
            browser_id: parts[1].to_string(),
            page_id,
        })
    }

    /// `"<prefix>_<page_id>"`, where `prefix` is usually `"<pool_id>_<browser_id>"`.
    pub fn from_prefix(prefix: &str, page_id: PageId) -> String {
        format!("{}_{}", prefix, page_id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.pool_id, self.browser_id, self.page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_id() {
        let id = SessionId::parse("abc123_br01_7").unwrap();
        assert_eq!(id.pool_id, "abc123");
        assert_eq!(id.browser_id, "br01");
        assert_eq!(id.page_id, 7);
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(SessionId::parse("abc_def").is_err());
        assert!(SessionId::parse("a_b_c_d").is_err());
        assert!(SessionId::parse("a_b_notanumber").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let pool = PoolId::from_canonical_json("{}");
        let browser = BrowserId::new_random();
        let id = SessionId::new(&pool, &browser, 3);
        let rendered = id.to_string();
        let parsed = SessionId::parse(&rendered).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn same_config_hashes_to_same_pool_id() {
        let a = PoolId::from_canonical_json(r#"{"headless":true}"#);
        let b = PoolId::from_canonical_json(r#"{"headless":true}"#);
        assert_eq!(a, b);
    }
}
