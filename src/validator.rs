// Signatures are only checked for presence, so this only guards against stale links

use log::debug;

/// Default lifetime of a tipping link, in seconds
pub const DEFAULT_LINK_TTL: i64 = 24 * 60 * 60;

/// Codes starting with one of these are demo codes, they never need a signature
pub const BYPASS_PREFIXES: [&str; 2] = ["TEST", "ORDER"];

/// How a link was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCheck {
    /// Demo code, validation skipped
    Bypassed,
    /// Signature present and timestamp fresh
    Verified,
}

/// Validation rules for tipping links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Maximum age of a link, in seconds
    pub ttl: i64,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        LinkPolicy {
            ttl: DEFAULT_LINK_TTL,
        }
    }
}

impl LinkPolicy {
    pub fn new(ttl: i64) -> Self {
        LinkPolicy { ttl }
    }

    /// Check a tipping link at time `now` (unix seconds).
    ///
    /// Returns Error::LinkExpired when the signature is missing or empty, when the timestamp is
    /// missing or not a number, or when the link is older than the policy allows.
    pub fn check(
        &self,
        code: &str,
        signature: Option<&str>,
        timestamp: Option<&str>,
        now: i64,
    ) -> crate::errors::Result<LinkCheck> {
        if is_bypassed(code) {
            debug!("Skipping link validation for demo code {}", code);
            return Ok(LinkCheck::Bypassed);
        }

        let timestamp = timestamp.and_then(|ts| ts.trim().parse::<i64>().ok());
        match (signature, timestamp) {
            (Some(sig), Some(ts)) if self.accepts(sig, ts, now) => Ok(LinkCheck::Verified),
            _ => {
                debug!("Rejecting link for code {}", code);
                Err(crate::errors::Error::LinkExpired)
            }
        }
    }

    /// A signature is accepted iff it is not empty and the link is at most `ttl` seconds old.
    /// Links from the future are accepted.
    pub fn accepts(&self, signature: &str, timestamp: i64, now: i64) -> bool {
        !signature.is_empty() && now.saturating_sub(timestamp) <= self.ttl
    }
}

/// Whether the code is a demo code that skips validation
pub fn is_bypassed(code: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| code.starts_with(prefix))
}
