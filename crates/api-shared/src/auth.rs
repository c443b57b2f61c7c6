//! Caller identity resolution.
//!
//! The REST API identifies callers by API key. Keys are configured once in the
//! `API_KEYS` environment variable as comma-separated `key=caller` pairs, for example:
//!
//! ```text
//! API_KEYS=k-alice-1=alice,k-bob-7=bob
//! ```
//!
//! A request presenting a configured key acts as that caller; a request presenting no
//! key is anonymous. Anonymous callers can still use the pipeline; their conversion
//! records are simply unowned.

use std::env;

/// Errors from caller identity resolution.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("API_KEYS not set in environment")]
    NotConfigured,
    #[error("Invalid API key")]
    InvalidKey,
}

/// Resolves the caller identity for a presented API key against the `API_KEYS`
/// environment variable.
///
/// # Errors
///
/// Returns [`AuthError::NotConfigured`] when no keys are configured, or
/// [`AuthError::InvalidKey`] when the presented key matches none of them.
pub fn caller_for_api_key(provided_key: &str) -> Result<String, AuthError> {
    let configured = env::var("API_KEYS").map_err(|_| AuthError::NotConfigured)?;
    caller_from_configured(&configured, provided_key)
}

/// Pure lookup of a presented key in a `key=caller,key=caller` configuration string.
///
/// Malformed entries (no `=`) are ignored.
pub fn caller_from_configured(configured: &str, provided_key: &str) -> Result<String, AuthError> {
    for entry in configured.split(',') {
        if let Some((key, caller)) = entry.split_once('=') {
            if key.trim() == provided_key {
                return Ok(caller.trim().to_string());
            }
        }
    }
    Err(AuthError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_keys() {
        let configured = "k-alice-1=alice, k-bob-7=bob";

        assert_eq!(
            caller_from_configured(configured, "k-alice-1").unwrap(),
            "alice"
        );
        assert_eq!(
            caller_from_configured(configured, "k-bob-7").unwrap(),
            "bob"
        );
    }

    #[test]
    fn rejects_unknown_key() {
        let err = caller_from_configured("k-alice-1=alice", "k-mallory-9")
            .expect_err("should reject unknown key");
        assert!(matches!(err, AuthError::InvalidKey));
    }

    #[test]
    fn ignores_malformed_entries() {
        let err = caller_from_configured("malformed-entry", "malformed-entry")
            .expect_err("entry without '=' never matches");
        assert!(matches!(err, AuthError::InvalidKey));
    }
}
