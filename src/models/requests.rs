//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::snapshot::SnapshotRecord;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `max_age_ms`: Optional per-entry max age in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional max age in milliseconds, overriding the cache default
    #[serde(default)]
    pub max_age_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /load: a previously dumped record list.
pub type LoadRequest = Vec<SnapshotRecord>;

/// Checks a key against the server's key rules.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.max_age_ms.is_none());
    }

    #[test]
    fn test_set_request_with_max_age() {
        let json = r#"{"key": "test", "value": "hello", "max_age_ms": 60000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.max_age_ms, Some(60_000));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            max_age_ms: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH)).is_none());
    }

    #[test]
    fn test_load_request_deserialize() {
        let json = r#"[{"k": "a", "v": "1", "e": 0}, {"k": "b", "v": "2"}]"#;
        let req: LoadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.len(), 2);
        assert_eq!(req[1].expires_at, 0);
    }
}
