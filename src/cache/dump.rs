//! Dump Record Module
//!
//! Portable shape of one cache entry, produced by `dump` and consumed by `load`.

use serde::{Deserialize, Serialize};

// == Dump Record ==
/// One live entry as persisted between cache instances.
///
/// Serializes as `{"k": key, "v": value, "e": expires_at}` where `e == 0`
/// means the entry never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpRecord<K, V> {
    #[serde(rename = "k")]
    pub key: K,
    #[serde(rename = "v")]
    pub value: V,
    /// Absolute expiry time in milliseconds, 0 = never
    #[serde(rename = "e", default)]
    pub expires_at: u64,
}

impl<K, V> DumpRecord<K, V> {
    pub fn new(key: K, value: V, expires_at: u64) -> Self {
        Self {
            key,
            value,
            expires_at,
        }
    }

    /// Returns true if the record carries an expiry time.
    pub fn expires(&self) -> bool {
        self.expires_at != 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_record_wire_shape() {
        let record = DumpRecord::new("key".to_string(), 7u32, 1_500);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json, serde_json::json!({"k": "key", "v": 7, "e": 1500}));
    }

    #[test]
    fn test_dump_record_missing_expiry_defaults_to_never() {
        let record: DumpRecord<String, String> =
            serde_json::from_str(r#"{"k": "a", "v": "b"}"#).unwrap();

        assert_eq!(record.expires_at, 0);
        assert!(!record.expires());
    }
}
