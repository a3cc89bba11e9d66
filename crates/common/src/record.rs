use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Rejection reasons for a [`FileRecord`], checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("fingerprint is required")]
    FingerprintRequired,
    #[error("invalid fingerprint format")]
    FingerprintInvalid,
    #[error("size must be positive")]
    SizeInvalid,
}

/// Catalog entry describing one piece of content and where it lives.
///
/// Missing fields deserialize to their empty values so that
///  [`FileRecord::validate`] can name the violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default, alias = "hash")]
    pub fingerprint: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: i64,
    /// Node addresses believed to hold the blob. Never verified.
    #[serde(default)]
    pub replicas: BTreeSet<String>,
}

impl FileRecord {
    pub fn new(fingerprint: &Fingerprint, name: impl Into<String>, size: i64) -> Self {
        Self {
            fingerprint: fingerprint.to_string(),
            name: name.into(),
            size,
            replicas: BTreeSet::new(),
        }
    }

    pub fn with_replica(mut self, address: impl Into<String>) -> Self {
        self.replicas.insert(address.into());
        self
    }

    /// Check the record and return its parsed fingerprint.
    pub fn validate(&self) -> Result<Fingerprint, ValidationError> {
        let fingerprint: Fingerprint = self.fingerprint.parse()?;
        if self.size <= 0 {
            return Err(ValidationError::SizeInvalid);
        }
        Ok(fingerprint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Active,
    Inactive,
}

/// A statically configured storage node. `status` is a label set at
///  startup, not a liveness signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub address: String,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub fingerprint: Fingerprint,
    pub message: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub fingerprint: Fingerprint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_order() {
        let mut record = FileRecord::new(&Fingerprint::of(b"data"), "data.bin", 4);
        assert_eq!(record.validate(), Ok(Fingerprint::of(b"data")));

        record.size = 0;
        assert_eq!(record.validate(), Err(ValidationError::SizeInvalid));

        record.size = -3;
        assert_eq!(record.validate(), Err(ValidationError::SizeInvalid));

        // fingerprint problems are reported before size problems
        record.fingerprint = "short".to_string();
        assert_eq!(record.validate(), Err(ValidationError::FingerprintInvalid));

        record.fingerprint.clear();
        assert_eq!(record.validate(), Err(ValidationError::FingerprintRequired));
    }

    #[test]
    fn test_deserialize_legacy_and_missing_fields() {
        let fingerprint = Fingerprint::of(b"x");
        let json = format!(r#"{{"hash":"{}","name":"x.txt","size":1}}"#, fingerprint);
        let record: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.fingerprint, fingerprint.as_str());
        assert!(record.replicas.is_empty());

        let record: FileRecord = serde_json::from_str(r#"{"name":"x.txt"}"#).unwrap();
        assert_eq!(record.validate(), Err(ValidationError::FingerprintRequired));
    }

    #[test]
    fn test_replicas_are_a_sorted_set_on_the_wire() {
        let json = r#"{"fingerprint":"f","name":"x","size":1,"replicas":["http://b","http://a","http://b"]}"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.replicas.len(), 2);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["replicas"], serde_json::json!(["http://a", "http://b"]));
    }

    #[test]
    fn test_node_status_wire_format() {
        let node = NodeRecord {
            address: "http://localhost:8001".to_string(),
            status: NodeStatus::Active,
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["status"], "active");
    }
}
