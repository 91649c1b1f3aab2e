//! Core data models for model deployments

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Health classification reported by the management service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Ok,
    Warning,
    /// Anything the service reports that is neither `ok` nor `warning`
    #[serde(other)]
    Failing,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Ok => "ok",
            DeploymentStatus::Warning => "warning",
            DeploymentStatus::Failing => "failing",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a deployment: model id plus version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeploymentKey {
    pub model: String,
    pub version: String,
}

impl DeploymentKey {
    pub fn new(model: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DeploymentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.version)
    }
}

/// One deployed model instance as reported by the management service
///
/// Every status query yields fresh descriptors; they are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub model: String,
    pub version: String,
    pub image: String,
    pub scale: u32,
    pub ready_replicas: u32,
    pub status: DeploymentStatus,
    pub model_api_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_time: Option<String>,
}

impl DeploymentDescriptor {
    /// Composite identity used to match descriptors across snapshots
    pub fn key(&self) -> DeploymentKey {
        DeploymentKey::new(self.model.clone(), self.version.clone())
    }

    /// Reported healthy and the model API answering
    pub fn is_healthy(&self) -> bool {
        self.status == DeploymentStatus::Ok && self.model_api_ok
    }
}

/// Identities touched by a mutation, captured once when the mutation returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
    keys: HashSet<DeploymentKey>,
}

impl AffectedSet {
    pub fn from_descriptors(descriptors: &[DeploymentDescriptor]) -> Self {
        descriptors.iter().map(DeploymentDescriptor::key).collect()
    }

    pub fn contains(&self, key: &DeploymentKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of distinct identities
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeploymentKey> {
        self.keys.iter()
    }
}

impl FromIterator<DeploymentKey> for AffectedSet {
    fn from_iter<I: IntoIterator<Item = DeploymentKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::descriptor;
    use super::*;

    #[test]
    fn test_status_deserialize_known_and_unknown() {
        let ok: DeploymentStatus = serde_json::from_str("\"ok\"").unwrap();
        let warning: DeploymentStatus = serde_json::from_str("\"warning\"").unwrap();
        let fail: DeploymentStatus = serde_json::from_str("\"fail\"").unwrap();
        let other: DeploymentStatus = serde_json::from_str("\"crashloop\"").unwrap();

        assert_eq!(ok, DeploymentStatus::Ok);
        assert_eq!(warning, DeploymentStatus::Warning);
        assert_eq!(fail, DeploymentStatus::Failing);
        assert_eq!(other, DeploymentStatus::Failing);
    }

    #[test]
    fn test_descriptor_deserialize_without_optional_fields() {
        let json = r#"{
            "model": "income",
            "version": "1.0",
            "image": "registry.local/income:1.0",
            "scale": 2,
            "ready_replicas": 1,
            "status": "warning",
            "model_api_ok": false
        }"#;

        let d: DeploymentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.key(), DeploymentKey::new("income", "1.0"));
        assert_eq!(d.ready_replicas, 1);
        assert!(d.name.is_none());
        assert!(!d.is_healthy());
    }

    #[test]
    fn test_affected_set_deduplicates_keys() {
        let affected = AffectedSet::from_descriptors(&[
            descriptor("income", "1.0", 1, 0, false),
            descriptor("income", "1.0", 1, 0, false),
            descriptor("income", "1.1", 1, 0, false),
        ]);

        assert_eq!(affected.len(), 2);
        assert!(affected.contains(&DeploymentKey::new("income", "1.1")));
        assert!(!affected.contains(&DeploymentKey::new("income", "2.0")));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(DeploymentKey::new("income", "1.0").to_string(), "income:1.0");
    }
}
