//! Narrowing a status listing down to the deployments a mutation touched

use crate::models::{AffectedSet, DeploymentDescriptor};

/// Keep only the descriptors whose identity belongs to `affected`
pub fn filter_affected(
    snapshot: Vec<DeploymentDescriptor>,
    affected: &AffectedSet,
) -> Vec<DeploymentDescriptor> {
    snapshot
        .into_iter()
        .filter(|deployment| affected.contains(&deployment.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::descriptor;
    use crate::models::DeploymentKey;

    #[test]
    fn test_filter_keeps_only_affected() {
        let affected: AffectedSet = [
            DeploymentKey::new("income", "1.0"),
            DeploymentKey::new("churn", "2.1"),
        ]
        .into_iter()
        .collect();

        let snapshot = vec![
            descriptor("income", "1.0", 2, 2, true),
            descriptor("income", "1.1", 2, 2, true),
            descriptor("churn", "2.1", 1, 0, false),
            descriptor("fraud", "1.0", 3, 3, true),
        ];

        let filtered = filter_affected(snapshot, &affected);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|d| affected.contains(&d.key())));
    }

    #[test]
    fn test_filter_matches_on_version_too() {
        let affected: AffectedSet = [DeploymentKey::new("income", "1.0")].into_iter().collect();

        let filtered = filter_affected(vec![descriptor("income", "1.1", 1, 1, true)], &affected);

        assert!(filtered.is_empty());
    }

    #[test]
    fn test_filter_empty_inputs() {
        let affected: AffectedSet = [DeploymentKey::new("income", "1.0")].into_iter().collect();
        assert!(filter_affected(vec![], &affected).is_empty());

        let snapshot = vec![descriptor("income", "1.0", 1, 1, true)];
        assert!(filter_affected(snapshot, &AffectedSet::default()).is_empty());
    }
}
