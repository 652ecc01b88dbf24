//! Observed results of dispatched runs.

use serde::{Deserialize, Serialize};

/// The observed result of one run.
///
/// `Failed` is the sentinel recorded when a job vanishes from the cluster
/// without reporting (and when seeding an adaptive queue); it is distinct in
/// representation from every legitimate score, so a genuine 0.0 result is
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "score", rename_all = "lowercase")]
pub enum Outcome {
    /// A score reported over the result channel.
    Completed(f64),
    /// Presumed dead, or seeded without a result yet.
    Failed,
}

impl Outcome {
    /// True for the failure sentinel.
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// The reported score, if any.
    pub const fn score(self) -> Option<f64> {
        match self {
            Self::Completed(score) => Some(score),
            Self::Failed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_accessor() {
        assert_eq!(Outcome::Completed(0.8).score(), Some(0.8));
        assert_eq!(Outcome::Failed.score(), None);
        assert!(Outcome::Failed.is_failed());
        assert!(!Outcome::Completed(0.0).is_failed());
    }

    #[test]
    fn test_serde_shape_distinguishes_failed_from_zero() {
        let completed = serde_json::to_string(&Outcome::Completed(0.0)).unwrap();
        let failed = serde_json::to_string(&Outcome::Failed).unwrap();
        assert_ne!(completed, failed);

        let back: Outcome = serde_json::from_str(&failed).unwrap();
        assert_eq!(back, Outcome::Failed);
    }
}
