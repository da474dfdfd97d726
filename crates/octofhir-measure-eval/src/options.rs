//! Evaluation options

use octofhir_measure_diagnostics::{MSR0502, MeasureError, Result};
use serde::{Deserialize, Serialize};

/// What to do when a group fails to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failing group and return its error
    #[default]
    Abort,
    /// Record the error against the group and continue with the next one
    Collect,
}

/// Options consumed by [`crate::MeasureEvaluator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasureEvaluationOptions {
    /// Intersect numerator/denominator sets with their parent populations
    pub apply_set_membership: bool,
    /// Resource type of the evaluated subjects
    pub subject_type: String,
    pub error_policy: ErrorPolicy,
}

impl Default for MeasureEvaluationOptions {
    fn default() -> Self {
        Self {
            apply_set_membership: true,
            subject_type: "Patient".to_string(),
            error_policy: ErrorPolicy::Abort,
        }
    }
}

impl MeasureEvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            MeasureError::system(MSR0502, format!("Invalid evaluation options: {}", e))
        })
    }

    pub fn with_set_membership(mut self, apply: bool) -> Self {
        self.apply_set_membership = apply;
        self
    }

    pub fn with_subject_type(mut self, subject_type: impl Into<String>) -> Self {
        self.subject_type = subject_type.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = MeasureEvaluationOptions::default();
        assert!(options.apply_set_membership);
        assert_eq!(options.subject_type, "Patient");
        assert_eq!(options.error_policy, ErrorPolicy::Abort);
    }

    #[test]
    fn test_from_json_partial() {
        let options = MeasureEvaluationOptions::from_json(r#"{"errorPolicy": "collect"}"#).unwrap();
        assert_eq!(options.error_policy, ErrorPolicy::Collect);
        assert!(options.apply_set_membership);

        let err = MeasureEvaluationOptions::from_json("{").unwrap_err();
        assert!(err.code().is_system_error());
    }
}
