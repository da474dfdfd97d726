//! Evaluation results handed over by the expression evaluator

use indexmap::IndexMap;
use octofhir_measure_diagnostics::{MSR0500, MeasureError, Result};
use octofhir_measure_types::{ResourceRef, ResultValue};
use serde::{Deserialize, Serialize};

static NULL: ResultValue = ResultValue::Null;

/// Expression name to result, for one subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    results: IndexMap<String, ResultValue>,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result of `expression`; absent expressions read as null
    pub fn get(&self, expression: &str) -> &ResultValue {
        self.results.get(expression).unwrap_or(&NULL)
    }

    pub fn contains(&self, expression: &str) -> bool {
        self.results.contains_key(expression)
    }

    pub fn insert(&mut self, expression: impl Into<String>, value: ResultValue) {
        self.results.insert(expression.into(), value);
    }

    pub fn with(mut self, expression: impl Into<String>, value: ResultValue) -> Self {
        self.insert(expression, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResultValue)> {
        self.results.iter()
    }
}

/// Per-subject evaluation results, in evaluation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectResults {
    subjects: IndexMap<String, EvaluationResult>,
}

impl SubjectResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON object keyed by subject id
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            MeasureError::system(MSR0500, format!("Invalid evaluation results: {}", e))
        })
    }

    pub fn insert(&mut self, subject: impl Into<String>, result: EvaluationResult) {
        self.subjects.insert(subject.into(), result);
    }

    pub fn with(mut self, subject: impl Into<String>, result: EvaluationResult) -> Self {
        self.insert(subject, result);
        self
    }

    pub fn get(&self, subject: &str) -> Option<&EvaluationResult> {
        self.subjects.get(subject)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EvaluationResult)> {
        self.subjects.iter()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Every subject's result for `expression`
    pub fn results_for<'a>(
        &'a self,
        expression: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a ResultValue)> + 'a {
        self.subjects.iter().map(move |(s, r)| (s, r.get(expression)))
    }
}

/// Reference for a subject key; `Patient/1` keeps its type, a bare `1` takes
/// `subject_type`
pub fn subject_ref(subject: &str, subject_type: &str) -> ResourceRef {
    ResourceRef::parse(subject).unwrap_or_else(|| ResourceRef::new(subject_type, subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_expression_reads_null() {
        let result = EvaluationResult::new().with("Numerator", ResultValue::boolean(true));
        assert!(result.get("Denominator").is_null());
        assert!(result.get("Numerator").is_true());
    }

    #[test]
    fn test_subject_results_from_json() {
        let json = r#"{
            "Patient/p1": {"Initial Population": {"type": "Boolean", "value": true}},
            "p2": {"Initial Population": {"type": "Boolean", "value": false}}
        }"#;
        let results = SubjectResults::from_json(json).unwrap();
        assert_eq!(results.len(), 2);
        let ip: Vec<_> = results
            .results_for("Initial Population")
            .map(|(_, v)| v.is_true())
            .collect();
        assert_eq!(ip, vec![true, false]);
    }

    #[test]
    fn test_subject_ref() {
        assert_eq!(subject_ref("Patient/p1", "Patient"), ResourceRef::new("Patient", "p1"));
        assert_eq!(subject_ref("p2", "Practitioner"), ResourceRef::new("Practitioner", "p2"));
    }
}
