//! Clinical quality measure evaluation for Rust
//!
//! This crate ties together the measure evaluation pipeline:
//! - Building a validated measure model from a FHIR `Measure`
//! - Checking evaluated results against the declared population basis
//! - Population counts, set-membership correction and scoring
//! - Value, criteria and component stratification
//!
//! Expression evaluation itself happens elsewhere; this crate consumes its
//! per-subject results.
//!
//! # Example
//!
//! ```
//! use octofhir_measure::{EvaluationResult, MeasureEvaluationOptions, SubjectResults};
//! use octofhir_measure::types::ResultValue;
//!
//! let measure = r#"{
//!   "resourceType": "Measure",
//!   "id": "m1",
//!   "scoring": {"coding": [{"code": "proportion"}]},
//!   "group": [{
//!     "population": [
//!       {"id": "ip", "code": {"coding": [{"code": "initial-population"}]}, "criteria": {"expression": "IP"}},
//!       {"id": "den", "code": {"coding": [{"code": "denominator"}]}, "criteria": {"expression": "IP"}},
//!       {"id": "num", "code": {"coding": [{"code": "numerator"}]}, "criteria": {"expression": "Num"}}
//!     ]
//!   }]
//! }"#;
//!
//! let results = SubjectResults::new()
//!     .with("p1", EvaluationResult::new().with("IP", ResultValue::boolean(true)).with("Num", ResultValue::boolean(true)))
//!     .with("p2", EvaluationResult::new().with("IP", ResultValue::boolean(true)).with("Num", ResultValue::boolean(false)));
//!
//! let report = octofhir_measure::evaluate_json(measure, &results, MeasureEvaluationOptions::default()).unwrap();
//! assert_eq!(report.groups[0].score, Some(0.5));
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_measure_def as def;
pub use octofhir_measure_diagnostics as diagnostics;
pub use octofhir_measure_eval as eval;
pub use octofhir_measure_types as types;

// Convenience re-exports
pub use octofhir_measure_def::{Measure, MeasureDef, MeasureDefBuilder};
pub use octofhir_measure_diagnostics::{MeasureError, Result};
pub use octofhir_measure_eval::{
    ErrorPolicy, EvaluationResult, MeasureEvaluationOptions, MeasureEvaluator, MeasureResult,
    SubjectResults,
};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Build `measure` and evaluate it against `results`
pub fn evaluate(
    measure: &Measure,
    results: &SubjectResults,
    options: MeasureEvaluationOptions,
) -> Result<MeasureResult> {
    let def = MeasureDefBuilder::new().build(measure)?;
    MeasureEvaluator::new(options).evaluate(&def, results)
}

/// Like [`evaluate`], reading the measure from JSON
pub fn evaluate_json(
    measure_json: &str,
    results: &SubjectResults,
    options: MeasureEvaluationOptions,
) -> Result<MeasureResult> {
    let def = MeasureDefBuilder::new().build_from_json(measure_json)?;
    MeasureEvaluator::new(options).evaluate(&def, results)
}
