//! Quality measure scoring engine
//!
//! Takes a validated [`MeasureDef`](octofhir_measure_def::MeasureDef) and the
//! per-subject results of an expression evaluator, and produces population
//! counts, scores and strata for every group.
//!
//! ```
//! use octofhir_measure_def::MeasureDefBuilder;
//! use octofhir_measure_eval::{EvaluationResult, MeasureEvaluator, SubjectResults};
//! use octofhir_measure_types::{MeasurePopulationType, ResultValue};
//!
//! let measure = MeasureDefBuilder::new()
//!     .build_from_json(r#"{
//!         "resourceType": "Measure",
//!         "id": "cohort",
//!         "url": "http://example.com/Measure/cohort",
//!         "scoring": {"coding": [{"code": "cohort"}]},
//!         "group": [{
//!             "id": "g1",
//!             "population": [{
//!                 "id": "ip",
//!                 "code": {"coding": [{"code": "initial-population"}]},
//!                 "criteria": {"language": "text/cql-identifier", "expression": "Initial Population"}
//!             }]
//!         }]
//!     }"#)
//!     .unwrap();
//!
//! let results = SubjectResults::new()
//!     .with("p1", EvaluationResult::new().with("Initial Population", ResultValue::boolean(true)))
//!     .with("p2", EvaluationResult::new().with("Initial Population", ResultValue::boolean(false)));
//!
//! let report = MeasureEvaluator::default().evaluate(&measure, &results).unwrap();
//! assert_eq!(report.groups[0].count(MeasurePopulationType::InitialPopulation), 1);
//! assert_eq!(report.groups[0].score, None);
//! ```

pub mod aggregate;
pub mod basis;
pub mod evaluation;
pub mod evaluator;
pub mod observation;
pub mod options;
pub mod population;
pub mod result;
pub mod scoring;
pub mod scoring_types;
pub mod stratifier;

pub use aggregate::aggregate;
pub use evaluation::{EvaluationResult, SubjectResults};
pub use evaluator::MeasureEvaluator;
pub use options::{ErrorPolicy, MeasureEvaluationOptions};
pub use result::*;
