//! Measure definition model
//!
//! This crate turns a FHIR R4 `Measure` document into the immutable
//! [`MeasureDef`] model consumed by the scoring engine.
//!
//! # Example
//!
//! ```
//! use octofhir_measure_def::{Measure, MeasureDefBuilder};
//!
//! let json = r#"{
//!   "resourceType": "Measure",
//!   "id": "m1",
//!   "url": "http://example.org/Measure/m1",
//!   "scoring": {"coding": [{"code": "cohort"}]},
//!   "group": [{
//!     "population": [{
//!       "id": "ip",
//!       "code": {"coding": [{"code": "initial-population"}]},
//!       "criteria": {"language": "text/cql-identifier", "expression": "Initial Population"}
//!     }]
//!   }]
//! }"#;
//!
//! let measure: Measure = serde_json::from_str(json).unwrap();
//! let def = MeasureDefBuilder::new().build(&measure).unwrap();
//! assert_eq!(def.groups.len(), 1);
//! ```

pub mod builder;
pub mod extensions;
pub mod fhir;
pub mod model;

pub use builder::MeasureDefBuilder;
pub use fhir::*;
pub use model::*;
