//! Quality measure type system
//!
//! This crate defines the vocabulary shared by the measure definition model and
//! the scoring engine:
//! - [`ResultValue`], the runtime representation of expression results
//! - Closed code enums (scoring, population type, basis, improvement notation,
//!   aggregate method) with their legality tables
//! - The FHIR R4 resource type hierarchy used for population basis conformance

pub mod codes;
pub mod resource_types;
pub mod value;

pub use codes::*;
pub use resource_types::{canonical_name, conforms_to, is_resource_type};
pub use value::*;
