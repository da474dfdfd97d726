//! Immutable measure definition model
//!
//! Built once by [`crate::MeasureDefBuilder`] and shared read-only by every
//! evaluation; scoring never mutates these structures.

use octofhir_measure_types::{
    AggregateMethod, ImprovementNotation, MeasureConcept, MeasurePopulationType, MeasureScoring,
    PopulationBasis, StratifierKind,
};
use serde::Serialize;

/// A validated measure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDef {
    pub id: String,
    /// Canonical url; empty when the document has none
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Measure-level improvement notation, if declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_notation: Option<ImprovementNotation>,
    /// False only when every group declares its own improvement notation
    pub use_measure_improvement_notation: bool,
    /// Measure-level population basis
    pub population_basis: PopulationBasis,
    pub groups: Vec<GroupDef>,
    pub sdes: Vec<SdeDef>,
}

impl MeasureDef {
    /// Url used in diagnostics, falling back to the id
    pub fn display_url(&self) -> &str {
        if self.url.is_empty() { &self.id } else { &self.url }
    }
}

/// A population group with its resolved scoring, basis and notation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub scoring: MeasureScoring,
    pub population_basis: PopulationBasis,
    pub improvement_notation: ImprovementNotation,
    /// Whether the notation came from the group's own extension
    pub improvement_notation_from_group: bool,
    pub populations: Vec<PopulationDef>,
    pub stratifiers: Vec<StratifierDef>,
}

impl GroupDef {
    /// First population of the given type
    pub fn population(&self, population_type: MeasurePopulationType) -> Option<&PopulationDef> {
        self.populations
            .iter()
            .find(|p| p.population_type == population_type)
    }

    /// All populations of the given type, in declaration order
    pub fn populations_of(
        &self,
        population_type: MeasurePopulationType,
    ) -> impl Iterator<Item = &PopulationDef> {
        self.populations
            .iter()
            .filter(move |p| p.population_type == population_type)
    }

    /// Population with the given id
    pub fn population_by_id(&self, id: &str) -> Option<&PopulationDef> {
        self.populations.iter().find(|p| p.id == id)
    }

    pub fn has_population(&self, population_type: MeasurePopulationType) -> bool {
        self.population(population_type).is_some()
    }

    pub fn is_boolean_basis(&self) -> bool {
        self.population_basis.is_boolean()
    }

    /// Label for logs and results: the id, or the 1-based position
    pub fn label(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("group-{}", index + 1))
    }
}

/// A population and the expression that selects its members
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationDef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub population_type: MeasurePopulationType,
    /// Criteria expression name
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_method: Option<AggregateMethod>,
    /// Id of the observed population, for measure observations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_reference: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supporting_evidence: Vec<SupportingEvidenceDef>,
}

/// Supporting evidence expression attached to a population
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingEvidenceDef {
    pub name: String,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A stratifier: value, criteria or component based
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratifierDef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub kind: StratifierKind,
    /// Stratifier-level expression; required for value and criteria kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<StratifierComponentDef>,
}

/// One component of a component stratifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratifierComponentDef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub expression: String,
}

/// A supplemental data element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdeDef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub expression: String,
}
