//! Evaluation output handed to report assembly

use octofhir_measure_diagnostics::Diagnostic;
use octofhir_measure_types::{
    AggregateMethod, ImprovementNotation, MeasureConcept, MeasurePopulationType, MeasureScoring,
    PopulationBasis, ResourceRef, ResultValue, StratifierKind,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::scoring::ProportionCounts;

/// Result of evaluating every group of a measure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureResult {
    pub measure_id: String,
    pub measure_url: String,
    /// Measure-level notation, when it applies to the report as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_notation: Option<ImprovementNotation>,
    pub groups: Vec<GroupResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sdes: Vec<SdeResult>,
    /// Group failures captured under the collecting error policy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GroupError>,
}

impl MeasureResult {
    pub fn group(&self, id: &str) -> Option<&GroupResult> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A group that failed to evaluate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupError {
    pub group_index: usize,
    pub group_id: String,
    pub diagnostic: Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub scoring: MeasureScoring,
    pub population_basis: PopulationBasis,
    pub improvement_notation: ImprovementNotation,
    pub populations: Vec<PopulationResult>,
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stratifiers: Vec<StratifierResult>,
}

impl GroupResult {
    /// First population result of the given type
    pub fn population(&self, population_type: MeasurePopulationType) -> Option<&PopulationResult> {
        self.populations
            .iter()
            .find(|p| p.population_type == population_type)
    }

    /// Count of the first population of the given type, zero when absent
    pub fn count(&self, population_type: MeasurePopulationType) -> usize {
        self.population(population_type).map_or(0, |p| p.count)
    }

    pub fn stratifier(&self, id: &str) -> Option<&StratifierResult> {
        self.stratifiers.iter().find(|s| s.id == id)
    }

    fn proportion_counts(&self) -> ProportionCounts {
        ProportionCounts::from_counts(|ty| self.count(ty))
    }

    /// Numerator count less numerator exclusions
    pub fn effective_numerator(&self) -> usize {
        self.proportion_counts().effective_numerator()
    }

    /// Denominator count less exclusions and exceptions
    pub fn effective_denominator(&self) -> usize {
        self.proportion_counts().effective_denominator()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationResult {
    pub id: String,
    pub population_type: MeasurePopulationType,
    pub expression: String,
    /// Subjects for a boolean basis, resources for a resource basis,
    /// observations for a measure observation
    pub count: usize,
    pub subjects: Vec<ResourceRef>,
    /// Resource members; empty for a boolean basis
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ResultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_method: Option<AggregateMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_result: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_reference: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supporting_evidence: Vec<SupportingEvidenceResult>,
}

/// Raw per-subject values of a supporting evidence expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingEvidenceResult {
    pub name: String,
    pub expression: String,
    pub values: Vec<SubjectValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectValue {
    pub subject: ResourceRef,
    pub value: ResultValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratifierResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub kind: StratifierKind,
    pub strata: Vec<StratumResult>,
}

impl StratifierResult {
    /// Stratum whose single value equals `value`
    pub fn stratum(&self, value: &ResultValue) -> Option<&StratumResult> {
        self.strata.iter().find(|s| s.value.as_ref() == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratumResult {
    /// Value of a value stratifier; absent for criteria and component strata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ResultValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<StratumComponentValue>,
    pub populations: Vec<StratumPopulationResult>,
    pub score: Option<f64>,
}

impl StratumResult {
    pub fn population(&self, population_type: MeasurePopulationType) -> Option<&StratumPopulationResult> {
        self.populations
            .iter()
            .find(|p| p.population_type == population_type)
    }

    pub fn count(&self, population_type: MeasurePopulationType) -> usize {
        self.population(population_type).map_or(0, |p| p.count)
    }

    fn proportion_counts(&self) -> ProportionCounts {
        ProportionCounts::from_counts(|ty| self.count(ty))
    }

    pub fn effective_numerator(&self) -> usize {
        self.proportion_counts().effective_numerator()
    }

    pub fn effective_denominator(&self) -> usize {
        self.proportion_counts().effective_denominator()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratumComponentValue {
    pub id: String,
    pub value: ResultValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StratumPopulationResult {
    pub id: String,
    pub population_type: MeasurePopulationType,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_result: Option<Decimal>,
}

/// Raw values of a supplemental data element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdeResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<MeasureConcept>,
    pub expression: String,
    pub values: Vec<SubjectValue>,
}
