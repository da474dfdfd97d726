//! Closed code enums for measure definitions
//!
//! Every enum round-trips through its FHIR code via `from_code` / `to_code`.
//! Scoring types carry their population legality tables as `const` slices.

use crate::resource_types::is_resource_type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Code system for measure scoring
pub const MEASURE_SCORING_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/measure-scoring";
/// Code system for measure population types
pub const MEASURE_POPULATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/measure-population";
/// Code system for improvement notation
pub const IMPROVEMENT_NOTATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/measure-improvement-notation";
/// Code system for measure data usage
pub const MEASURE_DATA_USAGE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/measure-data-usage";

// ============================================================================
// Measure Scoring
// ============================================================================

/// Scoring algorithm of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasureScoring {
    Proportion,
    Ratio,
    ContinuousVariable,
    Cohort,
}

impl MeasureScoring {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "proportion" => Some(Self::Proportion),
            "ratio" => Some(Self::Ratio),
            "continuous-variable" => Some(Self::ContinuousVariable),
            "cohort" => Some(Self::Cohort),
            _ => None,
        }
    }

    pub const fn to_code(&self) -> &'static str {
        match self {
            Self::Proportion => "proportion",
            Self::Ratio => "ratio",
            Self::ContinuousVariable => "continuous-variable",
            Self::Cohort => "cohort",
        }
    }

    /// Populations a group of this scoring type may declare
    pub const fn allowed_populations(&self) -> &'static [MeasurePopulationType] {
        use MeasurePopulationType::*;
        match self {
            Self::Proportion => &[
                InitialPopulation,
                Denominator,
                DenominatorExclusion,
                DenominatorException,
                NumeratorExclusion,
                Numerator,
            ],
            Self::Ratio => &[
                InitialPopulation,
                Denominator,
                DenominatorExclusion,
                NumeratorExclusion,
                Numerator,
                MeasureObservation,
            ],
            Self::ContinuousVariable => &[
                InitialPopulation,
                MeasurePopulation,
                MeasurePopulationExclusion,
                MeasureObservation,
            ],
            Self::Cohort => &[InitialPopulation],
        }
    }

    /// Populations a group of this scoring type must declare
    pub const fn required_populations(&self) -> &'static [MeasurePopulationType] {
        use MeasurePopulationType::*;
        match self {
            Self::Proportion | Self::Ratio => &[InitialPopulation, Denominator, Numerator],
            Self::ContinuousVariable => &[InitialPopulation, MeasurePopulation],
            Self::Cohort => &[InitialPopulation],
        }
    }

    /// Whether this scoring type produces a numerator/denominator score
    pub const fn is_proportional(&self) -> bool {
        matches!(self, Self::Proportion | Self::Ratio)
    }
}

impl fmt::Display for MeasureScoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

// ============================================================================
// Population Types
// ============================================================================

/// Role of a population within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurePopulationType {
    InitialPopulation,
    Numerator,
    NumeratorExclusion,
    Denominator,
    DenominatorExclusion,
    DenominatorException,
    MeasurePopulation,
    MeasurePopulationExclusion,
    MeasureObservation,
}

impl MeasurePopulationType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "initial-population" => Some(Self::InitialPopulation),
            "numerator" => Some(Self::Numerator),
            "numerator-exclusion" => Some(Self::NumeratorExclusion),
            "denominator" => Some(Self::Denominator),
            "denominator-exclusion" => Some(Self::DenominatorExclusion),
            "denominator-exception" => Some(Self::DenominatorException),
            "measure-population" => Some(Self::MeasurePopulation),
            "measure-population-exclusion" => Some(Self::MeasurePopulationExclusion),
            "measure-observation" => Some(Self::MeasureObservation),
            _ => None,
        }
    }

    pub const fn to_code(&self) -> &'static str {
        match self {
            Self::InitialPopulation => "initial-population",
            Self::Numerator => "numerator",
            Self::NumeratorExclusion => "numerator-exclusion",
            Self::Denominator => "denominator",
            Self::DenominatorExclusion => "denominator-exclusion",
            Self::DenominatorException => "denominator-exception",
            Self::MeasurePopulation => "measure-population",
            Self::MeasurePopulationExclusion => "measure-population-exclusion",
            Self::MeasureObservation => "measure-observation",
        }
    }
}

impl fmt::Display for MeasurePopulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

// ============================================================================
// Population Basis
// ============================================================================

/// What a population member is: the subject (`boolean`) or a resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PopulationBasis {
    #[default]
    Boolean,
    Resource(String),
}

impl PopulationBasis {
    /// Parse a basis code; `boolean` or a known resource type name
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "boolean" => Some(Self::Boolean),
            other if is_resource_type(other) => Some(Self::Resource(other.to_string())),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &str {
        match self {
            Self::Boolean => "boolean",
            Self::Resource(name) => name,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }
}

impl fmt::Display for PopulationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

impl From<PopulationBasis> for String {
    fn from(basis: PopulationBasis) -> Self {
        basis.to_code().to_string()
    }
}

impl TryFrom<String> for PopulationBasis {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code).ok_or_else(|| format!("invalid population basis: {}", code))
    }
}

// ============================================================================
// Improvement Notation
// ============================================================================

/// Direction of improvement; informational only, never alters arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementNotation {
    #[default]
    Increase,
    Decrease,
}

impl ImprovementNotation {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "increase" => Some(Self::Increase),
            "decrease" => Some(Self::Decrease),
            _ => None,
        }
    }

    /// Parse a coding; the system must be the improvement notation system
    pub fn from_coding(system: Option<&str>, code: Option<&str>) -> Option<Self> {
        if system != Some(IMPROVEMENT_NOTATION_SYSTEM) {
            return None;
        }
        code.and_then(Self::from_code)
    }

    pub const fn to_code(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl fmt::Display for ImprovementNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

// ============================================================================
// Aggregate Method
// ============================================================================

/// How measure observation values are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMethod {
    Count,
    Sum,
    #[serde(rename = "avg")]
    Average,
    #[serde(rename = "min")]
    Minimum,
    #[serde(rename = "max")]
    Maximum,
    Median,
}

impl AggregateMethod {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" | "average" => Some(Self::Average),
            "min" | "minimum" => Some(Self::Minimum),
            "max" | "maximum" => Some(Self::Maximum),
            "median" => Some(Self::Median),
            _ => None,
        }
    }

    pub const fn to_code(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Average => "avg",
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for AggregateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_code())
    }
}

// ============================================================================
// Stratifier Kind
// ============================================================================

/// How a stratifier partitions a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StratifierKind {
    /// One stratum per distinct expression value
    Value,
    /// A single stratum intersecting populations with the expression results
    Criteria,
    /// One stratum per distinct combination of component values
    Component,
}

impl fmt::Display for StratifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Criteria => write!(f, "criteria"),
            Self::Component => write!(f, "component"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("proportion", MeasureScoring::Proportion)]
    #[case("ratio", MeasureScoring::Ratio)]
    #[case("continuous-variable", MeasureScoring::ContinuousVariable)]
    #[case("cohort", MeasureScoring::Cohort)]
    fn test_scoring_codes(#[case] code: &str, #[case] expected: MeasureScoring) {
        assert_eq!(MeasureScoring::from_code(code), Some(expected));
        assert_eq!(expected.to_code(), code);
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(MeasureScoring::from_code("composite"), None);
        assert_eq!(MeasurePopulationType::from_code("numerator-exception"), None);
        assert_eq!(AggregateMethod::from_code("mode"), None);
        assert_eq!(PopulationBasis::from_code("NotAResource"), None);
    }

    #[test]
    fn test_required_is_subset_of_allowed() {
        for scoring in [
            MeasureScoring::Proportion,
            MeasureScoring::Ratio,
            MeasureScoring::ContinuousVariable,
            MeasureScoring::Cohort,
        ] {
            for required in scoring.required_populations() {
                assert!(scoring.allowed_populations().contains(required));
            }
        }
    }

    #[test]
    fn test_legality_tables() {
        assert!(!MeasureScoring::Ratio
            .allowed_populations()
            .contains(&MeasurePopulationType::DenominatorException));
        assert!(!MeasureScoring::Proportion
            .allowed_populations()
            .contains(&MeasurePopulationType::MeasureObservation));
        assert_eq!(MeasureScoring::Cohort.allowed_populations().len(), 1);
    }

    #[test]
    fn test_population_basis() {
        assert_eq!(PopulationBasis::from_code("boolean"), Some(PopulationBasis::Boolean));
        assert_eq!(
            PopulationBasis::from_code("Encounter"),
            Some(PopulationBasis::Resource("Encounter".to_string()))
        );
        assert_eq!(PopulationBasis::default().to_string(), "boolean");

        let json = serde_json::to_value(PopulationBasis::Resource("Encounter".into())).unwrap();
        assert_eq!(json, serde_json::json!("Encounter"));
    }

    #[test]
    fn test_improvement_notation_coding() {
        assert_eq!(
            ImprovementNotation::from_coding(Some(IMPROVEMENT_NOTATION_SYSTEM), Some("decrease")),
            Some(ImprovementNotation::Decrease)
        );
        assert_eq!(
            ImprovementNotation::from_coding(Some("http://example.org"), Some("increase")),
            None
        );
        assert_eq!(ImprovementNotation::default(), ImprovementNotation::Increase);
    }

    #[rstest]
    #[case("avg", AggregateMethod::Average)]
    #[case("average", AggregateMethod::Average)]
    #[case("median", AggregateMethod::Median)]
    #[case("min", AggregateMethod::Minimum)]
    fn test_aggregate_method_codes(#[case] code: &str, #[case] expected: AggregateMethod) {
        assert_eq!(AggregateMethod::from_code(code), Some(expected));
    }
}
