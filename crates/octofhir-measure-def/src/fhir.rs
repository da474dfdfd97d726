//! FHIR R4 `Measure` document structures
//!
//! Only the elements the definition builder reads are modelled; unknown
//! elements are ignored on deserialization.

use serde::{Deserialize, Serialize};

// ============================================================================
// Measure
// ============================================================================

/// FHIR R4 Measure resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// Always `Measure`
    #[serde(default = "measure_resource_type")]
    pub resource_type: String,
    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Canonical url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Business version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Computer friendly name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Measure-level scoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<CodeableConcept>,
    /// Measure-level improvement notation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_notation: Option<CodeableConcept>,
    /// Extensions (population basis, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    /// Population groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<MeasureGroup>,
    /// Supplemental data elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental_data: Vec<MeasureSupplementalData>,
}

fn measure_resource_type() -> String {
    "Measure".to_string()
}

/// Measure.group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Group-level scoring, basis and improvement notation overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub population: Vec<MeasureGroupPopulation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stratifier: Vec<MeasureGroupStratifier>,
}

/// Measure.group.population
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureGroupPopulation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Expression>,
    /// Aggregate method, criteria reference and supporting evidence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// Measure.group.stratifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureGroupStratifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<MeasureGroupStratifierComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// Measure.group.stratifier.component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureGroupStratifierComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Expression>,
}

/// Measure.supplementalData
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureSupplementalData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Expression>,
}

// ============================================================================
// Data Types
// ============================================================================

/// FHIR CodeableConcept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Single-coding concept
    pub fn from_code(system: Option<&str>, code: &str) -> Self {
        Self {
            coding: vec![Coding {
                system: system.map(str::to_string),
                code: Some(code.to_string()),
                ..Coding::default()
            }],
            text: None,
        }
    }

    /// First coding, if any
    pub fn first(&self) -> Option<&Coding> {
        self.coding.first()
    }

    /// Code of the first coding
    pub fn first_code(&self) -> Option<&str> {
        self.first().and_then(|c| c.code.as_deref())
    }

    /// Whether any coding carries `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.coding.iter().any(|c| c.code.as_deref() == Some(code))
    }
}

/// FHIR Coding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// FHIR Expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Expression {
    /// CQL identifier expression
    pub fn cql(expression: impl Into<String>) -> Self {
        Self {
            language: Some("text/cql-identifier".to_string()),
            expression: Some(expression.into()),
            ..Self::default()
        }
    }

    /// Non-blank expression text
    pub fn text(&self) -> Option<&str> {
        self.expression
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// FHIR Extension with the value types measure extensions use
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Extension {
    /// Extension with a `valueCode`
    pub fn code(url: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value_code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Extension with a `valueString`
    pub fn string(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value_string: Some(value.into()),
            ..Self::default()
        }
    }

    /// Extension with a `valueCodeableConcept`
    pub fn concept(url: impl Into<String>, value: CodeableConcept) -> Self {
        Self {
            url: url.into(),
            value_codeable_concept: Some(value),
            ..Self::default()
        }
    }

    /// Extension with a `valueExpression`
    pub fn expression(url: impl Into<String>, value: Expression) -> Self {
        Self {
            url: url.into(),
            value_expression: Some(value),
            ..Self::default()
        }
    }

    /// Textual value: `valueCode`, then `valueString`, then the first code of
    /// `valueCodeableConcept`
    pub fn text_value(&self) -> Option<&str> {
        self.value_code
            .as_deref()
            .or(self.value_string.as_deref())
            .or_else(|| {
                self.value_codeable_concept
                    .as_ref()
                    .and_then(CodeableConcept::first_code)
            })
    }
}
