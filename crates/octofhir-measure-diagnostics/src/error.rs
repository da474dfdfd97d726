//! Measure error types

use crate::{
    ErrorCode, MSR0001, MSR0002, MSR0003, MSR0004, MSR0005, MSR0006, MSR0007, MSR0008, MSR0009,
    MSR0010, MSR0100, MSR0101, MSR0102, MSR0200, MSR0201, MSR0400,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - evaluation of the measure or group cannot proceed
    Error,
    /// Warning - potential issue but evaluation continues
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context or help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Related information
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            help: None,
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            help: None,
            related: Vec::new(),
        }
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add related information
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)
    }
}

/// Related diagnostic information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedInfo {
    /// Message explaining the relationship
    pub message: String,
}

impl RelatedInfo {
    /// Create new related info
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where a basis check was performed; selects the message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasisCheck {
    /// A population criteria expression under the named scoring type
    Population { scoring: String },
    /// A value or component stratifier expression
    StratifierValue,
    /// A criteria stratifier expression, or keys of keyed function results
    StratifierCriteria,
}

impl BasisCheck {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Population { .. } => MSR0100,
            Self::StratifierValue => MSR0101,
            Self::StratifierCriteria => MSR0102,
        }
    }
}

/// Main measure error type
#[derive(Debug, Clone, Error)]
pub enum MeasureError {
    /// Malformed measure description
    #[error("{code}: {message}")]
    Definition {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Expression results disagree with the declared population basis
    #[error("{code}: {message}")]
    BasisMismatch {
        code: ErrorCode,
        message: String,
        expression: String,
        basis: String,
        measure_url: String,
        total: Vec<String>,
        matching: Vec<String>,
    },

    /// Population not allowed, or required population missing, for a scoring type
    #[error("{code}: {message}")]
    PopulationLegality {
        code: ErrorCode,
        message: String,
        scoring: String,
        population: String,
    },

    /// Measure observation results cannot be aggregated against the basis
    #[error("{code}: {message}")]
    AggregationBasis {
        code: ErrorCode,
        message: String,
        expression: Option<String>,
    },

    /// A feature the engine does not implement
    #[error("{code}: {message}")]
    Unsupported { code: ErrorCode, message: String },

    /// Input, I/O or configuration error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<MeasureError>),
}

impl MeasureError {
    /// Create a definition error
    pub fn definition(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Definition {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Scoring absent on both the group and the measure
    pub fn missing_scoring(measure_url: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0001,
            format!(
                "MeasureScoring must be specified on Group or Measure for Measure: {}",
                measure_url.as_ref()
            ),
        )
    }

    /// Unknown scoring code
    pub fn invalid_scoring(code: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0002,
            format!(
                "Measure Scoring code: {}, is not a valid Measure Scoring Type.",
                code.as_ref()
            ),
        )
    }

    /// Unknown population basis code
    pub fn invalid_basis(code: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0003,
            format!(
                "Population basis code: {}, is not a valid population basis type.",
                code.as_ref()
            ),
        )
    }

    /// Unknown population code
    pub fn invalid_population_type(code: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0004,
            format!(
                "Measure population code: {}, is not a valid Measure Population Type.",
                code.as_ref()
            ),
        )
    }

    /// Unknown aggregate method code
    pub fn invalid_aggregate_method(code: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0005,
            format!(
                "Aggregate method code: {}, is not a valid aggregate method.",
                code.as_ref()
            ),
        )
    }

    /// Improvement notation coding outside the known value set
    pub fn invalid_improvement_notation(system: impl AsRef<str>, code: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0006,
            format!(
                "ImprovementNotation Coding has invalid System: {}, code: {}, combination for Measure.",
                system.as_ref(),
                code.as_ref()
            ),
        )
    }

    /// Element without an id
    pub fn missing_id(element_type: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0007,
            format!(
                "id is required on all Elements of type: {}",
                element_type.as_ref()
            ),
        )
    }

    /// Resource without an id
    pub fn missing_resource_id(resource_type: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0007,
            format!(
                "id is required on all Resources of type: {}",
                resource_type.as_ref()
            ),
        )
    }

    /// Population, component or supplemental data element without a criteria expression
    pub fn missing_criteria(element_type: impl AsRef<str>, id: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0009,
            format!(
                "criteria expression is required on {} with id: {}",
                element_type.as_ref(),
                id.as_ref()
            ),
        )
    }

    /// Stratifier that declares neither criteria nor components, or an unknown kind
    pub fn invalid_stratifier(id: impl AsRef<str>, reason: impl AsRef<str>) -> Self {
        Self::definition(
            MSR0010,
            format!("Stratifier: {}, {}", id.as_ref(), reason.as_ref()),
        )
    }

    /// Supplemental data element without the supplemental-data usage code
    pub fn sde_usage_missing() -> Self {
        Self::definition(
            MSR0008,
            "SupplementalDataComponent usage is missing code: supplemental-data",
        )
    }

    /// Result types outside the accepted set for the declared basis
    pub fn basis_mismatch(
        check: &BasisCheck,
        expression: impl Into<String>,
        basis: impl Into<String>,
        measure_url: impl Into<String>,
        total: Vec<String>,
        matching: Vec<String>,
    ) -> Self {
        let expression = expression.into();
        let basis = basis.into();
        let measure_url = measure_url.into();
        let message = match check {
            BasisCheck::Population { scoring } => format!(
                "group expression criteria results for expression: [{}] and scoring: [{}] must fall within accepted types for population basis: [{}] for Measure: [{}] due to mismatch between total result classes: {} and matching result classes: {}",
                expression,
                scoring,
                basis,
                measure_url,
                bracketed(&total),
                bracketed(&matching)
            ),
            BasisCheck::StratifierValue => format!(
                "stratifier expression criteria results for expression: [{}] must fall within accepted types for population-basis: [{}] for Measure: [{}] due to mismatch between total result classes: {} and matching result classes: {}",
                expression,
                basis,
                measure_url,
                bracketed(&total),
                bracketed(&matching)
            ),
            BasisCheck::StratifierCriteria => format!(
                "stratifier criteria results for expression: [{}] do not match population basis: [{}] for Measure: [{}] due to mismatch between total result classes: {} and matching result classes: {}",
                expression,
                basis,
                measure_url,
                bracketed(&total),
                bracketed(&matching)
            ),
        };
        Self::BasisMismatch {
            code: check.code(),
            message,
            expression,
            basis,
            measure_url,
            total,
            matching,
        }
    }

    /// Population type outside the allowed set for a scoring type
    pub fn population_not_allowed(population: impl Into<String>, scoring: impl Into<String>) -> Self {
        let population = population.into();
        let scoring = scoring.into();
        Self::PopulationLegality {
            code: MSR0200,
            message: format!(
                "MeasurePopulationType: {}, is not a member of allowed '{}' populations.",
                population, scoring
            ),
            scoring,
            population,
        }
    }

    /// Required population absent for a scoring type
    pub fn population_missing(population: impl Into<String>, scoring: impl Into<String>) -> Self {
        let population = population.into();
        let scoring = scoring.into();
        Self::PopulationLegality {
            code: MSR0201,
            message: format!(
                "'{}' measure is missing required population: {}.",
                scoring, population
            ),
            scoring,
            population,
        }
    }

    /// Create an aggregation basis error
    pub fn aggregation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::AggregationBasis {
            code,
            message: message.into(),
            expression: None,
        }
    }

    /// Create an aggregation basis error naming the observation expression
    pub fn aggregation_for(
        code: ErrorCode,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AggregationBasis {
            code,
            message: message.into(),
            expression: Some(expression.into()),
        }
    }

    /// Component stratifier shape the engine does not evaluate
    pub fn multi_component_unsupported() -> Self {
        Self::Unsupported {
            code: MSR0400,
            message: "multi-component stratifiers are not yet supported.".to_string(),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to definition and system errors; other variants are returned unchanged
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        match self {
            Self::Definition { code, message, .. } => Self::Definition {
                code,
                message,
                context: Some(ctx.into()),
            },
            Self::System { code, message, .. } => Self::System {
                code,
                message,
                context: Some(ctx.into()),
            },
            other => other,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Definition { code, .. } => *code,
            Self::BasisMismatch { code, .. } => *code,
            Self::PopulationLegality { code, .. } => *code,
            Self::AggregationBasis { code, .. } => *code,
            Self::Unsupported { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Get the human-readable message without the code prefix
    pub fn message(&self) -> String {
        match self {
            Self::Definition { message, .. }
            | Self::BasisMismatch { message, .. }
            | Self::PopulationLegality { message, .. }
            | Self::AggregationBasis { message, .. }
            | Self::Unsupported { message, .. }
            | Self::System { message, .. } => message.clone(),
            Self::Multiple(errors) => errors
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Definition { code, message, context } | Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::BasisMismatch { code, message, expression, .. } => {
                Diagnostic::error(*code, message.clone())
                    .with_related(RelatedInfo::new(format!("expression: {}", expression)))
            }
            Self::PopulationLegality { code, message, .. } | Self::Unsupported { code, message } => {
                Diagnostic::error(*code, message.clone())
            }
            Self::AggregationBasis { code, message, expression } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(expr) = expression {
                    diag = diag.with_related(RelatedInfo::new(format!("expression: {}", expr)));
                }
                diag
            }
            Self::Multiple(errors) => {
                if let Some(first) = errors.first() {
                    let mut diag = first.to_diagnostic();
                    for other in &errors[1..] {
                        diag = diag.with_related(RelatedInfo::new(other.to_string()));
                    }
                    diag
                } else {
                    Diagnostic::error(ErrorCode::new(0), "Unknown error")
                }
            }
        }
    }
}

fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MSR0300, MSR0500};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_scoring_message() {
        let err = MeasureError::missing_scoring("http://example.org/Measure/m1");
        assert_eq!(err.code(), MSR0001);
        assert_eq!(
            err.to_string(),
            "MSR0001: MeasureScoring must be specified on Group or Measure for Measure: http://example.org/Measure/m1"
        );
    }

    #[test]
    fn test_population_basis_mismatch_message() {
        let err = MeasureError::basis_mismatch(
            &BasisCheck::Population {
                scoring: "proportion".to_string(),
            },
            "Numerator",
            "Encounter",
            "http://example.org/Measure/m1",
            vec!["Encounter".to_string(), "Boolean".to_string()],
            vec!["Encounter".to_string()],
        );
        assert_eq!(
            err.message(),
            "group expression criteria results for expression: [Numerator] and scoring: [proportion] must fall within accepted types for population basis: [Encounter] for Measure: [http://example.org/Measure/m1] due to mismatch between total result classes: [Encounter, Boolean] and matching result classes: [Encounter]"
        );
        assert!(err.code().is_basis_error());
    }

    #[test]
    fn test_legality_messages() {
        let err = MeasureError::population_missing("denominator", "ratio");
        assert_eq!(
            err.message(),
            "'ratio' measure is missing required population: denominator."
        );

        let err = MeasureError::population_not_allowed("measure-observation", "proportion");
        assert_eq!(
            err.message(),
            "MeasurePopulationType: measure-observation, is not a member of allowed 'proportion' populations."
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = MeasureError::multi_component_unsupported().to_diagnostic();
        assert_eq!(
            diag.to_string(),
            "error: MSR0400 - multi-component stratifiers are not yet supported."
        );
    }

    #[test]
    fn test_context_and_related() {
        let err = MeasureError::system(MSR0500, "bad json").with_context("results.json");
        assert_eq!(err.to_diagnostic().help.as_deref(), Some("results.json"));

        let err = MeasureError::aggregation_for(MSR0300, "MeasureObservation", "shape");
        assert_eq!(err.to_diagnostic().related.len(), 1);

        let multiple = MeasureError::Multiple(vec![
            MeasureError::invalid_scoring("bogus"),
            MeasureError::sde_usage_missing(),
        ]);
        assert_eq!(multiple.code(), MSR0002);
        assert_eq!(multiple.to_diagnostic().related.len(), 1);
    }

    #[test]
    fn test_diagnostic_serializes_camel_case() {
        let diag = Diagnostic::warning(MSR0008, "usage").with_help("add usage");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["help"], "add usage");
        assert!(json.get("related").is_none());
    }
}
