//! Measure definition builder
//!
//! Resolution order for per-group settings:
//! - scoring: group extension, then `Measure.scoring`, otherwise an error
//! - population basis: group extension, then measure extension, then `boolean`
//! - improvement notation: group extension, then `Measure.improvementNotation`,
//!   then `increase`

use crate::extensions::{
    self, AGGREGATE_METHOD_URL, CRITERIA_REFERENCE_URL, IMPROVEMENT_NOTATION_URL,
    POPULATION_BASIS_URL, SCORING_URL, SDE_USAGE_CODE, STRATIFIER_KIND_URL,
    SUPPORTING_EVIDENCE_URL,
};
use crate::fhir::{
    CodeableConcept, Extension, Measure, MeasureGroup, MeasureGroupPopulation,
    MeasureGroupStratifier, MeasureSupplementalData,
};
use crate::model::{
    GroupDef, MeasureDef, PopulationDef, SdeDef, StratifierComponentDef, StratifierDef,
    SupportingEvidenceDef,
};
use octofhir_measure_diagnostics::{MeasureError, Result};
use octofhir_measure_types::{
    AggregateMethod, ImprovementNotation, MeasureCode, MeasureConcept, MeasurePopulationType,
    MeasureScoring, PopulationBasis, StratifierKind,
};

/// Builds [`MeasureDef`]s from FHIR R4 `Measure` documents
#[derive(Debug, Clone, Default)]
pub struct MeasureDefBuilder {
    _private: (),
}

/// Measure-level values groups fall back to
struct MeasureDefaults<'a> {
    url: &'a str,
    scoring: Option<MeasureScoring>,
    basis: PopulationBasis,
    improvement_notation: Option<ImprovementNotation>,
}

impl MeasureDefBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and build in one step
    pub fn build_from_json(&self, json: &str) -> Result<MeasureDef> {
        let measure: Measure = serde_json::from_str(json).map_err(|e| {
            MeasureError::system(
                octofhir_measure_diagnostics::MSR0500,
                format!("Invalid Measure document: {}", e),
            )
        })?;
        self.build(&measure)
    }

    /// Build the definition model
    pub fn build(&self, measure: &Measure) -> Result<MeasureDef> {
        let id = non_blank(measure.id.as_deref())
            .ok_or_else(|| MeasureError::missing_resource_id("Measure"))?
            .to_string();
        let url = measure.url.clone().unwrap_or_default();
        let display_url = if url.is_empty() { id.as_str() } else { url.as_str() };

        let sdes = measure
            .supplemental_data
            .iter()
            .map(build_sde)
            .collect::<Result<Vec<_>>>()?;

        let defaults = MeasureDefaults {
            url: display_url,
            scoring: measure_scoring(measure)?,
            basis: basis_from_extensions(&measure.extension)?.unwrap_or_default(),
            improvement_notation: measure
                .improvement_notation
                .as_ref()
                .map(parse_improvement_notation)
                .transpose()?,
        };

        let groups = measure
            .group
            .iter()
            .map(|group| build_group(group, &defaults))
            .collect::<Result<Vec<_>>>()?;

        let use_measure_improvement_notation =
            groups.is_empty() || !groups.iter().all(|g| g.improvement_notation_from_group);

        log::debug!(
            "built measure definition {} with {} group(s) and {} supplemental data element(s)",
            display_url,
            groups.len(),
            sdes.len()
        );

        let MeasureDefaults {
            basis: population_basis,
            improvement_notation,
            ..
        } = defaults;

        Ok(MeasureDef {
            improvement_notation,
            population_basis,
            id,
            url,
            version: measure.version.clone(),
            use_measure_improvement_notation,
            groups,
            sdes,
        })
    }
}

// ============================================================================
// Measure-level resolution
// ============================================================================

fn measure_scoring(measure: &Measure) -> Result<Option<MeasureScoring>> {
    match measure.scoring.as_ref().and_then(CodeableConcept::first_code) {
        Some(code) => MeasureScoring::from_code(code)
            .map(Some)
            .ok_or_else(|| MeasureError::invalid_scoring(code)),
        None => Ok(None),
    }
}

fn basis_from_extensions(exts: &[Extension]) -> Result<Option<PopulationBasis>> {
    match extensions::find(exts, POPULATION_BASIS_URL).and_then(Extension::text_value) {
        Some(code) => PopulationBasis::from_code(code)
            .map(Some)
            .ok_or_else(|| MeasureError::invalid_basis(code)),
        None => Ok(None),
    }
}

fn parse_improvement_notation(concept: &CodeableConcept) -> Result<ImprovementNotation> {
    let coding = concept.first();
    let system = coding.and_then(|c| c.system.as_deref());
    let code = coding.and_then(|c| c.code.as_deref());
    ImprovementNotation::from_coding(system, code).ok_or_else(|| {
        MeasureError::invalid_improvement_notation(system.unwrap_or("null"), code.unwrap_or("null"))
    })
}

// ============================================================================
// Groups
// ============================================================================

fn build_group(group: &MeasureGroup, defaults: &MeasureDefaults<'_>) -> Result<GroupDef> {
    let scoring = match extensions::find(&group.extension, SCORING_URL).and_then(Extension::text_value) {
        Some(code) => MeasureScoring::from_code(code).ok_or_else(|| MeasureError::invalid_scoring(code))?,
        None => defaults
            .scoring
            .ok_or_else(|| MeasureError::missing_scoring(defaults.url))?,
    };

    let population_basis = basis_from_extensions(&group.extension)?
        .unwrap_or_else(|| defaults.basis.clone());

    let group_notation = extensions::find(&group.extension, IMPROVEMENT_NOTATION_URL)
        .and_then(|e| e.value_codeable_concept.as_ref())
        .map(parse_improvement_notation)
        .transpose()?;
    let improvement_notation_from_group = group_notation.is_some();
    let improvement_notation = group_notation
        .or(defaults.improvement_notation)
        .unwrap_or_default();

    let populations = group
        .population
        .iter()
        .map(build_population)
        .collect::<Result<Vec<_>>>()?;

    let stratifiers = group
        .stratifier
        .iter()
        .map(build_stratifier)
        .collect::<Result<Vec<_>>>()?;

    Ok(GroupDef {
        id: non_blank(group.id.as_deref()).map(str::to_string),
        code: group.code.as_ref().map(to_concept),
        scoring,
        population_basis,
        improvement_notation,
        improvement_notation_from_group,
        populations,
        stratifiers,
    })
}

fn build_population(population: &MeasureGroupPopulation) -> Result<PopulationDef> {
    let id = required_id(population.id.as_deref(), "Measure.group.population")?;

    let code = population
        .code
        .as_ref()
        .and_then(CodeableConcept::first_code)
        .unwrap_or("");
    let population_type = MeasurePopulationType::from_code(code)
        .ok_or_else(|| MeasureError::invalid_population_type(code))?;

    let expression = population
        .criteria
        .as_ref()
        .and_then(|c| c.text())
        .ok_or_else(|| MeasureError::missing_criteria("Measure.group.population", &id))?
        .to_string();

    let aggregate_method = match extensions::find(&population.extension, AGGREGATE_METHOD_URL)
        .and_then(Extension::text_value)
    {
        Some(code) => Some(
            AggregateMethod::from_code(code)
                .ok_or_else(|| MeasureError::invalid_aggregate_method(code))?,
        ),
        None => None,
    };

    let criteria_reference = extensions::find(&population.extension, CRITERIA_REFERENCE_URL)
        .and_then(Extension::text_value)
        .map(str::to_string);

    let supporting_evidence = extensions::find_all(&population.extension, SUPPORTING_EVIDENCE_URL)
        .filter_map(|ext| {
            let expr = ext.value_expression.as_ref()?;
            let expression = expr.text()?.to_string();
            Some(SupportingEvidenceDef {
                name: expr.name.clone().unwrap_or_else(|| expression.clone()),
                description: expr.description.clone(),
                expression,
            })
        })
        .collect();

    Ok(PopulationDef {
        id,
        code: population.code.as_ref().map(to_concept),
        population_type,
        expression,
        aggregate_method,
        criteria_reference,
        supporting_evidence,
    })
}

fn build_stratifier(stratifier: &MeasureGroupStratifier) -> Result<StratifierDef> {
    let id = required_id(stratifier.id.as_deref(), "Measure.group.stratifier")?;

    let components = stratifier
        .component
        .iter()
        .map(|component| {
            let component_id =
                required_id(component.id.as_deref(), "Measure.group.stratifier.component")?;
            let expression = component
                .criteria
                .as_ref()
                .and_then(|c| c.text())
                .ok_or_else(|| {
                    MeasureError::missing_criteria("Measure.group.stratifier.component", &component_id)
                })?
                .to_string();
            Ok(StratifierComponentDef {
                id: component_id,
                code: component.code.as_ref().map(to_concept),
                expression,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let expression = stratifier
        .criteria
        .as_ref()
        .and_then(|c| c.text())
        .map(str::to_string);

    let kind = if !components.is_empty() {
        StratifierKind::Component
    } else {
        if expression.is_none() {
            return Err(MeasureError::invalid_stratifier(
                &id,
                "must declare a criteria expression or components",
            ));
        }
        match extensions::find(&stratifier.extension, STRATIFIER_KIND_URL)
            .and_then(Extension::text_value)
        {
            None | Some("value") => StratifierKind::Value,
            Some("criteria") => StratifierKind::Criteria,
            Some(other) => {
                return Err(MeasureError::invalid_stratifier(
                    &id,
                    format!("unknown stratifier kind: {}", other),
                ));
            }
        }
    };

    Ok(StratifierDef {
        id,
        code: stratifier.code.as_ref().map(to_concept),
        kind,
        expression,
        components,
    })
}

// ============================================================================
// Supplemental data
// ============================================================================

fn build_sde(sde: &MeasureSupplementalData) -> Result<SdeDef> {
    let id = required_id(sde.id.as_deref(), "Measure.supplementalData")?;
    if !sde.usage.iter().any(|u| u.has_code(SDE_USAGE_CODE)) {
        return Err(MeasureError::sde_usage_missing());
    }
    let expression = sde
        .criteria
        .as_ref()
        .and_then(|c| c.text())
        .ok_or_else(|| MeasureError::missing_criteria("Measure.supplementalData", &id))?
        .to_string();
    Ok(SdeDef {
        id,
        code: sde.code.as_ref().map(to_concept),
        expression,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_id(id: Option<&str>, element_type: &str) -> Result<String> {
    non_blank(id)
        .map(str::to_string)
        .ok_or_else(|| MeasureError::missing_id(element_type))
}

fn to_concept(concept: &CodeableConcept) -> MeasureConcept {
    MeasureConcept {
        codes: concept
            .coding
            .iter()
            .filter_map(|c| {
                Some(MeasureCode {
                    code: c.code.clone()?,
                    system: c.system.clone(),
                    display: c.display.clone(),
                })
            })
            .collect(),
        text: concept.text.clone(),
    }
}
