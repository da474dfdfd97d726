//! Measure observation collection
//!
//! Observation functions are evaluated per population member. For a resource
//! basis the evaluator hands over a map from the observed resource to the
//! function result; for a boolean basis a single value per subject.

use octofhir_measure_def::{GroupDef, PopulationDef};
use octofhir_measure_diagnostics::{
    MSR0300, MSR0301, MSR0302, MSR0303, MSR0304, MeasureError, Result,
};
use octofhir_measure_types::{
    AggregateMethod, MeasurePopulationType, PopulationBasis, ResultValue,
};

use crate::basis::conforms_to_basis;
use crate::evaluation::{EvaluationResult, SubjectResults, subject_ref};
use crate::population::{Observation, SubjectMembers};

/// Observation populations of a ratio group, resolved through their criteria references
#[derive(Debug, Clone, Copy)]
pub struct RatioObservations<'a> {
    pub numerator: &'a PopulationDef,
    pub denominator: &'a PopulationDef,
}

/// Resolve the observation pair of a ratio group; `None` for a plain ratio
pub fn resolve_ratio_observations(group: &GroupDef) -> Result<Option<RatioObservations<'_>>> {
    let observations: Vec<&PopulationDef> = group
        .populations_of(MeasurePopulationType::MeasureObservation)
        .collect();
    if observations.is_empty() {
        return Ok(None);
    }
    if observations.len() != 2 {
        return Err(MeasureError::aggregation(
            MSR0303,
            format!(
                "Ratio Continuous Variable requires 2 Measure Observations defined, you have: {}",
                observations.len()
            ),
        ));
    }

    let numerator = observing(group, &observations, MeasurePopulationType::Numerator)?;
    let denominator = observing(group, &observations, MeasurePopulationType::Denominator)?;
    Ok(Some(RatioObservations {
        numerator,
        denominator,
    }))
}

/// Observation whose criteria reference names the `target` population
fn observing<'a>(
    group: &'a GroupDef,
    observations: &[&'a PopulationDef],
    target: MeasurePopulationType,
) -> Result<&'a PopulationDef> {
    let target_id = group.population(target).map(|p| p.id.as_str());
    for observation in observations {
        let reference = observation.criteria_reference.as_deref().ok_or_else(|| {
            MeasureError::aggregation_for(
                MSR0304,
                &observation.expression,
                format!("Criteria reference is null on population: {}", observation.id),
            )
        })?;
        if Some(reference) == target_id {
            return Ok(*observation);
        }
    }
    Err(MeasureError::aggregation(
        MSR0304,
        format!(
            "No measure observation references the {} population",
            target.to_code()
        ),
    ))
}

/// Check that a continuous variable observation references a population of its group
pub fn validate_criteria_reference(group: &GroupDef, observation: &PopulationDef) -> Result<()> {
    match observation.criteria_reference.as_deref() {
        Some(reference) if group.population_by_id(reference).is_none() => {
            Err(MeasureError::aggregation_for(
                MSR0304,
                &observation.expression,
                format!(
                    "Measure observation: {} references unknown population: {}",
                    observation.id, reference
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Aggregate method of an observation population
pub fn aggregate_method(observation: &PopulationDef) -> Result<AggregateMethod> {
    observation.aggregate_method.ok_or_else(|| {
        MeasureError::aggregation_for(
            MSR0302,
            &observation.expression,
            format!(
                "Measure observation: {} is missing an aggregate method",
                observation.id
            ),
        )
    })
}

/// Result name holding an observation's values for one subject: the
/// criteria-qualified name when present, the bare expression otherwise
pub fn observation_expression(observation: &PopulationDef, result: &EvaluationResult) -> String {
    if let Some(reference) = &observation.criteria_reference {
        let qualified = format!("{}-{}", reference, observation.expression);
        if result.contains(&qualified) {
            return qualified;
        }
    }
    observation.expression.clone()
}

/// Read every subject's observation values
pub fn collect_observations(
    observation: &PopulationDef,
    results: &SubjectResults,
    basis: &PopulationBasis,
    subject_type: &str,
) -> Result<Vec<Observation>> {
    let mut collected = Vec::new();
    for (subject, result) in results.iter() {
        let expression = observation_expression(observation, result);
        let value = result.get(&expression);
        if value.is_null() {
            continue;
        }

        match basis {
            PopulationBasis::Boolean => {
                if matches!(value, ResultValue::List(_) | ResultValue::Map(_)) {
                    return Err(MeasureError::aggregation_for(
                        MSR0300,
                        &expression,
                        format!(
                            "Measure observation result for expression: {} must be a single value for population basis: boolean but was: {}",
                            expression,
                            value.type_name()
                        ),
                    ));
                }
                let key = ResultValue::Resource(subject_ref(subject, subject_type));
                push_observation(&mut collected, &expression, subject, key, value)?;
            }
            PopulationBasis::Resource(_) => {
                for element in value.elements() {
                    let entries = element.as_map().ok_or_else(|| {
                        keyed_result_error(&expression, basis, element.type_name())
                    })?;
                    for entry in entries {
                        if !conforms_to_basis(&entry.key, basis) {
                            return Err(keyed_result_error(
                                &expression,
                                basis,
                                entry.key.type_name(),
                            ));
                        }
                        push_observation(
                            &mut collected,
                            &expression,
                            subject,
                            entry.key.clone(),
                            &entry.value,
                        )?;
                    }
                }
            }
        }
    }
    Ok(collected)
}

fn keyed_result_error(expression: &str, basis: &PopulationBasis, found: &str) -> MeasureError {
    MeasureError::aggregation_for(
        MSR0300,
        expression,
        format!(
            "Measure observation results for expression: {} must be keyed by the population basis: {} but found: {}",
            expression, basis, found
        ),
    )
}

fn push_observation(
    collected: &mut Vec<Observation>,
    expression: &str,
    subject: &str,
    key: ResultValue,
    value: &ResultValue,
) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let number = value.as_observation_number().ok_or_else(|| {
        MeasureError::aggregation_for(
            MSR0301,
            expression,
            format!(
                "continuous variable observation CQL \"MeasureObservation\" function result must be of type String, Integer, Decimal or Quantity but was: {}",
                value.type_name()
            ),
        )
    })?;
    collected.push(Observation {
        subject: subject.to_string(),
        key,
        value: number,
    });
    Ok(())
}

/// Keep observations taken for members of `include` and not of `exclude`
pub fn retain_observed(
    observations: &mut Vec<Observation>,
    include: &SubjectMembers,
    exclude: Option<&SubjectMembers>,
) {
    observations.retain(|o| {
        include.contains(&o.subject, &o.key)
            && !exclude.is_some_and(|ex| ex.contains(&o.subject, &o.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn observation_def(reference: Option<&str>) -> PopulationDef {
        PopulationDef {
            id: "obs".to_string(),
            code: None,
            population_type: MeasurePopulationType::MeasureObservation,
            expression: "Duration".to_string(),
            aggregate_method: Some(AggregateMethod::Sum),
            criteria_reference: reference.map(str::to_string),
            supporting_evidence: Vec::new(),
        }
    }

    fn encounter_basis() -> PopulationBasis {
        PopulationBasis::Resource("Encounter".to_string())
    }

    #[test]
    fn test_keyed_observations() {
        let results = SubjectResults::new().with(
            "p1",
            EvaluationResult::new().with(
                "mp-Duration",
                ResultValue::map([
                    (ResultValue::resource("Encounter", "e1"), ResultValue::integer(30)),
                    (ResultValue::resource("Encounter", "e2"), ResultValue::Null),
                ]),
            ),
        );
        let obs = collect_observations(&observation_def(Some("mp")), &results, &encounter_basis(), "Patient")
            .unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].value, Decimal::from(30));
        assert_eq!(obs[0].key, ResultValue::resource("Encounter", "e1"));
    }

    #[test]
    fn test_unqualified_fallback_and_boolean_basis() {
        let results = SubjectResults::new()
            .with("p1", EvaluationResult::new().with("Duration", ResultValue::string(" 12.5 ")));
        let obs = collect_observations(
            &observation_def(Some("mp")),
            &results,
            &PopulationBasis::Boolean,
            "Patient",
        )
        .unwrap();
        assert_eq!(obs[0].value, Decimal::new(125, 1));
        assert_eq!(obs[0].key, ResultValue::resource("Patient", "p1"));
    }

    #[test]
    fn test_non_numeric_result() {
        let results = SubjectResults::new()
            .with("p1", EvaluationResult::new().with("Duration", ResultValue::boolean(true)));
        let err = collect_observations(&observation_def(None), &results, &PopulationBasis::Boolean, "Patient")
            .unwrap_err();
        assert_eq!(err.code(), MSR0301);
        assert!(err.message().ends_with("but was: Boolean"));
    }

    #[test]
    fn test_unkeyed_resource_observation() {
        let results = SubjectResults::new()
            .with("p1", EvaluationResult::new().with("Duration", ResultValue::integer(4)));
        let err = collect_observations(&observation_def(None), &results, &encounter_basis(), "Patient")
            .unwrap_err();
        assert_eq!(err.code(), MSR0300);
    }

    #[test]
    fn test_retain_observed() {
        let mut include = SubjectMembers::new();
        include.insert("p1", ResultValue::resource("Encounter", "e1"));
        include.insert("p1", ResultValue::resource("Encounter", "e2"));
        let mut exclude = SubjectMembers::new();
        exclude.insert("p1", ResultValue::resource("Encounter", "e2"));

        let mut observations: Vec<Observation> = ["e1", "e2", "e3"]
            .iter()
            .map(|id| Observation {
                subject: "p1".to_string(),
                key: ResultValue::resource("Encounter", *id),
                value: Decimal::ONE,
            })
            .collect();
        retain_observed(&mut observations, &include, Some(&exclude));
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].key, ResultValue::resource("Encounter", "e1"));
    }

    #[test]
    fn test_missing_aggregate_method() {
        let mut def = observation_def(None);
        def.aggregate_method = None;
        assert_eq!(aggregate_method(&def).unwrap_err().code(), MSR0302);
    }
}
