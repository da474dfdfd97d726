//! Population basis validation
//!
//! Every population and stratifier expression result is classified element by
//! element. The `total` list holds each element's runtime type name, `matching`
//! the subset accepted by the check; a difference between the two is fatal.

use octofhir_measure_def::{GroupDef, MeasureDef, StratifierDef};
use octofhir_measure_diagnostics::{BasisCheck, MeasureError, Result};
use octofhir_measure_types::{
    MeasurePopulationType, MeasureScoring, PopulationBasis, ResultValue, StratifierKind,
    conforms_to,
};

use crate::evaluation::SubjectResults;

/// Whether `value` is an acceptable member for `basis`
pub fn conforms_to_basis(value: &ResultValue, basis: &PopulationBasis) -> bool {
    match (basis, value) {
        (PopulationBasis::Boolean, ResultValue::Boolean(_)) => true,
        (PopulationBasis::Resource(expected), ResultValue::Resource(r)) => {
            conforms_to(&r.resource_type, expected)
        }
        _ => false,
    }
}

/// Whether `value` can name a stratum
pub fn is_stratum_value(value: &ResultValue) -> bool {
    matches!(
        value,
        ResultValue::Boolean(_)
            | ResultValue::Integer(_)
            | ResultValue::Decimal(_)
            | ResultValue::String(_)
            | ResultValue::Code(_)
            | ResultValue::Concept(_)
            | ResultValue::Quantity(_)
            | ResultValue::Interval(_)
            | ResultValue::Resource(_)
    )
}

/// Scoring name as it appears in basis diagnostics
fn scoring_label(scoring: MeasureScoring) -> String {
    scoring.to_code().replace('-', "").to_uppercase()
}

/// Classify `values` and fail when any element is rejected by `accept`
pub fn check_basis<'v>(
    check: &BasisCheck,
    expression: &str,
    values: impl IntoIterator<Item = &'v ResultValue>,
    accept: impl Fn(&ResultValue) -> bool,
    basis: &PopulationBasis,
    measure_url: &str,
) -> Result<()> {
    let mut total = Vec::new();
    let mut matching = Vec::new();
    for value in values {
        let name = value.type_name().to_string();
        if accept(value) {
            matching.push(name.clone());
        }
        total.push(name);
    }

    if matching.len() == total.len() {
        return Ok(());
    }
    Err(MeasureError::basis_mismatch(
        check,
        expression,
        basis.to_code(),
        measure_url,
        total,
        matching,
    ))
}

/// Validate every non-observation population of a group, subject by subject
pub fn validate_populations(
    measure: &MeasureDef,
    group: &GroupDef,
    results: &SubjectResults,
) -> Result<()> {
    let check = BasisCheck::Population {
        scoring: scoring_label(group.scoring),
    };
    for population in &group.populations {
        if population.population_type == MeasurePopulationType::MeasureObservation {
            continue;
        }
        for (_, value) in results.results_for(&population.expression) {
            check_basis(
                &check,
                &population.expression,
                value.elements(),
                |v| conforms_to_basis(v, &group.population_basis),
                &group.population_basis,
                measure.display_url(),
            )?;
        }
    }
    Ok(())
}

/// Validate the expressions of every stratifier of a group
pub fn validate_stratifiers(
    measure: &MeasureDef,
    group: &GroupDef,
    results: &SubjectResults,
) -> Result<()> {
    for stratifier in &group.stratifiers {
        validate_stratifier(measure, group, stratifier, results)?;
    }
    Ok(())
}

fn validate_stratifier(
    measure: &MeasureDef,
    group: &GroupDef,
    stratifier: &StratifierDef,
    results: &SubjectResults,
) -> Result<()> {
    let basis = &group.population_basis;
    let url = measure.display_url();

    match stratifier.kind {
        StratifierKind::Criteria => {
            let Some(expression) = stratifier.expression.as_deref() else {
                return Ok(());
            };
            for (_, value) in results.results_for(expression) {
                let keys = criteria_elements(value);
                check_basis(
                    &BasisCheck::StratifierCriteria,
                    expression,
                    keys,
                    |v| conforms_to_basis(v, basis),
                    basis,
                    url,
                )?;
            }
        }
        StratifierKind::Value | StratifierKind::Component => {
            let expressions: Vec<&str> = if stratifier.components.is_empty() {
                stratifier.expression.as_deref().into_iter().collect()
            } else {
                stratifier
                    .components
                    .iter()
                    .map(|c| c.expression.as_str())
                    .collect()
            };
            for expression in expressions {
                for (_, value) in results.results_for(expression) {
                    validate_value_result(expression, value, basis, url)?;
                }
            }
        }
    }
    Ok(())
}

/// Members a criteria stratifier selects: map keys for keyed results,
/// plain elements otherwise
fn criteria_elements(value: &ResultValue) -> Vec<&ResultValue> {
    match value.as_map() {
        Some(entries) => entries.iter().map(|e| &e.key).collect(),
        None => value.elements(),
    }
}

fn validate_value_result(
    expression: &str,
    value: &ResultValue,
    basis: &PopulationBasis,
    url: &str,
) -> Result<()> {
    match value.as_map() {
        // Keyed results: keys align with population members, values name strata
        Some(entries) => {
            check_basis(
                &BasisCheck::StratifierCriteria,
                expression,
                entries.iter().map(|e| &e.key),
                |v| conforms_to_basis(v, basis),
                basis,
                url,
            )?;
            check_basis(
                &BasisCheck::StratifierValue,
                expression,
                entries.iter().map(|e| &e.value).filter(|v| !v.is_null()),
                is_stratum_value,
                basis,
                url,
            )
        }
        None => check_basis(
            &BasisCheck::StratifierValue,
            expression,
            value.elements(),
            is_stratum_value,
            basis,
            url,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measure_diagnostics::{MSR0100, MSR0101, MSR0102};
    use pretty_assertions::assert_eq;

    fn encounter_basis() -> PopulationBasis {
        PopulationBasis::Resource("Encounter".to_string())
    }

    #[test]
    fn test_conforms_to_basis() {
        let encounter = ResultValue::resource("Encounter", "e1");
        assert!(conforms_to_basis(&encounter, &encounter_basis()));
        assert!(!conforms_to_basis(&encounter, &PopulationBasis::Boolean));
        assert!(conforms_to_basis(&ResultValue::boolean(false), &PopulationBasis::Boolean));
        assert!(conforms_to_basis(
            &encounter,
            &PopulationBasis::Resource("Resource".to_string())
        ));
    }

    #[test]
    fn test_population_mismatch_message() {
        let values = [
            ResultValue::resource("Encounter", "e1"),
            ResultValue::resource("Procedure", "pr1"),
        ];
        let err = check_basis(
            &BasisCheck::Population {
                scoring: scoring_label(MeasureScoring::Proportion),
            },
            "Initial Population",
            values.iter(),
            |v| conforms_to_basis(v, &encounter_basis()),
            &encounter_basis(),
            "http://example.com/Measure/m",
        )
        .unwrap_err();
        assert_eq!(err.code(), MSR0100);
        assert_eq!(
            err.message(),
            "group expression criteria results for expression: [Initial Population] and scoring: [PROPORTION] must fall within accepted types for population basis: [Encounter] for Measure: [http://example.com/Measure/m] due to mismatch between total result classes: [Encounter, Procedure] and matching result classes: [Encounter]"
        );
    }

    #[test]
    fn test_matching_lists_are_not_deduplicated() {
        let values = [ResultValue::boolean(true), ResultValue::boolean(true)];
        assert!(
            check_basis(
                &BasisCheck::StratifierValue,
                "Gender",
                values.iter(),
                is_stratum_value,
                &PopulationBasis::Boolean,
                "m",
            )
            .is_ok()
        );
    }

    #[test]
    fn test_value_stratifier_rejects_tuples() {
        let tuple = ResultValue::Tuple(Default::default());
        let err = validate_value_result("Tuple Strat", &tuple, &PopulationBasis::Boolean, "m").unwrap_err();
        assert_eq!(err.code(), MSR0101);
    }

    #[test]
    fn test_keyed_stratifier_checks_keys_against_basis() {
        let keyed = ResultValue::map([(
            ResultValue::resource("Procedure", "pr1"),
            ResultValue::string("a"),
        )]);
        let err = validate_value_result("Keyed", &keyed, &encounter_basis(), "m").unwrap_err();
        assert_eq!(err.code(), MSR0102);

        let ok = ResultValue::map([(
            ResultValue::resource("Encounter", "e1"),
            ResultValue::string("a"),
        )]);
        assert!(validate_value_result("Keyed", &ok, &encounter_basis(), "m").is_ok());
    }
}
