#![allow(dead_code)]

use octofhir_measure_def::extensions::{
    AGGREGATE_METHOD_URL, CRITERIA_REFERENCE_URL, POPULATION_BASIS_URL, STRATIFIER_KIND_URL,
};
use octofhir_measure_def::{
    CodeableConcept, Expression, Extension, Measure, MeasureDef, MeasureDefBuilder, MeasureGroup,
    MeasureGroupPopulation, MeasureGroupStratifier, MeasureGroupStratifierComponent,
};
use octofhir_measure_eval::{EvaluationResult, SubjectResults};
use octofhir_measure_types::{MEASURE_POPULATION_SYSTEM, MEASURE_SCORING_SYSTEM, ResultValue};

pub const MEASURE_URL: &str = "http://example.com/Measure/test";

/// Population whose id and expression are both `code`
pub fn population(code: &str) -> MeasureGroupPopulation {
    population_with(code, code)
}

pub fn population_with(code: &str, expression: &str) -> MeasureGroupPopulation {
    MeasureGroupPopulation {
        id: Some(code.to_string()),
        code: Some(CodeableConcept::from_code(Some(MEASURE_POPULATION_SYSTEM), code)),
        criteria: Some(Expression::cql(expression)),
        ..MeasureGroupPopulation::default()
    }
}

/// Measure observation with an aggregate method and criteria reference
pub fn observation(id: &str, expression: &str, method: &str, reference: &str) -> MeasureGroupPopulation {
    MeasureGroupPopulation {
        id: Some(id.to_string()),
        code: Some(CodeableConcept::from_code(
            Some(MEASURE_POPULATION_SYSTEM),
            "measure-observation",
        )),
        criteria: Some(Expression::cql(expression)),
        extension: vec![
            Extension::code(AGGREGATE_METHOD_URL, method),
            Extension::string(CRITERIA_REFERENCE_URL, reference),
        ],
        ..MeasureGroupPopulation::default()
    }
}

pub fn value_stratifier(id: &str, expression: &str) -> MeasureGroupStratifier {
    MeasureGroupStratifier {
        id: Some(id.to_string()),
        criteria: Some(Expression::cql(expression)),
        ..MeasureGroupStratifier::default()
    }
}

pub fn criteria_stratifier(id: &str, expression: &str) -> MeasureGroupStratifier {
    MeasureGroupStratifier {
        extension: vec![Extension::code(STRATIFIER_KIND_URL, "criteria")],
        ..value_stratifier(id, expression)
    }
}

pub fn component_stratifier(id: &str, components: &[(&str, &str)]) -> MeasureGroupStratifier {
    MeasureGroupStratifier {
        id: Some(id.to_string()),
        component: components
            .iter()
            .map(|(id, expression)| MeasureGroupStratifierComponent {
                id: Some(id.to_string()),
                criteria: Some(Expression::cql(*expression)),
                ..MeasureGroupStratifierComponent::default()
            })
            .collect(),
        ..MeasureGroupStratifier::default()
    }
}

pub fn group(populations: Vec<MeasureGroupPopulation>) -> MeasureGroup {
    MeasureGroup {
        id: Some("group-1".to_string()),
        population: populations,
        ..MeasureGroup::default()
    }
}

pub fn with_stratifiers(mut group: MeasureGroup, stratifiers: Vec<MeasureGroupStratifier>) -> MeasureGroup {
    group.stratifier = stratifiers;
    group
}

/// Build a single-group measure; `basis` of `None` keeps the boolean default
pub fn measure(scoring: &str, basis: Option<&str>, group: MeasureGroup) -> MeasureDef {
    let measure = Measure {
        id: Some("test".to_string()),
        url: Some(MEASURE_URL.to_string()),
        scoring: Some(CodeableConcept::from_code(Some(MEASURE_SCORING_SYSTEM), scoring)),
        extension: basis
            .map(|b| vec![Extension::code(POPULATION_BASIS_URL, b)])
            .unwrap_or_default(),
        group: vec![group],
        ..Measure::default()
    };
    MeasureDefBuilder::new()
        .build(&measure)
        .expect("test measure should build")
}

/// Per-subject boolean results: `subjects[i]` gets `true` for every listed expression
pub fn boolean_results(subject_count: usize, assignments: &[(&str, &[usize])]) -> SubjectResults {
    let mut results = SubjectResults::new();
    for index in 0..subject_count {
        let mut result = EvaluationResult::new();
        for (expression, members) in assignments {
            result.insert(*expression, ResultValue::boolean(members.contains(&index)));
        }
        results.insert(subject(index), result);
    }
    results
}

pub fn subject(index: usize) -> String {
    format!("Patient/p{}", index)
}

pub fn encounter(id: impl std::fmt::Display) -> ResultValue {
    ResultValue::resource("Encounter", id.to_string())
}

/// Set an extra expression result on an existing subject
pub fn set(results: &mut SubjectResults, subject: &str, expression: &str, value: ResultValue) {
    let mut result = results.get(subject).cloned().unwrap_or_default();
    result.insert(expression, value);
    results.insert(subject, result);
}
