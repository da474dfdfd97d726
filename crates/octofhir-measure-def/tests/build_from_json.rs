//! Definition builder tests over complete Measure documents

use octofhir_measure_def::MeasureDefBuilder;
use octofhir_measure_diagnostics::{
    ErrorCode, MSR0001, MSR0003, MSR0004, MSR0005, MSR0007, MSR0009, MSR0010, MSR0500,
};
use octofhir_measure_types::{
    AggregateMethod, ImprovementNotation, MeasurePopulationType, MeasureScoring, PopulationBasis,
    StratifierKind,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const RATIO_CV_MEASURE: &str = r#"{
  "resourceType": "Measure",
  "id": "ratio-cv",
  "url": "http://example.org/Measure/ratio-cv",
  "version": "1.0.0",
  "scoring": {"coding": [{"code": "ratio"}]},
  "improvementNotation": {
    "coding": [{"system": "http://terminology.hl7.org/CodeSystem/measure-improvement-notation", "code": "decrease"}]
  },
  "extension": [
    {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-populationBasis", "valueCode": "Encounter"}
  ],
  "group": [{
    "id": "g1",
    "population": [
      {"id": "ip", "code": {"coding": [{"code": "initial-population"}]}, "criteria": {"language": "text/cql-identifier", "expression": "Initial Population"}},
      {"id": "den", "code": {"coding": [{"code": "denominator"}]}, "criteria": {"expression": "Denominator"}},
      {"id": "num", "code": {"coding": [{"code": "numerator"}]}, "criteria": {"expression": "Numerator"},
       "extension": [
         {"url": "http://hl7.org/fhir/StructureDefinition/cqf-supportingEvidenceDefinition",
          "valueExpression": {"name": "Visits", "expression": "Qualifying Visits"}}
       ]},
      {"id": "obs-den", "code": {"coding": [{"code": "measure-observation"}]}, "criteria": {"expression": "Duration"},
       "extension": [
         {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-aggregateMethod", "valueCode": "sum"},
         {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-criteriaReference", "valueString": "den"}
       ]},
      {"id": "obs-num", "code": {"coding": [{"code": "measure-observation"}]}, "criteria": {"expression": "Duration"},
       "extension": [
         {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-aggregateMethod", "valueCode": "avg"},
         {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-criteriaReference", "valueString": "num"}
       ]}
    ],
    "stratifier": [
      {"id": "by-class", "criteria": {"expression": "Encounter Class"}},
      {"id": "inpatient", "criteria": {"expression": "Is Inpatient"},
       "extension": [{"url": "http://octofhir.io/fhir/StructureDefinition/measure-stratifier-kind", "valueCode": "criteria"}]},
      {"id": "age-gender", "component": [
        {"id": "age", "criteria": {"expression": "Age Band"}},
        {"id": "gender", "criteria": {"expression": "Gender"}}
      ]}
    ]
  }, {
    "id": "g2",
    "extension": [
      {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-scoring", "valueCodeableConcept": {"coding": [{"code": "cohort"}]}},
      {"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-populationBasis", "valueCode": "boolean"}
    ],
    "population": [
      {"id": "ip2", "code": {"coding": [{"code": "initial-population"}]}, "criteria": {"expression": "Initial Population"}}
    ]
  }],
  "supplementalData": [
    {"id": "sde-sex", "usage": [{"coding": [{"code": "supplemental-data"}]}], "criteria": {"expression": "SDE Sex"}}
  ]
}"#;

#[test]
fn test_builds_complete_measure() {
    let def = MeasureDefBuilder::new()
        .build_from_json(RATIO_CV_MEASURE)
        .unwrap();

    assert_eq!(def.id, "ratio-cv");
    assert_eq!(def.version.as_deref(), Some("1.0.0"));
    assert_eq!(def.improvement_notation, Some(ImprovementNotation::Decrease));
    assert!(def.use_measure_improvement_notation);
    assert_eq!(def.groups.len(), 2);
    assert_eq!(def.sdes[0].expression, "SDE Sex");

    let g1 = &def.groups[0];
    assert_eq!(g1.scoring, MeasureScoring::Ratio);
    assert_eq!(
        g1.population_basis,
        PopulationBasis::Resource("Encounter".to_string())
    );
    assert_eq!(g1.improvement_notation, ImprovementNotation::Decrease);
    assert!(!g1.improvement_notation_from_group);
    assert_eq!(
        g1.populations_of(MeasurePopulationType::MeasureObservation).count(),
        2
    );

    let obs = g1.population_by_id("obs-num").unwrap();
    assert_eq!(obs.aggregate_method, Some(AggregateMethod::Average));
    assert_eq!(obs.criteria_reference.as_deref(), Some("num"));

    let num = g1.population(MeasurePopulationType::Numerator).unwrap();
    assert_eq!(num.supporting_evidence[0].name, "Visits");
    assert_eq!(num.supporting_evidence[0].expression, "Qualifying Visits");

    let kinds: Vec<_> = g1.stratifiers.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StratifierKind::Value,
            StratifierKind::Criteria,
            StratifierKind::Component
        ]
    );
    assert_eq!(g1.stratifiers[2].components[1].expression, "Gender");

    let g2 = &def.groups[1];
    assert_eq!(g2.scoring, MeasureScoring::Cohort);
    assert!(g2.is_boolean_basis());
    assert_eq!(g2.label(1), "g2");
}

#[test]
fn test_definition_serializes_camel_case() {
    let def = MeasureDefBuilder::new()
        .build_from_json(RATIO_CV_MEASURE)
        .unwrap();
    let json = serde_json::to_value(&def).unwrap();
    assert_eq!(json["groups"][0]["populationBasis"], "Encounter");
    assert_eq!(json["groups"][0]["populations"][3]["criteriaReference"], "den");
    assert_eq!(json["improvementNotation"], "decrease");
}

#[rstest]
#[case::missing_scoring(
    r#"{"id": "m", "url": "http://example.org/Measure/m", "group": [{"population": []}]}"#,
    MSR0001,
    "MeasureScoring must be specified on Group or Measure for Measure: http://example.org/Measure/m"
)]
#[case::bad_basis(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "extension": [{"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-populationBasis", "valueCode": "Banana"}]}"#,
    MSR0003,
    "Population basis code: Banana, is not a valid population basis type."
)]
#[case::missing_measure_id(
    r#"{"scoring": {"coding": [{"code": "cohort"}]}}"#,
    MSR0007,
    "id is required on all Resources of type: Measure"
)]
#[case::blank_criteria(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "group": [{"population": [{"id": "ip", "code": {"coding": [{"code": "initial-population"}]}, "criteria": {"expression": "  "}}]}]}"#,
    MSR0009,
    "criteria expression is required on Measure.group.population with id: ip"
)]
#[case::empty_stratifier(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "group": [{"population": [], "stratifier": [{"id": "s1"}]}]}"#,
    MSR0010,
    "Stratifier: s1, must declare a criteria expression or components"
)]
#[case::stratifier_without_id(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "group": [{"population": [], "stratifier": [{"criteria": {"expression": "Gender"}}]}]}"#,
    MSR0007,
    "id is required on all Elements of type: Measure.group.stratifier"
)]
#[case::component_without_id(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "group": [{"population": [], "stratifier": [{"id": "s1", "component": [{"criteria": {"expression": "Gender"}}]}]}]}"#,
    MSR0007,
    "id is required on all Elements of type: Measure.group.stratifier.component"
)]
#[case::unknown_population_code(
    r#"{"id": "m", "scoring": {"coding": [{"code": "cohort"}]},
        "group": [{"population": [{"id": "ip", "code": {"coding": [{"code": "initial-pop"}]}, "criteria": {"expression": "IP"}}]}]}"#,
    MSR0004,
    "Measure population code: initial-pop, is not a valid Measure Population Type."
)]
#[case::unknown_aggregate_method(
    r#"{"id": "m", "scoring": {"coding": [{"code": "continuous-variable"}]},
        "group": [{"population": [{"id": "obs", "code": {"coding": [{"code": "measure-observation"}]}, "criteria": {"expression": "Duration"},
          "extension": [{"url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-aggregateMethod", "valueCode": "mode"}]}]}]}"#,
    MSR0005,
    "Aggregate method code: mode, is not a valid aggregate method."
)]
fn test_definition_errors(
    #[case] json: &str,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let err = MeasureDefBuilder::new().build_from_json(json).unwrap_err();
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
}

#[test]
fn test_malformed_document() {
    let err = MeasureDefBuilder::new()
        .build_from_json("{\"id\": ")
        .unwrap_err();
    assert_eq!(err.code(), MSR0500);
    assert!(err.message().starts_with("Invalid Measure document:"));
}

#[test]
fn test_group_notation_on_every_group_disables_measure_notation() {
    let json = r#"{
      "id": "m",
      "scoring": {"coding": [{"code": "cohort"}]},
      "group": [{
        "extension": [{
          "url": "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-improvementNotation",
          "valueCodeableConcept": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/measure-improvement-notation", "code": "decrease"}]}
        }],
        "population": [{"id": "ip", "code": {"coding": [{"code": "initial-population"}]}, "criteria": {"expression": "IP"}}]
      }]
    }"#;
    let def = MeasureDefBuilder::new().build_from_json(json).unwrap();
    assert!(!def.use_measure_improvement_notation);
    assert!(def.groups[0].improvement_notation_from_group);
    assert_eq!(def.groups[0].improvement_notation, ImprovementNotation::Decrease);
    assert_eq!(def.groups[0].label(0), "group-1");
}
