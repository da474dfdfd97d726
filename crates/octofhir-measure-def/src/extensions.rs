//! Extension urls read by the definition builder

use crate::fhir::Extension;

/// Population basis on a measure or group (`valueCode`)
pub const POPULATION_BASIS_URL: &str =
    "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-populationBasis";
/// Group-level scoring (`valueCodeableConcept`)
pub const SCORING_URL: &str = "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-scoring";
/// Group-level improvement notation (`valueCodeableConcept`)
pub const IMPROVEMENT_NOTATION_URL: &str =
    "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-improvementNotation";
/// Aggregate method of a measure observation population (`valueCode` or `valueString`)
pub const AGGREGATE_METHOD_URL: &str =
    "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-aggregateMethod";
/// Id of the population a measure observation observes (`valueString`)
pub const CRITERIA_REFERENCE_URL: &str =
    "http://hl7.org/fhir/us/cqfmeasures/StructureDefinition/cqfm-criteriaReference";
/// Supporting evidence expression of a population (`valueExpression`)
pub const SUPPORTING_EVIDENCE_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/cqf-supportingEvidenceDefinition";
/// Stratifier kind, `value` or `criteria` (`valueCode`)
pub const STRATIFIER_KIND_URL: &str =
    "http://octofhir.io/fhir/StructureDefinition/measure-stratifier-kind";

/// Usage code marking a supplemental data element
pub const SDE_USAGE_CODE: &str = "supplemental-data";

/// First extension with `url`
pub fn find<'a>(extensions: &'a [Extension], url: &str) -> Option<&'a Extension> {
    extensions.iter().find(|e| e.url == url)
}

/// All extensions with `url`
pub fn find_all<'a>(extensions: &'a [Extension], url: &'a str) -> impl Iterator<Item = &'a Extension> {
    extensions.iter().filter(move |e| e.url == url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_extensions() {
        let exts = vec![
            Extension::code(POPULATION_BASIS_URL, "Encounter"),
            Extension::string(CRITERIA_REFERENCE_URL, "num"),
            Extension::string(CRITERIA_REFERENCE_URL, "den"),
        ];
        assert_eq!(
            find(&exts, POPULATION_BASIS_URL).and_then(Extension::text_value),
            Some("Encounter")
        );
        assert_eq!(find_all(&exts, CRITERIA_REFERENCE_URL).count(), 2);
        assert!(find(&exts, SCORING_URL).is_none());
    }
}
