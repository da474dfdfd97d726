//! Population legality per scoring type

use octofhir_measure_def::GroupDef;
use octofhir_measure_diagnostics::{MeasureError, Result};

/// Reject populations a scoring type forbids, then populations it requires but
/// the group lacks
pub fn validate_group_populations(group: &GroupDef) -> Result<()> {
    let scoring = group.scoring;
    let allowed = scoring.allowed_populations();

    if let Some(illegal) = group
        .populations
        .iter()
        .find(|p| !allowed.contains(&p.population_type))
    {
        return Err(MeasureError::population_not_allowed(
            illegal.population_type.to_code(),
            scoring.to_code(),
        ));
    }

    if let Some(missing) = scoring
        .required_populations()
        .iter()
        .find(|ty| !group.has_population(**ty))
    {
        return Err(MeasureError::population_missing(
            missing.to_code(),
            scoring.to_code(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measure_def::PopulationDef;
    use octofhir_measure_diagnostics::{MSR0200, MSR0201};
    use octofhir_measure_types::{
        ImprovementNotation, MeasurePopulationType, MeasureScoring, PopulationBasis,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use MeasurePopulationType::*;

    fn group(scoring: MeasureScoring, types: &[MeasurePopulationType]) -> GroupDef {
        GroupDef {
            id: Some("g1".to_string()),
            code: None,
            scoring,
            population_basis: PopulationBasis::Boolean,
            improvement_notation: ImprovementNotation::Increase,
            improvement_notation_from_group: false,
            populations: types
                .iter()
                .map(|ty| PopulationDef {
                    id: ty.to_code().to_string(),
                    code: None,
                    population_type: *ty,
                    expression: ty.to_code().to_string(),
                    aggregate_method: None,
                    criteria_reference: None,
                    supporting_evidence: Vec::new(),
                })
                .collect(),
            stratifiers: Vec::new(),
        }
    }

    #[rstest]
    #[case(MeasureScoring::Cohort, &[InitialPopulation])]
    #[case(MeasureScoring::Proportion, &[InitialPopulation, Denominator, Numerator, DenominatorException])]
    #[case(MeasureScoring::Ratio, &[InitialPopulation, Denominator, Numerator, MeasureObservation, MeasureObservation])]
    #[case(MeasureScoring::ContinuousVariable, &[InitialPopulation, MeasurePopulation, MeasureObservation])]
    fn test_legal_groups(#[case] scoring: MeasureScoring, #[case] types: &[MeasurePopulationType]) {
        assert!(validate_group_populations(&group(scoring, types)).is_ok());
    }

    #[test]
    fn test_ratio_forbids_denominator_exception() {
        let err = validate_group_populations(&group(
            MeasureScoring::Ratio,
            &[InitialPopulation, Denominator, Numerator, DenominatorException],
        ))
        .unwrap_err();
        assert_eq!(err.code(), MSR0200);
        assert_eq!(
            err.message(),
            "MeasurePopulationType: denominator-exception, is not a member of allowed 'ratio' populations."
        );
    }

    #[test]
    fn test_ratio_requires_denominator() {
        let err = validate_group_populations(&group(
            MeasureScoring::Ratio,
            &[InitialPopulation, Numerator],
        ))
        .unwrap_err();
        assert_eq!(err.code(), MSR0201);
        assert_eq!(
            err.message(),
            "'ratio' measure is missing required population: denominator."
        );
    }

    #[test]
    fn test_cohort_rejects_numerator() {
        let err = validate_group_populations(&group(
            MeasureScoring::Cohort,
            &[InitialPopulation, Numerator],
        ))
        .unwrap_err();
        assert_eq!(err.code(), MSR0200);
    }
}
