//! Measure evaluator
//!
//! Runs each group through the scoring pipeline: population legality, basis
//! validation, membership, set-membership correction, observations, counts
//! and score, then stratifiers.

use indexmap::IndexMap;
use octofhir_measure_def::{GroupDef, MeasureDef, PopulationDef};
use octofhir_measure_diagnostics::Result;
use octofhir_measure_types::{MeasurePopulationType, MeasureScoring};

use crate::basis;
use crate::evaluation::{SubjectResults, subject_ref};
use crate::observation::{self, RatioObservations, retain_observed};
use crate::options::{ErrorPolicy, MeasureEvaluationOptions};
use crate::population::{PopulationState, SubjectMembers};
use crate::result::{
    GroupError, GroupResult, MeasureResult, PopulationResult, SdeResult, SubjectValue,
    SupportingEvidenceResult,
};
use crate::scoring;
use crate::scoring_types::validate_group_populations;
use crate::stratifier::evaluate_stratifier;

use MeasurePopulationType::*;

/// Corrected member sets, one per population type
type MemberSets = IndexMap<MeasurePopulationType, SubjectMembers>;

/// Scores measures against already evaluated expression results
///
/// The evaluator holds no mutable state; a single instance may be shared
/// across threads and reused for any number of measures.
#[derive(Debug, Clone, Default)]
pub struct MeasureEvaluator {
    options: MeasureEvaluationOptions,
}

impl MeasureEvaluator {
    pub fn new(options: MeasureEvaluationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MeasureEvaluationOptions {
        &self.options
    }

    /// Evaluate every group of `measure`
    pub fn evaluate(&self, measure: &MeasureDef, results: &SubjectResults) -> Result<MeasureResult> {
        log::debug!(
            "Evaluating measure {} over {} subjects",
            measure.display_url(),
            results.len()
        );

        let mut groups = Vec::with_capacity(measure.groups.len());
        let mut errors = Vec::new();
        for (index, group) in measure.groups.iter().enumerate() {
            match self.evaluate_group(measure, group, index, results) {
                Ok(result) => groups.push(result),
                Err(err) if self.options.error_policy == ErrorPolicy::Collect => {
                    log::warn!("Group {} failed: {}", group.label(index), err);
                    errors.push(GroupError {
                        group_index: index,
                        group_id: group.label(index),
                        diagnostic: err.to_diagnostic(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(MeasureResult {
            measure_id: measure.id.clone(),
            measure_url: measure.url.clone(),
            improvement_notation: measure
                .use_measure_improvement_notation
                .then(|| measure.improvement_notation.unwrap_or_default()),
            groups,
            sdes: self.evaluate_sdes(measure, results),
            errors,
        })
    }

    /// Evaluate one group; `index` is its position in the measure
    pub fn evaluate_group(
        &self,
        measure: &MeasureDef,
        group: &GroupDef,
        index: usize,
        results: &SubjectResults,
    ) -> Result<GroupResult> {
        let label = group.label(index);
        log::debug!("Evaluating group {} ({})", label, group.scoring);

        validate_group_populations(group)?;
        basis::validate_populations(measure, group, results)?;
        basis::validate_stratifiers(measure, group, results)?;

        let ratio_observations = match group.scoring {
            MeasureScoring::Ratio => observation::resolve_ratio_observations(group)?,
            _ => None,
        };
        for obs in group.populations_of(MeasureObservation) {
            observation::aggregate_method(obs)?;
            if group.scoring == MeasureScoring::ContinuousVariable {
                observation::validate_criteria_reference(group, obs)?;
            }
        }

        let mut sets = self.member_sets(group, results);
        if self.options.apply_set_membership {
            apply_set_membership(group.scoring, &mut sets);
        }

        let mut populations = Vec::with_capacity(group.populations.len());
        for def in &group.populations {
            let members = if def.population_type == MeasureObservation {
                SubjectMembers::new()
            } else if is_first_of_type(group, def) {
                sets.get(&def.population_type).cloned().unwrap_or_default()
            } else {
                SubjectMembers::from_results(
                    results,
                    &def.expression,
                    group.is_boolean_basis(),
                    &self.options.subject_type,
                )
            };
            populations.push(PopulationState::new(def, members));
        }

        self.collect_observations(group, ratio_observations, &sets, &mut populations, results)?;

        let population_results = populations
            .iter()
            .map(|state| self.population_result(group, state, results))
            .collect::<Result<Vec<PopulationResult>>>()?;

        let score = scoring::score(
            group.scoring,
            ratio_observations,
            |ty| {
                population_results
                    .iter()
                    .find(|p| p.population_type == ty)
                    .map_or(0, |p| p.count)
            },
            |id| {
                population_results
                    .iter()
                    .find(|p| p.id == id)
                    .and_then(|p| p.aggregation_result)
            },
            group.population(MeasureObservation).map(|p| p.id.as_str()),
        );

        let stratifiers = group
            .stratifiers
            .iter()
            .map(|s| evaluate_stratifier(s, group, &populations, ratio_observations, results))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Group {} scored {:?}", label, score);

        Ok(GroupResult {
            id: label,
            code: group.code.clone(),
            scoring: group.scoring,
            population_basis: group.population_basis.clone(),
            improvement_notation: group.improvement_notation,
            populations: population_results,
            score,
            stratifiers,
        })
    }

    fn member_sets(&self, group: &GroupDef, results: &SubjectResults) -> MemberSets {
        let mut sets = MemberSets::new();
        for def in &group.populations {
            if def.population_type == MeasureObservation || sets.contains_key(&def.population_type) {
                continue;
            }
            let members = SubjectMembers::from_results(
                results,
                &def.expression,
                group.is_boolean_basis(),
                &self.options.subject_type,
            );
            log::trace!(
                "Population {} has {} raw members",
                def.id,
                members.member_count()
            );
            sets.insert(def.population_type, members);
        }
        sets
    }

    fn collect_observations(
        &self,
        group: &GroupDef,
        ratio_observations: Option<RatioObservations<'_>>,
        sets: &MemberSets,
        populations: &mut [PopulationState<'_>],
        results: &SubjectResults,
    ) -> Result<()> {
        // Ratio observations always follow their population; continuous
        // variable observations only under set-membership correction
        let apply = self.options.apply_set_membership;
        for state in populations.iter_mut().filter(|s| s.is_observation()) {
            let alignment = match (group.scoring, ratio_observations) {
                (MeasureScoring::ContinuousVariable, _) => {
                    apply.then_some((MeasurePopulation, MeasurePopulationExclusion))
                }
                (MeasureScoring::Ratio, Some(ratio)) if std::ptr::eq(state.def, ratio.numerator) => {
                    Some((Numerator, NumeratorExclusion))
                }
                (MeasureScoring::Ratio, Some(_)) => Some((Denominator, DenominatorExclusion)),
                _ => continue,
            };

            let mut observations = observation::collect_observations(
                state.def,
                results,
                &group.population_basis,
                &self.options.subject_type,
            )?;
            let aligned = alignment
                .and_then(|(include, exclude)| Some((sets.get(&include)?, sets.get(&exclude))));
            if let Some((included, excluded)) = aligned {
                retain_observed(&mut observations, included, excluded);
            }
            log::trace!(
                "Observation {} kept {} values",
                state.def.id,
                observations.len()
            );
            state.observations = observations;
        }
        Ok(())
    }

    fn population_result(
        &self,
        group: &GroupDef,
        state: &PopulationState<'_>,
        results: &SubjectResults,
    ) -> Result<PopulationResult> {
        let subject_type = &self.options.subject_type;
        let def = state.def;
        Ok(PopulationResult {
            id: def.id.clone(),
            population_type: def.population_type,
            expression: def.expression.clone(),
            count: state.count(),
            subjects: state.subject_refs(subject_type),
            members: if group.is_boolean_basis() {
                Vec::new()
            } else {
                state.members.distinct_members()
            },
            aggregate_method: def.aggregate_method,
            aggregation_result: state.aggregation()?,
            criteria_reference: def.criteria_reference.clone(),
            supporting_evidence: def
                .supporting_evidence
                .iter()
                .map(|evidence| SupportingEvidenceResult {
                    name: evidence.name.clone(),
                    expression: evidence.expression.clone(),
                    values: results
                        .results_for(&evidence.expression)
                        .filter(|(subject, value)| {
                            !value.is_null() && state.members.contains_subject(subject)
                        })
                        .map(|(subject, value)| SubjectValue {
                            subject: subject_ref(subject, subject_type),
                            value: value.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    fn evaluate_sdes(&self, measure: &MeasureDef, results: &SubjectResults) -> Vec<SdeResult> {
        measure
            .sdes
            .iter()
            .map(|sde| SdeResult {
                id: sde.id.clone(),
                code: sde.code.clone(),
                expression: sde.expression.clone(),
                values: results
                    .results_for(&sde.expression)
                    .filter(|(_, value)| !value.is_null())
                    .map(|(subject, value)| SubjectValue {
                        subject: subject_ref(subject, &self.options.subject_type),
                        value: value.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn is_first_of_type(group: &GroupDef, def: &PopulationDef) -> bool {
    group
        .population(def.population_type)
        .is_some_and(|first| std::ptr::eq(first, def))
}

/// Restrict populations to their parents and knock out exclusions
fn apply_set_membership(scoring: MeasureScoring, sets: &mut MemberSets) {
    match scoring {
        MeasureScoring::Proportion | MeasureScoring::Ratio => {
            retain(sets, Denominator, InitialPopulation);
            retain(sets, Numerator, Denominator);
            remove(sets, Numerator, DenominatorExclusion);
            retain(sets, DenominatorExclusion, Denominator);
            retain(sets, NumeratorExclusion, Numerator);
            remove(sets, DenominatorException, Numerator);
            retain(sets, DenominatorException, Denominator);
        }
        MeasureScoring::ContinuousVariable => {
            retain(sets, MeasurePopulation, InitialPopulation);
            retain(sets, MeasurePopulationExclusion, MeasurePopulation);
        }
        MeasureScoring::Cohort => {}
    }
}

fn retain(sets: &mut MemberSets, target: MeasurePopulationType, by: MeasurePopulationType) {
    let Some(other) = sets.get(&by).cloned() else {
        return;
    };
    if let Some(members) = sets.get_mut(&target) {
        members.retain_in(&other);
    }
}

fn remove(sets: &mut MemberSets, target: MeasurePopulationType, by: MeasurePopulationType) {
    let Some(other) = sets.get(&by).cloned() else {
        return;
    };
    if let Some(members) = sets.get_mut(&target) {
        members.remove_in(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::EvaluationResult;
    use octofhir_measure_types::ResultValue;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_evaluator_is_send_sync() {
        assert_send_sync::<MeasureEvaluator>();
    }

    fn members(subjects: &[&str]) -> SubjectMembers {
        let results = subjects.iter().fold(SubjectResults::new(), |acc, s| {
            acc.with(*s, EvaluationResult::new().with("x", ResultValue::boolean(true)))
        });
        SubjectMembers::from_results(&results, "x", true, "Patient")
    }

    #[test]
    fn test_proportion_set_membership() {
        let mut sets = MemberSets::new();
        sets.insert(InitialPopulation, members(&["p1", "p2", "p3", "p4"]));
        sets.insert(Denominator, members(&["p1", "p2", "p3", "p5"]));
        sets.insert(Numerator, members(&["p1", "p2", "p6"]));
        sets.insert(DenominatorExclusion, members(&["p2", "p7"]));
        sets.insert(DenominatorException, members(&["p1", "p3"]));
        apply_set_membership(MeasureScoring::Proportion, &mut sets);

        assert_eq!(sets[&Denominator], members(&["p1", "p2", "p3"]));
        assert_eq!(sets[&Numerator], members(&["p1"]));
        assert_eq!(sets[&DenominatorExclusion], members(&["p2"]));
        assert_eq!(sets[&DenominatorException], members(&["p3"]));
    }

    #[test]
    fn test_continuous_variable_set_membership() {
        let mut sets = MemberSets::new();
        sets.insert(InitialPopulation, members(&["p1", "p2"]));
        sets.insert(MeasurePopulation, members(&["p1", "p2", "p3"]));
        sets.insert(MeasurePopulationExclusion, members(&["p3"]));
        apply_set_membership(MeasureScoring::ContinuousVariable, &mut sets);

        assert_eq!(sets[&MeasurePopulation], members(&["p1", "p2"]));
        assert!(sets[&MeasurePopulationExclusion].is_empty());
    }
}
