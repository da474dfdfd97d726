//! Stratifier evaluation
//!
//! Stratifier results are laid out as a table: one row per subject, or per
//! subject and observed resource for keyed results, one column per
//! component. Rows sharing the same values across every component form a
//! stratum, so a stratum only holds rows present in all components.

use indexmap::IndexMap;
use octofhir_measure_def::{GroupDef, StratifierDef};
use octofhir_measure_diagnostics::{MeasureError, Result};
use octofhir_measure_types::{PopulationBasis, ResultValue, StratifierKind};
use smallvec::SmallVec;

use crate::evaluation::SubjectResults;
use crate::observation::RatioObservations;
use crate::population::{PopulationState, StratumFilter};
use crate::result::{
    StratifierResult, StratumComponentValue, StratumPopulationResult, StratumResult,
};
use crate::scoring;

/// Component values of one row, in component order
type RowValues = SmallVec<[ResultValue; 2]>;

/// Subject, plus the observed resource for keyed results
type RowKey = (String, Option<ResultValue>);

/// A stratum before scoring
#[derive(Debug, Clone)]
struct Stratum {
    values: RowValues,
    filter: StratumFilter,
}

/// Evaluate one stratifier over the corrected populations of its group
pub fn evaluate_stratifier(
    stratifier: &StratifierDef,
    group: &GroupDef,
    populations: &[PopulationState<'_>],
    ratio_observations: Option<RatioObservations<'_>>,
    results: &SubjectResults,
) -> Result<StratifierResult> {
    let component_ids: Vec<&str> = match stratifier.kind {
        StratifierKind::Component => stratifier.components.iter().map(|c| c.id.as_str()).collect(),
        StratifierKind::Value | StratifierKind::Criteria => vec![stratifier.id.as_str()],
    };

    let strata = match stratifier.kind {
        StratifierKind::Criteria => vec![criteria_stratum(stratifier, &group.population_basis, results)],
        StratifierKind::Value => {
            let expression = stratifier.expression.as_deref().ok_or_else(|| {
                MeasureError::invalid_stratifier(&stratifier.id, "value stratifier has no criteria expression")
            })?;
            value_strata(&[expression], results)?
        }
        StratifierKind::Component => {
            if stratifier.expression.is_some() {
                return Err(MeasureError::multi_component_unsupported());
            }
            let expressions: Vec<&str> = stratifier
                .components
                .iter()
                .map(|c| c.expression.as_str())
                .collect();
            value_strata(&expressions, results)?
        }
    };

    log::debug!(
        "Stratifier {} produced {} strata",
        stratifier.id,
        strata.len()
    );

    let strata = strata
        .into_iter()
        .map(|stratum| score_stratum(stratifier.kind, &component_ids, stratum, group, populations, ratio_observations))
        .collect::<Result<Vec<_>>>()?;

    Ok(StratifierResult {
        id: stratifier.id.clone(),
        code: stratifier.code.clone(),
        kind: stratifier.kind,
        strata,
    })
}

/// Group rows by their values across all component expressions
fn value_strata(expressions: &[&str], results: &SubjectResults) -> Result<Vec<Stratum>> {
    let width = expressions.len();
    let mut table: IndexMap<RowKey, SmallVec<[Option<ResultValue>; 2]>> = IndexMap::new();
    let mut keyed = false;
    let mut plain = false;

    for (column, expression) in expressions.iter().enumerate() {
        for (subject, value) in results.results_for(expression) {
            if value.is_null() || value.is_empty_collection() {
                log::warn!(
                    "Stratifier expression {} returned no value for subject {}",
                    expression,
                    subject
                );
                continue;
            }

            let cells: Vec<(RowKey, ResultValue)> = match value.as_map() {
                Some(entries) => {
                    keyed = true;
                    entries
                        .iter()
                        .filter(|e| !e.value.is_null())
                        .map(|e| ((subject.clone(), Some(e.key.clone())), e.value.clone()))
                        .collect()
                }
                None => {
                    plain = true;
                    vec![((subject.clone(), None), stratum_value(value))]
                }
            };

            for (row, cell) in cells {
                let entry = table
                    .entry(row)
                    .or_insert_with(|| SmallVec::from_elem(None, width));
                entry[column] = Some(cell);
            }
        }
    }

    // Subject-level and resource-level components cannot be aligned row by row
    if keyed && plain && width > 1 {
        return Err(MeasureError::multi_component_unsupported());
    }

    let mut strata: IndexMap<RowValues, StratumFilter> = IndexMap::new();
    for ((subject, key), cells) in table {
        // Rows missing any component fall outside every stratum
        let Some(values) = cells.into_iter().collect::<Option<RowValues>>() else {
            continue;
        };
        let filter = strata.entry(values).or_default();
        match key {
            Some(key) => filter.add_key(&subject, key),
            None => filter.add_subject(&subject),
        }
    }

    Ok(strata
        .into_iter()
        .map(|(values, filter)| Stratum { values, filter })
        .collect())
}

/// Unwrap single-element lists so `[x]` and `x` land in the same stratum
fn stratum_value(value: &ResultValue) -> ResultValue {
    match value {
        ResultValue::List(items) if items.len() == 1 => items[0].clone(),
        other => other.clone(),
    }
}

/// The single stratum of a criteria stratifier: members the criteria selects
fn criteria_stratum(
    stratifier: &StratifierDef,
    basis: &PopulationBasis,
    results: &SubjectResults,
) -> Stratum {
    let mut filter = StratumFilter::new();
    if let Some(expression) = stratifier.expression.as_deref() {
        for (subject, value) in results.results_for(expression) {
            match (basis, value.as_map()) {
                (PopulationBasis::Boolean, _) => {
                    if value.elements().iter().any(|v| v.is_true()) {
                        filter.add_subject(subject);
                    }
                }
                (PopulationBasis::Resource(_), Some(entries)) => {
                    for entry in entries {
                        filter.add_key(subject, entry.key.clone());
                    }
                }
                (PopulationBasis::Resource(_), None) => {
                    for element in value.elements() {
                        if let ResultValue::Resource(_) = element {
                            filter.add_key(subject, element.clone());
                        }
                    }
                }
            }
        }
    }
    Stratum {
        values: RowValues::new(),
        filter,
    }
}

fn score_stratum(
    kind: StratifierKind,
    component_ids: &[&str],
    stratum: Stratum,
    group: &GroupDef,
    populations: &[PopulationState<'_>],
    ratio_observations: Option<RatioObservations<'_>>,
) -> Result<StratumResult> {
    let filter = &stratum.filter;
    let population_results = populations
        .iter()
        .map(|state| {
            Ok(StratumPopulationResult {
                id: state.def.id.clone(),
                population_type: state.def.population_type,
                count: state.count_in(filter),
                aggregation_result: state.aggregation_in(filter)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

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
        populations
            .iter()
            .find(|p| p.is_observation())
            .map(|p| p.def.id.as_str()),
    );

    let (value, components) = match kind {
        StratifierKind::Value => (stratum.values.into_iter().next(), Vec::new()),
        StratifierKind::Criteria => (None, Vec::new()),
        StratifierKind::Component => (
            None,
            component_ids
                .iter()
                .zip(stratum.values)
                .map(|(id, value)| StratumComponentValue {
                    id: (*id).to_string(),
                    value,
                })
                .collect(),
        ),
    };

    Ok(StratumResult {
        value,
        components,
        populations: population_results,
        score,
    })
}
