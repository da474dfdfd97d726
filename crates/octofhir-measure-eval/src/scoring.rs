//! Score formulas

use octofhir_measure_types::{MeasurePopulationType, MeasureScoring};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::observation::RatioObservations;

/// Population counts entering a proportion or ratio score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProportionCounts {
    pub numerator: usize,
    pub numerator_exclusion: usize,
    pub denominator: usize,
    pub denominator_exclusion: usize,
    pub denominator_exception: usize,
}

impl ProportionCounts {
    pub fn from_counts(count: impl Fn(MeasurePopulationType) -> usize) -> Self {
        Self {
            numerator: count(MeasurePopulationType::Numerator),
            numerator_exclusion: count(MeasurePopulationType::NumeratorExclusion),
            denominator: count(MeasurePopulationType::Denominator),
            denominator_exclusion: count(MeasurePopulationType::DenominatorExclusion),
            denominator_exception: count(MeasurePopulationType::DenominatorException),
        }
    }

    /// Numerator less its exclusions
    pub fn effective_numerator(&self) -> usize {
        self.numerator.saturating_sub(self.numerator_exclusion)
    }

    /// Denominator less its exclusions and exceptions
    pub fn effective_denominator(&self) -> usize {
        self.denominator
            .saturating_sub(self.denominator_exclusion)
            .saturating_sub(self.denominator_exception)
    }

    /// `None` when the effective denominator is zero
    pub fn score(&self) -> Option<f64> {
        let denominator = self.effective_denominator();
        if denominator == 0 {
            return None;
        }
        Some(self.effective_numerator() as f64 / denominator as f64)
    }
}

/// Ratio of two observation aggregates; `None` if either is absent or the
/// denominator aggregate is zero
///
/// A zero numerator scores zero only over a positive denominator.
pub fn ratio_observation_score(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator.is_zero() {
        return None;
    }
    if numerator.is_zero() {
        return (!denominator.is_sign_negative()).then_some(0.0);
    }
    Some(numerator.to_f64()? / denominator.to_f64()?)
}

/// Score of a group or stratum
///
/// `count` yields the reported count of a population type, `aggregation` the
/// aggregation result of an observation population by id.
pub fn score(
    scoring: MeasureScoring,
    ratio_observations: Option<RatioObservations<'_>>,
    count: impl Fn(MeasurePopulationType) -> usize,
    aggregation: impl Fn(&str) -> Option<Decimal>,
    observation_id: Option<&str>,
) -> Option<f64> {
    match scoring {
        MeasureScoring::Cohort => None,
        MeasureScoring::Proportion => ProportionCounts::from_counts(count).score(),
        MeasureScoring::Ratio => match ratio_observations {
            Some(obs) => ratio_observation_score(
                aggregation(obs.numerator.id.as_str()),
                aggregation(obs.denominator.id.as_str()),
            ),
            None => ProportionCounts::from_counts(count).score(),
        },
        MeasureScoring::ContinuousVariable => {
            observation_id.and_then(aggregation).and_then(|d| d.to_f64())
        }
    }
}
