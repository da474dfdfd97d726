//! Aggregation of measure observation values

use octofhir_measure_diagnostics::{MSR0305, MeasureError, Result};
use octofhir_measure_types::AggregateMethod;
use rust_decimal::Decimal;

/// Combine observation values; `None` for an empty input
///
/// Median of an even number of values is the mean of the two middle values.
/// A sum or average beyond the decimal range is an error.
pub fn aggregate(values: &[Decimal], method: AggregateMethod) -> Result<Option<Decimal>> {
    if values.is_empty() {
        return Ok(None);
    }
    let value = match method {
        AggregateMethod::Count => Decimal::from(values.len()),
        AggregateMethod::Sum => checked_sum(values, method)?,
        AggregateMethod::Average => checked_sum(values, method)?
            .checked_div(Decimal::from(values.len()))
            .ok_or_else(|| overflow(method))?,
        AggregateMethod::Minimum => return Ok(values.iter().min().copied()),
        AggregateMethod::Maximum => return Ok(values.iter().max().copied()),
        AggregateMethod::Median => {
            let mut sorted = values.to_vec();
            sorted.sort();
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 1 {
                sorted[mid]
            } else {
                midpoint(sorted[mid - 1], sorted[mid]).ok_or_else(|| overflow(method))?
            }
        }
    };
    Ok(Some(value))
}

/// Mean of two sorted values without leaving the range spanned by them
fn midpoint(low: Decimal, high: Decimal) -> Option<Decimal> {
    if low.is_sign_negative() == high.is_sign_negative() {
        high.checked_sub(low)?
            .checked_div(Decimal::TWO)?
            .checked_add(low)
    } else {
        low.checked_add(high)?.checked_div(Decimal::TWO)
    }
}

fn checked_sum(values: &[Decimal], method: AggregateMethod) -> Result<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| overflow(method))
}

fn overflow(method: AggregateMethod) -> MeasureError {
    MeasureError::aggregation(
        MSR0305,
        format!(
            "Measure observation aggregate method: {}, result is outside the decimal range",
            method
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn decimals(values: &[i64]) -> Vec<Decimal> {
        values.iter().copied().map(Decimal::from).collect()
    }

    #[rstest]
    #[case(AggregateMethod::Count, Decimal::from(4))]
    #[case(AggregateMethod::Sum, Decimal::from(20))]
    #[case(AggregateMethod::Average, Decimal::from(5))]
    #[case(AggregateMethod::Minimum, Decimal::from(1))]
    #[case(AggregateMethod::Maximum, Decimal::from(10))]
    #[case(AggregateMethod::Median, Decimal::new(45, 1))]
    fn test_aggregates(#[case] method: AggregateMethod, #[case] expected: Decimal) {
        assert_eq!(aggregate(&decimals(&[10, 1, 6, 3]), method).unwrap(), Some(expected));
    }

    #[test]
    fn test_odd_median() {
        assert_eq!(
            aggregate(&decimals(&[7, 1, 3]), AggregateMethod::Median).unwrap(),
            Some(Decimal::from(3))
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(aggregate(&[], AggregateMethod::Sum).unwrap(), None);
        assert_eq!(aggregate(&[], AggregateMethod::Count).unwrap(), None);
    }

    #[rstest]
    #[case(AggregateMethod::Sum)]
    #[case(AggregateMethod::Average)]
    fn test_sum_beyond_decimal_range_is_error(#[case] method: AggregateMethod) {
        let err = aggregate(&[Decimal::MAX, Decimal::MAX], method).unwrap_err();
        assert_eq!(err.code(), MSR0305);
        assert_eq!(
            err.message(),
            format!(
                "Measure observation aggregate method: {}, result is outside the decimal range",
                method
            )
        );
    }

    #[test]
    fn test_median_near_decimal_range() {
        let values = [Decimal::MAX, Decimal::MAX, Decimal::ONE, Decimal::MAX];
        assert_eq!(
            aggregate(&values, AggregateMethod::Median).unwrap(),
            Some(Decimal::MAX)
        );
        assert_eq!(
            aggregate(&[Decimal::MIN, Decimal::MAX], AggregateMethod::Median).unwrap(),
            Some(Decimal::ZERO)
        );
        assert_eq!(
            aggregate(&[Decimal::MAX, Decimal::MAX], AggregateMethod::Maximum).unwrap(),
            Some(Decimal::MAX)
        );
    }

    proptest! {
        #[test]
        fn prop_median_between_min_and_max(values in prop::collection::vec(-1000i64..1000, 1..40)) {
            let values = decimals(&values);
            let median = aggregate(&values, AggregateMethod::Median).unwrap().unwrap();
            prop_assert!(median >= aggregate(&values, AggregateMethod::Minimum).unwrap().unwrap());
            prop_assert!(median <= aggregate(&values, AggregateMethod::Maximum).unwrap().unwrap());
        }
    }
}
