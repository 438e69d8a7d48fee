//! Min-max normalization of indicator columns to a common [0, 1] scale.

use crate::indicators::{Direction, Indicator};
use crate::table::IndicatorTable;

/// Indicator data rescaled to [0, 1], larger always meaning better service.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    years: Vec<i32>,
    columns: Vec<(Indicator, Vec<f64>)>,
}

impl NormalizedTable {
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn n_periods(&self) -> usize {
        self.years.len()
    }

    pub fn columns(&self) -> &[(Indicator, Vec<f64>)] {
        &self.columns
    }

    pub fn series(&self, indicator: Indicator) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(ind, _)| *ind == indicator)
            .map(|(_, values)| values.as_slice())
    }
}

/// Rescales one column to [0, 1] according to its direction.
///
/// A `LowerIsBetter` column is inverted so that the best raw value maps to
/// 1. A constant column maps every value to the neutral 0.5 instead of
/// dividing by zero.
pub fn normalize_series(values: &[f64], direction: Direction) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    if max == min {
        return vec![0.5; values.len()];
    }

    let range = max - min;
    values
        .iter()
        .map(|&x| match direction {
            Direction::HigherIsBetter => (x - min) / range,
            Direction::LowerIsBetter => (max - x) / range,
        })
        .collect()
}

/// Normalizes the given indicator columns of a table, each independently,
/// using the indicator's static direction. An empty table yields an empty
/// result.
pub fn normalize(table: &IndicatorTable, indicators: &[Indicator]) -> NormalizedTable {
    let columns = indicators
        .iter()
        .map(|&ind| (ind, normalize_series(table.series(ind), ind.direction())))
        .collect();

    NormalizedTable {
        years: table.years().to_vec(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{IndicatorTable, YearRecord};

    #[test]
    fn test_higher_is_better_maps_min_to_zero_max_to_one() {
        let out = normalize_series(&[10.0, 20.0, 15.0], Direction::HigherIsBetter);
        assert_eq!(out, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_lower_is_better_inverts() {
        let out = normalize_series(&[10.0, 20.0, 15.0], Direction::LowerIsBetter);
        assert_eq!(out, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_constant_column_maps_to_neutral() {
        let out = normalize_series(&[7.0, 7.0, 7.0], Direction::HigherIsBetter);
        assert_eq!(out, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_empty_series() {
        assert!(normalize_series(&[], Direction::HigherIsBetter).is_empty());
    }

    #[test]
    fn test_output_stays_in_unit_interval() {
        let values = [3.2, -1.5, 8.9, 0.0, 4.4];
        for direction in [Direction::HigherIsBetter, Direction::LowerIsBetter] {
            for v in normalize_series(&values, direction) {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_normalize_table_keeps_years_and_indicator_set() {
        let records = [
            YearRecord {
                year: 2020,
                critical_failures: 2.0,
                major_failures: 5.0,
                minor_failures: 6.0,
                train_hour_losses: 186.0,
                investment: 101163.0,
                daily_ridership: 315804.0,
                equipment_failures: 0.0,
                fare_cost: 57.0,
                headway: 5.9,
            },
            YearRecord {
                year: 2021,
                critical_failures: 1.0,
                major_failures: 0.0,
                minor_failures: 7.0,
                train_hour_losses: 188.0,
                investment: 114465.0,
                daily_ridership: 409985.0,
                equipment_failures: 0.0,
                fare_cost: 60.0,
                headway: 5.9,
            },
        ];
        let table = IndicatorTable::from_records(&records).unwrap();
        let normalized = normalize(&table, &Indicator::INDEX_COMPONENTS);

        assert_eq!(normalized.years(), &[2020, 2021]);
        assert_eq!(normalized.columns().len(), 8);
        // Fewer critical failures in 2021, so it normalizes to the better end.
        assert_eq!(
            normalized.series(Indicator::CriticalFailures).unwrap(),
            &[0.0, 1.0]
        );
        // Constant equipment failures collapse to the neutral value.
        assert_eq!(
            normalized.series(Indicator::EquipmentFailures).unwrap(),
            &[0.5, 0.5]
        );
        assert!(normalized.series(Indicator::Headway).is_none());
    }
}
