//! The yearly indicator table: CSV decoding and validation.
//!
//! A [`YearRecord`] is one CSV row; an [`IndicatorTable`] is the validated,
//! immutable column-oriented view the analyzers consume.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AnalysisError, Result};
use crate::indicators::Indicator;

/// A single row deserialized from the indicator CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub critical_failures: f64,
    pub major_failures: f64,
    pub minor_failures: f64,
    pub train_hour_losses: f64,
    pub investment: f64,
    pub daily_ridership: f64,
    pub equipment_failures: f64,
    pub fare_cost: f64,
    pub headway: f64,
}

impl YearRecord {
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::CriticalFailures => self.critical_failures,
            Indicator::MajorFailures => self.major_failures,
            Indicator::MinorFailures => self.minor_failures,
            Indicator::TrainHourLosses => self.train_hour_losses,
            Indicator::Investment => self.investment,
            Indicator::DailyRidership => self.daily_ridership,
            Indicator::EquipmentFailures => self.equipment_failures,
            Indicator::FareCost => self.fare_cost,
            Indicator::Headway => self.headway,
        }
    }
}

/// Validated column-oriented indicator data for a run of years.
///
/// Invariants: years are strictly increasing and unique, every year has a
/// finite value for every indicator. Constructed only through
/// [`IndicatorTable::from_records`].
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    years: Vec<i32>,
    columns: Vec<Vec<f64>>,
}

impl IndicatorTable {
    /// Builds a table from decoded CSV rows, validating the invariants.
    pub fn from_records(records: &[YearRecord]) -> Result<Self> {
        let mut years = Vec::with_capacity(records.len());
        let mut columns = vec![Vec::with_capacity(records.len()); Indicator::ALL.len()];

        for record in records {
            if let Some(&prev) = years.last() {
                if record.year <= prev {
                    return Err(AnalysisError::Input(format!(
                        "years must be strictly increasing: {} follows {}",
                        record.year, prev
                    )));
                }
            }
            for indicator in Indicator::ALL {
                let value = record.value(indicator);
                if !value.is_finite() {
                    return Err(AnalysisError::Input(format!(
                        "non-finite value for {} in year {}",
                        indicator.name(),
                        record.year
                    )));
                }
                columns[indicator.position()].push(value);
            }
            years.push(record.year);
        }

        Ok(IndicatorTable { years, columns })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn n_periods(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// The full value series of one indicator, in year order.
    pub fn series(&self, indicator: Indicator) -> &[f64] {
        &self.columns[indicator.position()]
    }
}

/// Reads and validates an indicator table from any CSV source.
pub fn read_table<R: Read>(reader: R) -> Result<IndicatorTable> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let record: YearRecord =
            result.map_err(|e| AnalysisError::Input(format!("CSV decode failed: {e}")))?;
        records.push(record);
    }

    IndicatorTable::from_records(&records)
}

/// Loads an indicator table from a CSV file on disk.
pub fn load_table(path: impl AsRef<Path>) -> Result<IndicatorTable> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading indicator table");

    let file = File::open(path).map_err(|e| {
        AnalysisError::Input(format!("cannot open {}: {e}", path.display()))
    })?;
    let table = read_table(file)?;

    debug!(years = table.n_periods(), "Indicator table loaded");
    Ok(table)
}
