//! The closed set of yearly operational indicators tracked for a line.
//!
//! Indicators are a fixed enumeration rather than free-form strings so the
//! normalization direction of every column is known statically.

use serde::{Deserialize, Serialize};

/// One measured quantity per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Category-1 (critical) service failures.
    CriticalFailures,
    /// Category-2 (major) service failures.
    MajorFailures,
    /// Category-3 (minor) service failures.
    MinorFailures,
    /// Train-hours lost to disruptions.
    TrainHourLosses,
    /// Capital investment, millions.
    Investment,
    /// Average daily ridership.
    DailyRidership,
    /// Technical equipment failures.
    EquipmentFailures,
    /// Single-ride fare cost.
    FareCost,
    /// Scheduled headway between trains, minutes.
    Headway,
}

/// Whether larger raw values of an indicator mean better service.
///
/// Fixed metadata per indicator; never derived from the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Indicator {
    /// Every indicator, in CSV column order.
    pub const ALL: [Indicator; 9] = [
        Indicator::CriticalFailures,
        Indicator::MajorFailures,
        Indicator::MinorFailures,
        Indicator::TrainHourLosses,
        Indicator::Investment,
        Indicator::DailyRidership,
        Indicator::EquipmentFailures,
        Indicator::FareCost,
        Indicator::Headway,
    ];

    /// The indicators aggregated into the composite quality index.
    ///
    /// Headway is excluded: it is the service-level outcome the index is
    /// later regressed against, not one of its components.
    pub const INDEX_COMPONENTS: [Indicator; 8] = [
        Indicator::CriticalFailures,
        Indicator::MajorFailures,
        Indicator::MinorFailures,
        Indicator::TrainHourLosses,
        Indicator::Investment,
        Indicator::DailyRidership,
        Indicator::EquipmentFailures,
        Indicator::FareCost,
    ];

    /// Stable snake_case name, matching the CSV column header.
    pub fn name(self) -> &'static str {
        match self {
            Indicator::CriticalFailures => "critical_failures",
            Indicator::MajorFailures => "major_failures",
            Indicator::MinorFailures => "minor_failures",
            Indicator::TrainHourLosses => "train_hour_losses",
            Indicator::Investment => "investment",
            Indicator::DailyRidership => "daily_ridership",
            Indicator::EquipmentFailures => "equipment_failures",
            Indicator::FareCost => "fare_cost",
            Indicator::Headway => "headway",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Indicator::CriticalFailures
            | Indicator::MajorFailures
            | Indicator::MinorFailures
            | Indicator::TrainHourLosses
            | Indicator::EquipmentFailures
            | Indicator::Headway => Direction::LowerIsBetter,
            Indicator::Investment | Indicator::DailyRidership | Indicator::FareCost => {
                Direction::HigherIsBetter
            }
        }
    }

    /// Position of this indicator within [`Indicator::ALL`].
    pub fn position(self) -> usize {
        match self {
            Indicator::CriticalFailures => 0,
            Indicator::MajorFailures => 1,
            Indicator::MinorFailures => 2,
            Indicator::TrainHourLosses => 3,
            Indicator::Investment => 4,
            Indicator::DailyRidership => 5,
            Indicator::EquipmentFailures => 6,
            Indicator::FareCost => 7,
            Indicator::Headway => 8,
        }
    }
}
