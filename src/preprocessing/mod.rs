//! Data preprocessing module
//!
//! Turns the raw two-site consumption tables into model-ready views:
//! - Location column pruning
//! - Timestamp indexing
//! - Calendar and smoothed weather features
//! - Min-max normalization
//! - Per-site feature and target splitting

mod config;
mod pipeline;
mod scaler;
mod table;

pub use config::{PipelineConfig, ScalerFit, MAX_DECIMALS};
pub use pipeline::{FeaturePipeline, PipelineOutput, RunStats};
pub use scaler::MinMaxScaler;
pub use table::{parse_timestamp, SiteView, TargetSeries, TimeSeriesTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row key column of the raw tables
pub const TIMESTAMP: &str = "timestamp";

/// Raw location identifiers, dropped before any feature work
pub const LOCATION_COLUMNS: [&str; 5] = [
    "loc_1",
    "loc_2",
    "loc_secondary_1",
    "loc_secondary_2",
    "loc_secondary_3",
];

pub const MEAN_NATIONAL_TEMP: &str = "mean_national_temp";

/// Consumption of the secondary sources, shared by both sites
pub const SECONDARY_CONSUMPTION: [&str; 3] = [
    "consumption_secondary_1",
    "consumption_secondary_2",
    "consumption_secondary_3",
];

pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const MONTH: &str = "month";
pub const IS_WEEKEND: &str = "is_weekend";
pub const IS_HOLIDAY: &str = "is_holiday";

/// Every column the calendar stage can add
pub const CALENDAR_COLUMNS: [&str; 5] = [IS_HOLIDAY, HOUR, DAY_OF_WEEK, MONTH, IS_WEEKEND];

/// One of the two supply sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    One,
    Two,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::One, Site::Two];

    pub fn number(self) -> u8 {
        match self {
            Site::One => 1,
            Site::Two => 2,
        }
    }

    pub fn other(self) -> Site {
        match self {
            Site::One => Site::Two,
            Site::Two => Site::One,
        }
    }

    pub fn temperature_column(self) -> &'static str {
        match self {
            Site::One => "temp_1",
            Site::Two => "temp_2",
        }
    }

    pub fn humidity_column(self) -> &'static str {
        match self {
            Site::One => "humidity_1",
            Site::Two => "humidity_2",
        }
    }

    pub fn smoothed_temperature_column(self) -> &'static str {
        match self {
            Site::One => "temp_1_smooth7D",
            Site::Two => "temp_2_smooth7D",
        }
    }

    pub fn smoothed_humidity_column(self) -> &'static str {
        match self {
            Site::One => "humidity_1_smooth7D",
            Site::Two => "humidity_2_smooth7D",
        }
    }

    /// Raw and smoothed weather columns belonging to this site
    pub fn weather_columns(self) -> [&'static str; 4] {
        [
            self.temperature_column(),
            self.humidity_column(),
            self.smoothed_temperature_column(),
            self.smoothed_humidity_column(),
        ]
    }

    /// Consumption label in the target table
    pub fn target_column(self) -> &'static str {
        match self {
            Site::One => "consumption_1",
            Site::Two => "consumption_2",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site {}", self.number())
    }
}

/// Columns rescaled by the normalization stage
pub fn normalized_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Site::ALL
        .iter()
        .flat_map(|site| site.weather_columns())
        .collect();
    columns.push(MEAN_NATIONAL_TEMP);
    columns.extend(SECONDARY_CONSUMPTION);
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_columns() {
        assert_eq!(Site::One.weather_columns()[2], "temp_1_smooth7D");
        assert_eq!(Site::Two.target_column(), "consumption_2");
        assert_eq!(Site::One.other(), Site::Two);
        assert_eq!(Site::Two.to_string(), "site 2");
    }

    #[test]
    fn test_normalized_columns() {
        let columns = normalized_columns();
        assert_eq!(columns.len(), 12);
        assert!(columns.contains(&"humidity_2_smooth7D"));
        assert!(columns.contains(&MEAN_NATIONAL_TEMP));
        assert!(!columns.contains(&HOUR));
    }

    #[test]
    fn test_site_serialize() {
        let json = serde_json::to_string(&Site::One).unwrap();
        assert_eq!(json, "\"One\"");
    }
}
