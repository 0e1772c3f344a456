//! Timestamp-indexed tables and the views handed to model training

use super::Site;
use crate::error::{PrepError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ndarray::Array1;
use polars::prelude::*;

/// Formats tried in order before falling back to RFC 3339 and bare dates
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a raw timestamp. Offsets are normalized to UTC and dropped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Read a column as `f64`, mapping nulls to `NaN`
pub(crate) fn column_as_array(frame: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = frame
        .column(name)
        .map_err(|_| PrepError::missing_column(name))?;
    let casted = column.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Build a `Float64` column, mapping `NaN` back to null
pub(crate) fn array_to_column(name: &str, values: &Array1<f64>) -> Column {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(v) })
        .collect();
    Column::new(name.into(), values)
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Rows keyed by a unique, ascending timestamp index
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    index: Vec<NaiveDateTime>,
    frame: DataFrame,
}

impl TimeSeriesTable {
    /// Pair an index with its columns, checking the index invariants
    pub fn new(index: Vec<NaiveDateTime>, frame: DataFrame) -> Result<Self> {
        if index.len() != frame.height() {
            return Err(PrepError::SchemaError(format!(
                "index has {} entries but the table has {} rows",
                index.len(),
                frame.height()
            )));
        }
        for pair in index.windows(2) {
            if pair[0] == pair[1] {
                return Err(PrepError::DuplicateTimestamp(pair[0].to_string()));
            }
            if pair[0] > pair[1] {
                return Err(PrepError::SchemaError(format!(
                    "index must be sorted ascending: {} precedes {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { index, frame })
    }

    /// Caller guarantees the index invariants already hold
    pub(crate) fn from_parts(index: Vec<NaiveDateTime>, frame: DataFrame) -> Self {
        debug_assert_eq!(index.len(), frame.height());
        Self { index, frame }
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_parts(self) -> (Vec<NaiveDateTime>, DataFrame) {
        (self.index, self.frame)
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Column values as `f64` with `NaN` for missing samples
    pub fn values(&self, name: &str) -> Result<Array1<f64>> {
        column_as_array(&self.frame, name)
    }
}

/// Feature table restricted to one site's columns
#[derive(Debug, Clone)]
pub struct SiteView {
    site: Site,
    table: TimeSeriesTable,
}

impl SiteView {
    pub fn new(site: Site, table: TimeSeriesTable) -> Self {
        Self { site, table }
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn table(&self) -> &TimeSeriesTable {
        &self.table
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        self.table.index()
    }

    pub fn frame(&self) -> &DataFrame {
        self.table.frame()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.table.column_names()
    }

    pub fn into_table(self) -> TimeSeriesTable {
        self.table
    }
}

/// Consumption label of one site, aligned to a feature index
#[derive(Debug, Clone)]
pub struct TargetSeries {
    site: Site,
    index: Vec<NaiveDateTime>,
    values: Series,
}

impl TargetSeries {
    pub fn new(site: Site, index: Vec<NaiveDateTime>, values: Series) -> Self {
        Self { site, index, values }
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &Series {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn to_vec(&self) -> Result<Vec<Option<f64>>> {
        Ok(self.values.f64()?.into_iter().collect())
    }
}
