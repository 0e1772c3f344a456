//! Feature pipeline: raw tables in, per-site views out

use super::{
    config::{PipelineConfig, ScalerFit},
    normalized_columns,
    scaler::MinMaxScaler,
    table::{array_to_column, column_as_array, column_names, parse_timestamp},
    Site, SiteView, TargetSeries, TimeSeriesTable, DAY_OF_WEEK, HOUR, IS_HOLIDAY, IS_WEEKEND,
    LOCATION_COLUMNS, MONTH, TIMESTAMP,
};
use crate::error::{PrepError, Result};
use crate::timeseries::{interpolate_linear, smooth, CalendarFeatures, HolidayCalendar};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Row counts and stage timings (seconds) of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Prune, index, calendar and smoothing of both tables
    pub feature_time: f64,
    /// None when normalization is disabled
    pub normalize_time: Option<f64>,
    /// Site split and target alignment
    pub split_time: f64,
    pub total_time: f64,
}

/// Everything handed to model training
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub train_site1: SiteView,
    pub train_site2: SiteView,
    pub test_site1: SiteView,
    pub test_site2: SiteView,
    pub y_site1: TargetSeries,
    pub y_site2: TargetSeries,
    pub stats: RunStats,
}

impl PipelineOutput {
    pub fn train_view(&self, site: Site) -> &SiteView {
        match site {
            Site::One => &self.train_site1,
            Site::Two => &self.train_site2,
        }
    }

    pub fn test_view(&self, site: Site) -> &SiteView {
        match site {
            Site::One => &self.test_site1,
            Site::Two => &self.test_site2,
        }
    }

    pub fn target(&self, site: Site) -> &TargetSeries {
        match site {
            Site::One => &self.y_site1,
            Site::Two => &self.y_site2,
        }
    }
}

/// Linear preprocessing pipeline over the two-site consumption tables.
///
/// Stages run strictly in order:
/// prune → index → [holiday] → calendar → [weekend] → smoothing →
/// [normalize] → split. Each stage fails with `SchemaError` when the
/// columns produced by an earlier stage are absent.
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a new pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Drop the five raw location identifiers, keeping the order of the rest
    pub fn prune_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        if let Some(missing) = LOCATION_COLUMNS
            .iter()
            .find(|name| df.column(name).is_err())
        {
            return Err(PrepError::missing_column(missing));
        }

        let keep: Vec<String> = column_names(df)
            .into_iter()
            .filter(|name| !LOCATION_COLUMNS.contains(&name.as_str()))
            .collect();

        Ok(df.select(keep)?)
    }

    /// Parse the timestamp column into the row index and sort rows by it
    pub fn index_by_time(&self, df: &DataFrame) -> Result<TimeSeriesTable> {
        let column = df
            .column(TIMESTAMP)
            .map_err(|_| PrepError::missing_column(TIMESTAMP))?;
        let as_text = column.cast(&DataType::String)?;
        let text = as_text.str()?;

        let mut stamps = Vec::with_capacity(df.height());
        for (row, value) in text.into_iter().enumerate() {
            let raw = value
                .ok_or_else(|| PrepError::ParseError(format!("null timestamp at row {}", row)))?;
            let ts = parse_timestamp(raw).ok_or_else(|| {
                PrepError::ParseError(format!("unparseable timestamp '{}' at row {}", raw, row))
            })?;
            stamps.push(ts);
        }

        let mut order: Vec<usize> = (0..stamps.len()).collect();
        order.sort_by_key(|&i| stamps[i]);

        if let Some(pair) = order.windows(2).find(|p| stamps[p[0]] == stamps[p[1]]) {
            return Err(PrepError::DuplicateTimestamp(format!(
                "{} appears at rows {} and {}",
                stamps[pair[0]], pair[0], pair[1]
            )));
        }

        let mut frame = df.drop(TIMESTAMP)?;
        let sorted = order.iter().enumerate().all(|(pos, &i)| pos == i);
        if !sorted {
            let indices: Vec<IdxSize> = order.iter().map(|&i| i as IdxSize).collect();
            frame = frame.take(&IdxCa::from_vec("order".into(), indices))?;
        }
        let index = order.into_iter().map(|i| stamps[i]).collect();

        Ok(TimeSeriesTable::from_parts(index, frame))
    }

    /// Add hour, day of week and month, plus the configured holiday and
    /// weekend flags, all derived from the index
    pub fn derive_calendar_features(&self, table: TimeSeriesTable) -> Result<TimeSeriesTable> {
        let holidays = self
            .config
            .add_holiday_flag
            .then(|| HolidayCalendar::for_index(table.index()));
        let features = CalendarFeatures::from_index(table.index(), holidays.as_ref());
        let (index, mut frame) = table.into_parts();

        if let Some(flags) = features.is_holiday {
            frame.with_column(Column::new(IS_HOLIDAY.into(), flags))?;
        }
        frame.with_column(Column::new(HOUR.into(), features.hour))?;
        frame.with_column(Column::new(DAY_OF_WEEK.into(), features.day_of_week))?;
        frame.with_column(Column::new(MONTH.into(), features.month))?;
        if self.config.add_weekend_flag {
            frame.with_column(Column::new(IS_WEEKEND.into(), features.is_weekend))?;
        }

        debug!(columns = frame.width(), "Calendar features derived");
        Ok(TimeSeriesTable::from_parts(index, frame))
    }

    /// Add the rolling-week temperature and humidity of both sites
    pub fn derive_smoothed_weather(&self, table: TimeSeriesTable) -> Result<TimeSeriesTable> {
        let (index, mut frame) = table.into_parts();
        let temperature = self.config.temperature_spec();
        let humidity = self.config.humidity_spec();

        for site in Site::ALL {
            let pairs = [
                (site.temperature_column(), site.smoothed_temperature_column(), &temperature),
                (site.humidity_column(), site.smoothed_humidity_column(), &humidity),
            ];
            for (source, target, spec) in pairs {
                let raw = column_as_array(&frame, source)?;
                let smoothed = smooth(&raw, spec).map_err(|e| match e {
                    PrepError::InsufficientDataError(msg) => {
                        PrepError::InsufficientDataError(format!("{}: {}", source, msg))
                    }
                    other => other,
                })?;
                frame.with_column(array_to_column(target, &smoothed))?;
            }
        }

        debug!(window = temperature.window, "Smoothed weather derived");
        Ok(TimeSeriesTable::from_parts(index, frame))
    }

    /// Min-max scale the weather and secondary consumption columns, then
    /// interpolate any gaps left in them
    pub fn normalize(
        &self,
        train: TimeSeriesTable,
        test: TimeSeriesTable,
    ) -> Result<(TimeSeriesTable, TimeSeriesTable)> {
        let columns = normalized_columns();
        let (train_index, train_frame) = train.into_parts();
        let (test_index, test_frame) = test.into_parts();

        let mut train_scaler = MinMaxScaler::new();
        let train_frame = train_scaler.fit_transform(&train_frame, &columns)?;
        let test_frame = match self.config.scaler_fit {
            ScalerFit::TrainOnly => train_scaler.transform(&test_frame)?,
            ScalerFit::Independent => {
                warn!("Test table scaled on its own distribution; train and test mappings differ");
                MinMaxScaler::new().fit_transform(&test_frame, &columns)?
            }
        };

        let train_frame = interpolate_columns(train_frame, &columns)?;
        let test_frame = interpolate_columns(test_frame, &columns)?;

        debug!(columns = columns.len(), fit = ?self.config.scaler_fit, "Normalized");
        Ok((
            TimeSeriesTable::from_parts(train_index, train_frame),
            TimeSeriesTable::from_parts(test_index, test_frame),
        ))
    }

    /// Split an enriched table into the two site views
    pub fn split_by_site(&self, table: &TimeSeriesTable) -> Result<(SiteView, SiteView)> {
        for site in Site::ALL {
            if let Some(missing) = site
                .weather_columns()
                .into_iter()
                .find(|name| !table.has_column(name))
            {
                return Err(PrepError::missing_column(missing));
            }
        }

        let view = |site: Site| -> Result<SiteView> {
            let excluded = site.other().weather_columns();
            let keep: Vec<String> = table
                .column_names()
                .into_iter()
                .filter(|name| !excluded.contains(&name.as_str()))
                .collect();
            let frame = table.frame().select(keep)?;
            Ok(SiteView::new(
                site,
                TimeSeriesTable::from_parts(table.index().to_vec(), frame),
            ))
        };

        Ok((view(Site::One)?, view(Site::Two)?))
    }

    /// Align the target table onto `reference_index` and extract the
    /// per-site consumption series.
    ///
    /// A target table with a timestamp column is joined by key; without one
    /// it is aligned by position, which requires equal lengths.
    pub fn align_and_split_targets(
        &self,
        targets: &DataFrame,
        reference_index: &[NaiveDateTime],
    ) -> Result<(TargetSeries, TargetSeries)> {
        for site in Site::ALL {
            if targets.column(site.target_column()).is_err() {
                return Err(PrepError::missing_column(site.target_column()));
            }
        }

        let aligned = if targets.column(TIMESTAMP).is_ok() {
            self.join_on_timestamp(targets, reference_index)?
        } else {
            if targets.height() != reference_index.len() {
                return Err(PrepError::AlignmentError(format!(
                    "target table has {} rows but the reference index has {}",
                    targets.height(),
                    reference_index.len()
                )));
            }
            warn!(
                rows = targets.height(),
                "Target table has no timestamp column, aligning by position"
            );
            targets.clone()
        };

        let series = |site: Site| -> Result<TargetSeries> {
            let column = aligned
                .column(site.target_column())
                .map_err(|_| PrepError::missing_column(site.target_column()))?
                .cast(&DataType::Float64)?;
            Ok(TargetSeries::new(
                site,
                reference_index.to_vec(),
                column.as_materialized_series().clone(),
            ))
        };

        Ok((series(Site::One)?, series(Site::Two)?))
    }

    fn join_on_timestamp(
        &self,
        targets: &DataFrame,
        reference_index: &[NaiveDateTime],
    ) -> Result<DataFrame> {
        let keyed = self.index_by_time(targets).map_err(|e| match e {
            PrepError::DuplicateTimestamp(msg) => {
                PrepError::AlignmentError(format!("duplicate target timestamp: {}", msg))
            }
            other => other,
        })?;

        if keyed.height() != reference_index.len() {
            return Err(PrepError::AlignmentError(format!(
                "target table has {} rows but the reference index has {}",
                keyed.height(),
                reference_index.len()
            )));
        }

        let unique: HashSet<&NaiveDateTime> = reference_index.iter().collect();
        if unique.len() != reference_index.len() {
            return Err(PrepError::AlignmentError(
                "reference index contains duplicate timestamps".to_string(),
            ));
        }

        let positions: HashMap<NaiveDateTime, usize> = keyed
            .index()
            .iter()
            .enumerate()
            .map(|(pos, ts)| (*ts, pos))
            .collect();

        let mut indices: Vec<IdxSize> = Vec::with_capacity(reference_index.len());
        for ts in reference_index {
            let pos = positions.get(ts).ok_or_else(|| {
                PrepError::AlignmentError(format!("no target row for timestamp {}", ts))
            })?;
            indices.push(*pos as IdxSize);
        }

        Ok(keyed
            .frame()
            .take(&IdxCa::from_vec("aligned".into(), indices))?)
    }

    /// Prune, index, calendar and smoothing stages on one table
    pub fn process(&self, df: &DataFrame) -> Result<TimeSeriesTable> {
        self.config.validate()?;
        let pruned = self.prune_columns(df)?;
        let indexed = self.index_by_time(&pruned)?;
        debug!(rows = indexed.height(), columns = indexed.width(), "Indexed by time");

        let with_calendar = self.derive_calendar_features(indexed)?;
        self.derive_smoothed_weather(with_calendar)
    }

    /// Run the full pipeline over train, test and target tables.
    ///
    /// Train and test share no state, so their feature stages run in
    /// parallel.
    pub fn run(
        &self,
        train: &DataFrame,
        test: &DataFrame,
        targets: &DataFrame,
    ) -> Result<PipelineOutput> {
        self.config.validate()?;
        let start = Instant::now();
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            normalize = self.config.normalize,
            "Starting feature pipeline"
        );

        let (train_table, test_table) =
            rayon::join(|| self.process(train), || self.process(test));
        let (mut train_table, mut test_table) = (train_table?, test_table?);
        let feature_time = start.elapsed().as_secs_f64();

        let normalize_time = if self.config.normalize {
            let stage = Instant::now();
            (train_table, test_table) = self.normalize(train_table, test_table)?;
            Some(stage.elapsed().as_secs_f64())
        } else {
            None
        };

        let stage = Instant::now();
        let (train_site1, train_site2) = self.split_by_site(&train_table)?;
        let (test_site1, test_site2) = self.split_by_site(&test_table)?;
        let (y_site1, y_site2) = self.align_and_split_targets(targets, train_table.index())?;
        let split_time = stage.elapsed().as_secs_f64();

        let stats = RunStats {
            train_rows: train_table.height(),
            test_rows: test_table.height(),
            feature_time,
            normalize_time,
            split_time,
            total_time: start.elapsed().as_secs_f64(),
        };
        info!(
            train_rows = stats.train_rows,
            test_rows = stats.test_rows,
            elapsed = stats.total_time,
            "Feature pipeline finished"
        );

        Ok(PipelineOutput {
            train_site1,
            train_site2,
            test_site1,
            test_site2,
            y_site1,
            y_site2,
            stats,
        })
    }
}

/// Linearly interpolate gaps in each listed column
fn interpolate_columns(mut frame: DataFrame, columns: &[&str]) -> Result<DataFrame> {
    for name in columns {
        let values = column_as_array(&frame, name)?;
        frame.with_column(array_to_column(name, &interpolate_linear(&values)))?;
    }
    Ok(frame)
}
