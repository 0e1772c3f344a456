//! Consumption Prep - feature preprocessing for two-site electricity
//! consumption regression
//!
//! This crate turns raw hourly train/test tables and a target table into
//! model-ready views:
//! - Location column pruning and timestamp indexing
//! - Calendar features (hour, day of week, month, weekend, public holidays)
//! - Rolling-week smoothed temperature and humidity per site
//! - Optional min-max normalization
//! - Per-site feature views and aligned consumption targets
//!
//! Loading and saving tables is left to the caller; every stage works on
//! in-memory polars `DataFrame`s.
//!
//! # Modules
//!
//! - [`preprocessing`] - The feature pipeline, its configuration and tables
//! - [`timeseries`] - Interpolation, rolling means and calendar helpers
//!
//! # Example
//!
//! ```no_run
//! use consumption_prep::prelude::*;
//! use polars::prelude::*;
//!
//! # fn load() -> (DataFrame, DataFrame, DataFrame) { unimplemented!() }
//! let (train, test, targets) = load();
//! let pipeline = FeaturePipeline::with_config(PipelineConfig::extended());
//! let output = pipeline.run(&train, &test, &targets)?;
//! println!("site 1 features: {:?}", output.train_site1.column_names());
//! # Ok::<(), PrepError>(())
//! ```

// Core error handling
pub mod error;

// Pipeline
pub mod preprocessing;
pub mod timeseries;

pub use error::{PrepError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PrepError, Result};

    // Pipeline
    pub use crate::preprocessing::{
        FeaturePipeline, MinMaxScaler, PipelineConfig, PipelineOutput, RunStats, ScalerFit, Site,
        SiteView, TargetSeries, TimeSeriesTable,
    };

    // Time series
    pub use crate::timeseries::{CalendarFeatures, HolidayCalendar, SmoothingSpec};
}
