//! Time series module
//!
//! Array-level building blocks used by the feature pipeline:
//! - Linear gap interpolation
//! - Trailing rolling means and backward fill
//! - Weather smoothing (interpolate → roll → backfill → round)
//! - Calendar attributes and the public holiday calendar

mod calendar;
mod features;

pub use calendar::{easter_sunday, CalendarFeatures, HolidayCalendar};
pub use features::{
    backward_fill, interpolate_linear, rolling_mean, round_half_even, smooth, SmoothingSpec,
    WEEK_WINDOW,
};
