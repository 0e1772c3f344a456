//! Pipeline configuration

use crate::error::{PrepError, Result};
use crate::timeseries::{SmoothingSpec, WEEK_WINDOW};
use serde::{Deserialize, Serialize};

/// Largest rounding precision accepted for the smoothed features
pub const MAX_DECIMALS: u32 = 15;

/// How the normalization stage fits its scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalerFit {
    /// Fit on train, apply the same mapping to test
    #[default]
    TrainOnly,
    /// Fit train and test each on their own distribution
    Independent,
}

/// Configuration for the feature pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Add the public holiday flag
    pub add_holiday_flag: bool,

    /// Add the Saturday/Sunday flag
    pub add_weekend_flag: bool,

    /// Min-max scale the weather and secondary consumption columns
    pub normalize: bool,

    /// Scaler fit policy when `normalize` is set
    pub scaler_fit: ScalerFit,

    /// Trailing window of the smoothed weather features, in samples
    pub smoothing_window: usize,

    /// Decimal places kept on smoothed temperatures
    pub temperature_decimals: u32,

    /// Decimal places kept on smoothed humidity
    pub humidity_decimals: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            add_holiday_flag: true,
            add_weekend_flag: true,
            normalize: false,
            scaler_fit: ScalerFit::TrainOnly,
            smoothing_window: WEEK_WINDOW,
            temperature_decimals: 1,
            humidity_decimals: 0,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar and smoothing only: no holiday flag, no normalization
    pub fn baseline() -> Self {
        Self {
            add_holiday_flag: false,
            normalize: false,
            ..Self::default()
        }
    }

    /// Holiday flag plus train-fitted normalization
    pub fn extended() -> Self {
        Self {
            add_holiday_flag: true,
            normalize: true,
            ..Self::default()
        }
    }

    /// Builder method to toggle the holiday flag
    pub fn with_holiday_flag(mut self, enabled: bool) -> Self {
        self.add_holiday_flag = enabled;
        self
    }

    /// Builder method to toggle the weekend flag
    pub fn with_weekend_flag(mut self, enabled: bool) -> Self {
        self.add_weekend_flag = enabled;
        self
    }

    /// Builder method to enable normalization with a fit policy
    pub fn with_normalization(mut self, fit: ScalerFit) -> Self {
        self.normalize = true;
        self.scaler_fit = fit;
        self
    }

    /// Builder method to set the smoothing window
    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 {
            return Err(PrepError::ConfigError(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        for (field, decimals) in [
            ("temperature_decimals", self.temperature_decimals),
            ("humidity_decimals", self.humidity_decimals),
        ] {
            if decimals > MAX_DECIMALS {
                return Err(PrepError::ConfigError(format!(
                    "{} must be at most {}, got {}",
                    field, MAX_DECIMALS, decimals
                )));
            }
        }
        Ok(())
    }

    pub fn temperature_spec(&self) -> SmoothingSpec {
        SmoothingSpec::new(self.smoothing_window, self.temperature_decimals)
    }

    pub fn humidity_spec(&self) -> SmoothingSpec {
        SmoothingSpec::new(self.smoothing_window, self.humidity_decimals)
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
