//! Min-max feature scaling

use super::table::{array_to_column, column_as_array};
use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    min: f64,
    range: f64, // 1.0 when the column is constant
}

/// Min-max scaler: (x - min) / (max - min)
///
/// Missing samples are ignored while fitting and stay missing after
/// scaling. A constant column maps to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMaxScaler {
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the given columns, replacing any earlier fit
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut fitted = HashMap::with_capacity(columns.len());
        for col_name in columns {
            let values = column_as_array(df, col_name)?;
            let (min, max) = values
                .iter()
                .filter(|v| !v.is_nan())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });

            // All-missing column: identity mapping
            let params = if min.is_finite() && max.is_finite() {
                let range = max - min;
                ScalerParams {
                    min,
                    range: if range == 0.0 { 1.0 } else { range },
                }
            } else {
                ScalerParams { min: 0.0, range: 1.0 }
            };
            fitted.insert(col_name.to_string(), params);
        }

        self.params = fitted;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every fitted column of `df`.
    /// Builds all replacement columns first, then applies them in one pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| (v - p.min) / p.range)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| v * p.range + p.min)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fitted (min, max) of a column
    pub fn bounds(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.min, p.min + p.range))
    }

    fn apply(&self, df: &DataFrame, f: impl Fn(f64, &ScalerParams) -> f64) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PrepError::ModelNotFitted);
        }

        let replacements: Vec<Column> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let values = column_as_array(df, col_name)?;
                Ok(array_to_column(col_name, &values.mapv(|v| f(v, params))))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }
}
