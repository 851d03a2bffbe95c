//! Feature standardization (zero mean, unit variance)

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Standard deviations below this are treated as zero
const ZERO_SCALE_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// Per-feature mean and standard deviation learned from training rows.
///
/// The only way to obtain a scaler is [`StandardScaler::fit`], so every
/// instance carries statistics from exactly one fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    var: Array1<f64>,
    scale: Array1<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Learn per-feature statistics from `x` (population variance).
    ///
    /// # Errors
    /// `Fit` if `x` has no rows or no columns, or contains non-finite values.
    pub fn fit(x: ArrayView2<f64>) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(PipelineError::Fit(format!(
                "cannot fit scaler on a {}x{} matrix",
                x.nrows(),
                x.ncols()
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::Fit("cannot compute feature means".to_string()))?;
        let var = x.var_axis(Axis(0), 0.0);

        if mean.iter().chain(var.iter()).any(|v| !v.is_finite()) {
            return Err(PipelineError::Fit(
                "feature statistics are not finite; input contains NaN or infinite values"
                    .to_string(),
            ));
        }

        // Constant features keep their values centred but unscaled
        let scale = var.mapv(|v| {
            let std = v.sqrt();
            if std < ZERO_SCALE_TOLERANCE {
                1.0
            } else {
                std
            }
        });

        tracing::debug!(
            n_samples = x.nrows(),
            n_features = x.ncols(),
            "Fitted standard scaler"
        );

        Ok(Self {
            mean,
            var,
            scale,
            n_samples_seen: x.nrows(),
        })
    }

    /// Standardize `x` with the fitted statistics.
    ///
    /// # Errors
    /// `DataShape` if `x` has a different number of columns than the fit data.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::DataShape(format!(
                "scaler was fitted on {} features but input has {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok((&x - &self.mean) / &self.scale)
    }

    /// Fit on `x` and return both the scaler and the transformed matrix
    pub fn fit_transform(x: ArrayView2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let transformed = scaler.transform(x)?;
        Ok((scaler, transformed))
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn var(&self) -> &Array1<f64> {
        &self.var
    }

    /// Per-feature divisor (standard deviation, or 1.0 for constant features)
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}
