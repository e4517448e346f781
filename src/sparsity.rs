use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{AutoencoderError, Result};

/// Penalty pulling the mean activation of each code unit toward `target`.
///
/// `P = beta * sum_j (mean_j - target)^2`, where `mean_j` is unit `j`'s activation averaged
/// over the batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sparsity {
    pub beta: f32,
    pub target: f32,
}

impl Sparsity {
    pub fn new(beta: f32, target: f32) -> Self {
        Self { beta, target }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(AutoencoderError::invalid_config(format!(
                "sparsity beta must be finite and non-negative, got {}",
                self.beta
            )));
        }
        if !self.target.is_finite() {
            return Err(AutoencoderError::invalid_config(format!(
                "sparsity target must be finite, got {}",
                self.target
            )));
        }
        Ok(())
    }

    fn mean_activation(code: &Array2<f32>) -> Array1<f32> {
        code.mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(code.ncols()))
    }

    pub fn penalty(&self, code: &Array2<f32>) -> f32 {
        let deviation = Self::mean_activation(code) - self.target;
        self.beta * deviation.mapv(|d| d * d).sum()
    }

    /// Gradient of `penalty` with respect to every code activation in the batch
    pub fn gradient(&self, code: &Array2<f32>) -> Array2<f32> {
        let rows = code.nrows().max(1) as f32;
        let deviation = Self::mean_activation(code) - self.target;
        let per_unit = deviation * (2.0 * self.beta / rows);

        let mut grad = Array2::zeros(code.raw_dim());
        grad.rows_mut()
            .into_iter()
            .for_each(|mut row| row.assign(&per_unit));
        grad
    }
}
