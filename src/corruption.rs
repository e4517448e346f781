use ndarray::{Array1, Array2, ArrayViewMut1};
use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{AutoencoderError, Result};

/// Default valid range for Gaussian replacement values (8-bit pixel intensities).
pub const PIXEL_RANGE: (f32, f32) = (0.0, 255.0);

/// Input corruption used to train denoising autoencoders.
///
/// Both policies pick exactly `floor(fraction * n)` positions of an `n`-long vector uniformly
/// at random, without replacement, and overwrite them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Corruption {
    /// Picked positions are set to zero.
    OnOff { fraction: f32 },
    /// Picked positions are redrawn from `N(mean, std_dev)`, rounded to the nearest integer
    /// intensity and clamped to `[min, max]`.
    Gaussian {
        fraction: f32,
        mean: f32,
        std_dev: f32,
        min: f32,
        max: f32,
    },
}

impl Corruption {
    pub fn on_off(fraction: f32) -> Result<Self> {
        let corruption = Corruption::OnOff { fraction };
        corruption.validate()?;
        Ok(corruption)
    }

    /// Gaussian corruption driven by the dataset's global mean and standard deviation
    pub fn gaussian(fraction: f32, dataset: &Dataset) -> Result<Self> {
        let (min, max) = PIXEL_RANGE;
        let corruption = Corruption::Gaussian {
            fraction,
            mean: dataset.mean(),
            std_dev: dataset.std_dev(),
            min,
            max,
        };
        corruption.validate()?;
        Ok(corruption)
    }

    pub fn fraction(&self) -> f32 {
        match *self {
            Corruption::OnOff { fraction } | Corruption::Gaussian { fraction, .. } => fraction,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.fraction();
        if !(0.0..=1.0).contains(&fraction) {
            return Err(AutoencoderError::InvalidCorruptionFraction(fraction));
        }

        if let Corruption::Gaussian { mean, std_dev, min, max, .. } = *self {
            if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
                return Err(AutoencoderError::invalid_config(format!(
                    "gaussian corruption needs a finite mean and non-negative std, got N({mean}, {std_dev})"
                )));
            }
            if min.is_nan() || max.is_nan() || min > max {
                return Err(AutoencoderError::invalid_config(format!(
                    "gaussian corruption range [{min}, {max}] is empty"
                )));
            }
        }
        Ok(())
    }

    /// How many positions of an `n`-long vector get overwritten
    pub fn corrupted_count(&self, n: usize) -> usize {
        // kept in f32 so 0.7 * 10 is 7, not 6.9999...
        ((self.fraction() * n as f32).floor() as usize).min(n)
    }

    pub fn corrupt<R: Rng + ?Sized>(&self, input: &Array1<f32>, rng: &mut R) -> Result<Array1<f32>> {
        self.validate()?;
        let mut output = input.clone();
        self.corrupt_in_place(output.view_mut(), rng)?;
        Ok(output)
    }

    /// Corrupts every row independently
    pub fn corrupt_batch<R: Rng + ?Sized>(&self, batch: &Array2<f32>, rng: &mut R) -> Result<Array2<f32>> {
        self.validate()?;
        let mut output = batch.clone();
        for row in output.rows_mut() {
            self.corrupt_in_place(row, rng)?;
        }
        Ok(output)
    }

    fn corrupt_in_place<R: Rng + ?Sized>(&self, mut values: ArrayViewMut1<f32>, rng: &mut R) -> Result<()> {
        let n = values.len();
        let picked = index::sample(rng, n, self.corrupted_count(n));

        match *self {
            Corruption::OnOff { .. } => {
                for i in picked.iter() {
                    values[i] = 0.0;
                }
            }
            Corruption::Gaussian { mean, std_dev, min, max, .. } => {
                let normal = Normal::new(mean, std_dev).map_err(|e| {
                    AutoencoderError::invalid_config(format!("gaussian corruption N({mean}, {std_dev}): {e}"))
                })?;
                for i in picked.iter() {
                    values[i] = normal.sample(rng).round().clamp(min, max);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionKind {
    OnOff,
    Gaussian,
}

/// Serializable form of a corruption policy; Gaussian statistics come from the training data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorruptionConfig {
    pub kind: CorruptionKind,
    pub fraction: f32,
    #[serde(default = "default_range")]
    pub range: (f32, f32),
}

fn default_range() -> (f32, f32) {
    PIXEL_RANGE
}

impl CorruptionConfig {
    pub fn on_off(fraction: f32) -> Self {
        Self { kind: CorruptionKind::OnOff, fraction, range: PIXEL_RANGE }
    }

    pub fn gaussian(fraction: f32) -> Self {
        Self { kind: CorruptionKind::Gaussian, fraction, range: PIXEL_RANGE }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(AutoencoderError::InvalidCorruptionFraction(self.fraction));
        }
        Ok(())
    }

    pub fn resolve(&self, dataset: &Dataset) -> Result<Corruption> {
        let corruption = match self.kind {
            CorruptionKind::OnOff => Corruption::OnOff { fraction: self.fraction },
            CorruptionKind::Gaussian => Corruption::Gaussian {
                fraction: self.fraction,
                mean: dataset.mean(),
                std_dev: dataset.std_dev(),
                min: self.range.0,
                max: self.range.1,
            },
        };
        corruption.validate()?;
        Ok(corruption)
    }
}
