use ndarray::{Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{AutoencoderError, Result};

/// An ordered set of equal-length feature vectors, one example per row.
///
/// Labels are carried along for display only; training never looks at them.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f32>,
    labels: Option<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset from rows, rejecting an empty set or rows of different lengths
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(AutoencoderError::EmptyDataset);
        };
        let dim = first.len();
        if dim == 0 {
            return Err(AutoencoderError::invalid_config("examples must have at least one feature"));
        }

        let mut flat = Vec::with_capacity(rows.len() * dim);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(AutoencoderError::InconsistentDimensions {
                    index,
                    expected: dim,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let features = Array2::from_shape_vec((rows.len(), dim), flat)
            .map_err(|e| AutoencoderError::invalid_config(e.to_string()))?;
        Self::from_array(features)
    }

    pub fn from_array(features: Array2<f32>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(AutoencoderError::EmptyDataset);
        }
        if features.ncols() == 0 {
            return Err(AutoencoderError::invalid_config("examples must have at least one feature"));
        }
        Ok(Self { features, labels: None })
    }

    /// Attaches one label per example
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.len() {
            return Err(AutoencoderError::DimensionMismatch {
                what: "labels",
                expected: self.len(),
                actual: labels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Always false for a constructed dataset
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of features per example
    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.features.row(index)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(index))
            .map(String::as_str)
    }

    /// Mean over every feature of every example
    pub fn mean(&self) -> f32 {
        self.features.mean().unwrap_or_default()
    }

    /// Population standard deviation over every feature of every example
    pub fn std_dev(&self) -> f32 {
        self.features.std(0.0)
    }

    /// Rows at `indices`, in that order; labels follow their rows
    pub fn select(&self, indices: &[usize]) -> Dataset {
        let features = self.features.select(Axis(0), indices);
        let labels = self.labels.as_ref().map(|labels| {
            indices.iter().map(|&i| labels[i].clone()).collect()
        });
        Dataset { features, labels }
    }

    /// Shuffled holdout split into (train, validation)
    pub fn split<R: Rng + ?Sized>(
        &self,
        validation_fraction: f32,
        rng: &mut R,
    ) -> Result<(Dataset, Dataset)> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(AutoencoderError::invalid_config(format!(
                "validation fraction must be in [0, 1), got {validation_fraction}"
            )));
        }

        let validation_len = (self.len() as f64 * validation_fraction as f64).round() as usize;
        if validation_len == 0 || validation_len >= self.len() {
            return Err(AutoencoderError::invalid_config(format!(
                "a {validation_fraction} split of {} examples leaves one side empty",
                self.len()
            )));
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        let (validation, train) = order.split_at(validation_len);

        Ok((self.select(train), self.select(validation)))
    }

    /// Partitions the example indices into mini-batches for one epoch.
    ///
    /// The last batch holds the remainder and may be smaller than `batch_size`.
    pub fn batch_indices<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        order
            .chunks(batch_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}
