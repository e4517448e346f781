use ndarray::Array1;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::loss::Loss;
use crate::model::Autoencoder;

/// One example's reconstruction error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredExample {
    /// Position of the example in the scored dataset
    pub index: usize,
    pub error: f32,
}

/// Examples ordered by descending reconstruction error, ties in dataset order
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRanking {
    entries: Vec<ScoredExample>,
}

impl AnomalyRanking {
    pub fn entries(&self) -> &[ScoredExample] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` worst reconstructed examples, most anomalous first
    pub fn top_k(&self, k: usize) -> &[ScoredExample] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// The `k` best reconstructed examples, least error first
    pub fn bottom_k(&self, k: usize) -> Vec<ScoredExample> {
        let mut best: Vec<ScoredExample> = self.entries.clone();
        best.sort_by(|a, b| a.error.total_cmp(&b.error).then(a.index.cmp(&b.index)));
        best.truncate(k);
        best
    }

    /// Every example whose error is at least `error`
    pub fn threshold(&self, error: f32) -> &[ScoredExample] {
        let end = self.entries.partition_point(|entry| entry.error >= error);
        &self.entries[..end]
    }
}

/// Mean squared reconstruction error of every example
pub fn reconstruction_errors(model: &Autoencoder, dataset: &Dataset) -> Result<Array1<f32>> {
    let reconstruction = model.reconstruct(dataset.features())?;
    Ok(Loss::MeanSquaredError.per_example(&reconstruction, dataset.features()))
}

/// Ranks the examples of `dataset` by how badly `model` reconstructs them
pub fn score(model: &Autoencoder, dataset: &Dataset) -> Result<AnomalyRanking> {
    let errors = reconstruction_errors(model, dataset)?;

    let mut entries: Vec<ScoredExample> = errors
        .iter()
        .enumerate()
        .map(|(index, &error)| ScoredExample { index, error })
        .collect();
    // stable, so equal errors keep dataset order
    entries.sort_by(|a, b| b.error.total_cmp(&a.error));

    Ok(AnomalyRanking { entries })
}

/// Shorthand for `score(model, dataset)?.top_k(k)`
pub fn top_k(model: &Autoencoder, dataset: &Dataset, k: usize) -> Result<Vec<ScoredExample>> {
    Ok(score(model, dataset)?.top_k(k).to_vec())
}
