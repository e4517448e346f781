use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, AutoencoderError>;

/// Everything that can go wrong while building, training or scoring an autoencoder.
#[derive(Debug, Error)]
pub enum AutoencoderError {
    /// The dataset holds no examples.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A row does not have the same length as the first row.
    #[error("row {index} has {actual} features, expected {expected}")]
    InconsistentDimensions {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Two collaborating pieces disagree on a size.
    #[error("{what} dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Not even one full mini-batch worth of examples.
    #[error("{examples} examples cannot fill a mini-batch of {batch_size}")]
    InsufficientData { examples: usize, batch_size: usize },

    #[error("corruption fraction {0} is outside [0, 1]")]
    InvalidCorruptionFraction(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Loss stopped being finite.
    #[error("training diverged at epoch {epoch} (loss = {loss})")]
    Diverged { epoch: usize, loss: f32 },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutoencoderError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}
