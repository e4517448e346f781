mod activation;
mod corruption;
mod dataset;
mod error;
mod hyperparameters;
mod layers;
mod loss;
mod model;
mod optimizer;
pub mod scorer;
mod sparsity;
pub mod sweep;
mod trainer;

pub use activation::ActivationType;
pub use corruption::{Corruption, CorruptionConfig, CorruptionKind, PIXEL_RANGE};
pub use dataset::Dataset;
pub use error::{AutoencoderError, Result};
pub use hyperparameters::Hyperparameters;
pub use layers::{FeedForwardLayer, Layer, LayerActivations, LayerParams};
pub use loss::Loss;
pub use model::{Autoencoder, Reconstruction};
pub use optimizer::Optimizer;
pub use scorer::{AnomalyRanking, ScoredExample};
pub use sparsity::Sparsity;
pub use sweep::{FailedRun, HyperparameterGrid, StopHandle, Sweep, SweepEntry, SweepReport};
pub use trainer::{EpochStats, TrainedModel, Trainer, TrainingReport};
