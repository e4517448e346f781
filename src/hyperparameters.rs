use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::corruption::CorruptionConfig;
use crate::error::{AutoencoderError, Result};
use crate::sparsity::Sparsity;

/// Hyperparameters for one autoencoder training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Encoder layer sizes, the last one being the code size; the decoder mirrors them
    pub hidden: Vec<usize>,

    /// Activation of every layer but the output
    pub activation: ActivationType,

    /// Activation of the reconstruction layer
    pub output_activation: ActivationType,

    /// Optional penalty on the code layer's average activation
    pub sparsity: Option<Sparsity>,

    /// Optional input corruption (denoising autoencoder)
    pub corruption: Option<CorruptionConfig>,

    /// Learning rate for training
    pub learning_rate: f32,

    /// Momentum coefficient, zero for plain gradient descent
    pub momentum: f32,

    /// L2 penalty on the weights
    pub weight_decay: f32,

    /// Number of training epochs
    pub epochs: usize,

    /// Batch size for training
    pub batch_size: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            hidden: vec![32],
            activation: ActivationType::Tanh,
            output_activation: ActivationType::Linear,
            sparsity: None,
            corruption: None,
            learning_rate: 0.01,
            momentum: 0.0,
            weight_decay: 0.0,
            epochs: 100,
            batch_size: 32,
        }
    }
}

impl Hyperparameters {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Size of the code layer
    pub fn code_dim(&self) -> Option<usize> {
        self.hidden.last().copied()
    }

    /// Checks the configuration against the data it is going to be trained on
    pub fn validate(&self, input_dim: usize) -> Result<()> {
        let Some(code_dim) = self.code_dim() else {
            return Err(AutoencoderError::invalid_config("at least one hidden layer is required"));
        };
        if input_dim == 0 || self.hidden.contains(&0) {
            return Err(AutoencoderError::invalid_config(format!(
                "layer sizes must be positive, got input {input_dim} and hidden {:?}",
                self.hidden
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(AutoencoderError::invalid_config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(AutoencoderError::invalid_config(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(AutoencoderError::invalid_config(format!(
                "weight decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if self.epochs == 0 {
            return Err(AutoencoderError::invalid_config("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(AutoencoderError::invalid_config("batch size must be at least 1"));
        }
        if let Some(sparsity) = &self.sparsity {
            sparsity.validate()?;
        }
        if let Some(corruption) = &self.corruption {
            corruption.validate()?;
        }

        if code_dim >= input_dim {
            warn!(
                "code size {code_dim} is not smaller than input size {input_dim}; \
                 the autoencoder is not undercomplete"
            );
        }
        Ok(())
    }
}
