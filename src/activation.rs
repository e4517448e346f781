use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};

/// Enum representing different activation function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationType {
    Sigmoid,
    ReLU,
    Tanh,
    Linear,
}

impl ActivationType {
    /// Applies the activation function to a given input
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Tanh => x.tanh(),
            ActivationType::Linear => x,
        }
    }

    /// Computes the derivative of the activation function with respect to the preactivation
    pub fn derivative(&self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => {
                let sigmoid = 1.0 / (1.0 + (-x).exp());
                sigmoid * (1.0 - sigmoid)
            },
            ActivationType::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationType::Tanh => 1.0 - x.tanh().powi(2),
            ActivationType::Linear => 1.0,
        }
    }

    /// Element-wise activation of a whole array
    pub fn forward<D: Dimension>(&self, preactivation: &Array<f32, D>) -> Array<f32, D> {
        match self {
            ActivationType::Linear => preactivation.clone(),
            _ => preactivation.mapv(|x| self.apply(x)),
        }
    }

    /// Element-wise derivative of a whole array of preactivations
    pub fn derivative_of<D: Dimension>(&self, preactivation: &Array<f32, D>) -> Array<f32, D> {
        preactivation.mapv(|x| self.derivative(x))
    }
}
