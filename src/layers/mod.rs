pub mod feed_forward;

use std::fmt::Debug;
use ndarray::{Array1, Array2};
use crate::activation::ActivationType;

#[derive(Debug, Clone)]
pub struct LayerParams {
    pub neurons: usize,
    pub inputs: usize,
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    pub activation: ActivationType,
    pub weight_grads: Array2<f32>,
    pub bias_grads: Array1<f32>,
}

/// What a layer produced for one batch, kept around for the backward pass
#[derive(Debug, Clone)]
pub struct LayerActivations {
    pub preactivation: Array2<f32>,
    pub activation: Array2<f32>,
}

pub trait Layer: Debug + Send + Sync {
    /// Pure function of the current parameters; rows of `input` are examples.
    fn forward(&self, input: &Array2<f32>) -> LayerActivations;

    /// Accumulates parameter gradients and returns the gradient for the layer below.
    fn backward(&mut self,
        input: &Array2<f32>,
        cache: &LayerActivations,
        grad_output: &Array2<f32>,
    ) -> Array2<f32>;

    fn clone_box(&self) -> Box<dyn Layer>;

    fn params(&self) -> &LayerParams;
    fn params_mut(&mut self) -> &mut LayerParams;

    fn add_to_weight_grads(&mut self, grads: &Array2<f32>);
    fn add_to_bias_grads(&mut self, grads: &Array1<f32>);

    fn zero_grads(&mut self) {
        let params = self.params_mut();
        params.weight_grads.fill(0.0);
        params.bias_grads.fill(0.0);
    }

    fn parameter_count(&self) -> usize {
        let params = self.params();
        params.weights.len() + params.bias.len()
    }
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub use feed_forward::FeedForwardLayer;
