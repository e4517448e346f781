use crate::activation::ActivationType;
use crate::layers::Layer;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{LayerActivations, LayerParams};

#[derive(Debug, Clone)]
pub struct FeedForwardLayer {
    pub params: LayerParams,
}

impl FeedForwardLayer {
    /// Constructs a dense layer with He-normal weights and zero bias
    ///
    /// # Arguments
    ///
    /// * `inputs` - Number of inputs to this layer
    /// * `neurons` - Number of neurons in this layer
    /// * `activation` - Activation function type for the layer
    /// * `rng` - Source of the initial weights
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        neurons: usize,
        activation: ActivationType,
        rng: &mut R,
    ) -> Self {
        // He normalization
        let std_dev = (2.0 / inputs.max(1) as f32).sqrt();
        let weights = match Normal::new(0.0, std_dev) {
            Ok(normal_dist) => Array2::from_shape_fn((neurons, inputs), |_| normal_dist.sample(&mut *rng)),
            Err(_) => Array2::zeros((neurons, inputs)),
        };

        Self::from_parameters(weights, Array1::zeros(neurons), activation)
    }

    /// Builds a layer around known parameters; `weights` is (neurons × inputs)
    pub fn from_parameters(
        weights: Array2<f32>,
        bias: Array1<f32>,
        activation: ActivationType,
    ) -> Self {
        let (neurons, inputs) = weights.dim();
        assert_eq!(bias.len(), neurons, "Bias size does not match layer's neuron count");

        let params = LayerParams {
            neurons,
            inputs,
            weight_grads: Array2::zeros((neurons, inputs)),
            bias_grads: Array1::zeros(neurons),
            weights,
            bias,
            activation,
        };

        FeedForwardLayer { params }
    }
}

impl Layer for FeedForwardLayer {
    fn forward(&self, input: &Array2<f32>) -> LayerActivations {
        assert_eq!(input.ncols(), self.params.inputs, "Input size does not match layer's input size");

        // input is (batch × inputs), weights is (neurons × inputs), result is (batch × neurons)
        let preactivation = input.dot(&self.params.weights.t()) + &self.params.bias;
        let activation = self.params.activation.forward(&preactivation);

        LayerActivations { preactivation, activation }
    }

    fn backward(&mut self,
        input: &Array2<f32>,
        cache: &LayerActivations,
        grad_output: &Array2<f32>,
    ) -> Array2<f32> {
        // Gradient with respect to preactivation
        let dlayer = match self.params.activation {
            ActivationType::Linear => grad_output.clone(),
            activation => grad_output * &activation.derivative_of(&cache.preactivation),
        };

        self.add_to_bias_grads(&dlayer.sum_axis(Axis(0)));

        // dlayer is (batch × neurons), input is (batch × inputs), result is (neurons × inputs)
        let weight_grads = dlayer.t().dot(input);
        self.add_to_weight_grads(&weight_grads);

        // Gradient for previous layer, (batch × inputs)
        dlayer.dot(&self.params.weights)
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn params(&self) -> &LayerParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut LayerParams {
        &mut self.params
    }

    fn add_to_weight_grads(&mut self, grads: &Array2<f32>) {
        self.params.weight_grads += grads;
    }

    fn add_to_bias_grads(&mut self, grads: &Array1<f32>) {
        self.params.bias_grads += grads;
    }
}
