use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use crate::activation::ActivationType;
use crate::error::{AutoencoderError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::layers::{FeedForwardLayer, Layer, LayerActivations};

/// Output of a batched forward pass
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub code: Array2<f32>,
    pub reconstruction: Array2<f32>,
}

/// A symmetric feed-forward autoencoder.
///
/// Layers run `input -> h1 -> ... -> code -> ... -> h1 -> output`, with the output as wide as
/// the input. Public methods never modify the parameters, so a trained model is a snapshot.
#[derive(Debug, Clone)]
pub struct Autoencoder {
    layers: Vec<Box<dyn Layer>>,
    input_dim: usize,
    code_layer: usize,
}

impl Autoencoder {
    /// Create a new autoencoder with freshly initialized weights
    ///
    /// # Arguments
    ///
    /// * `input_dim` - Length of the vectors to reconstruct
    /// * `hyperparameters` - Encoder sizes and activations; the decoder mirrors the encoder
    /// * `rng` - Source of the initial weights
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hyperparameters: &Hyperparameters,
        rng: &mut R,
    ) -> Result<Self> {
        hyperparameters.validate(input_dim)?;
        Ok(Self::from_validated(input_dim, hyperparameters, rng))
    }

    /// Builds the network for hyperparameters that already passed `validate(input_dim)`
    pub(crate) fn from_validated<R: Rng + ?Sized>(
        input_dim: usize,
        hyperparameters: &Hyperparameters,
        rng: &mut R,
    ) -> Self {
        let sizes = mirrored_sizes(input_dim, &hyperparameters.hidden);

        let depth = sizes.len() - 1;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let activation = if i == depth - 1 {
                    hyperparameters.output_activation
                } else {
                    hyperparameters.activation
                };
                Box::new(FeedForwardLayer::new(pair[0], pair[1], activation, &mut *rng)) as Box<dyn Layer>
            })
            .collect();

        Autoencoder {
            layers,
            input_dim,
            code_layer: hyperparameters.hidden.len().saturating_sub(1),
        }
    }

    /// Assembles an autoencoder from existing layers.
    ///
    /// `code_layer` is the index of the layer whose output is the code.
    pub fn from_layers(layers: Vec<Box<dyn Layer>>, code_layer: usize) -> Result<Self> {
        let (Some(first), Some(last)) = (layers.first(), layers.last()) else {
            return Err(AutoencoderError::invalid_config("an autoencoder needs at least one layer"));
        };
        let input_dim = first.params().inputs;
        if last.params().neurons != input_dim {
            return Err(AutoencoderError::DimensionMismatch {
                what: "reconstruction",
                expected: input_dim,
                actual: last.params().neurons,
            });
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].params().neurons != pair[1].params().inputs {
                return Err(AutoencoderError::DimensionMismatch {
                    what: if i + 1 == layers.len() - 1 { "output layer" } else { "hidden layer" },
                    expected: pair[0].params().neurons,
                    actual: pair[1].params().inputs,
                });
            }
        }
        if code_layer >= layers.len() {
            return Err(AutoencoderError::invalid_config(format!(
                "code layer {code_layer} is out of range for {} layers",
                layers.len()
            )));
        }

        Ok(Autoencoder { layers, input_dim, code_layer })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn code_dim(&self) -> usize {
        self.layers[self.code_layer].params().neurons
    }

    /// Widths from input to output, e.g. `[784, 64, 2, 64, 784]`
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_dim)
            .chain(self.layers.iter().map(|layer| layer.params().neurons))
            .collect()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn activations(&self) -> Vec<ActivationType> {
        self.layers.iter().map(|layer| layer.params().activation).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }

    /// Runs one vector through the network, returning `(code, reconstruction)`
    pub fn forward(&self, input: &Array1<f32>) -> Result<(Array1<f32>, Array1<f32>)> {
        let batch = input.clone().insert_axis(Axis(0));
        let Reconstruction { code, reconstruction } = self.forward_batch(&batch)?;

        Ok((code.row(0).to_owned(), reconstruction.row(0).to_owned()))
    }

    pub fn forward_batch(&self, input: &Array2<f32>) -> Result<Reconstruction> {
        self.check_input(input)?;

        let mut code = None;
        let mut current = input.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.forward(&current).activation;
            if i == self.code_layer {
                code = Some(current.clone());
            }
        }

        Ok(Reconstruction {
            code: code.unwrap_or_else(|| current.clone()),
            reconstruction: current,
        })
    }

    pub fn encode(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        self.check_input(input)?;

        let mut current = input.clone();
        for layer in &self.layers[..=self.code_layer] {
            current = layer.forward(&current).activation;
        }
        Ok(current)
    }

    pub fn reconstruct(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        Ok(self.forward_batch(input)?.reconstruction)
    }

    fn check_input(&self, input: &Array2<f32>) -> Result<()> {
        if input.ncols() != self.input_dim {
            return Err(AutoencoderError::DimensionMismatch {
                what: "input",
                expected: self.input_dim,
                actual: input.ncols(),
            });
        }
        Ok(())
    }

    pub(crate) fn code_layer(&self) -> usize {
        self.code_layer
    }

    /// Every layer's preactivation and activation for one batch
    pub(crate) fn trace(&self, input: &Array2<f32>) -> Vec<LayerActivations> {
        let mut trace: Vec<LayerActivations> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let cache = match trace.last() {
                Some(previous) => layer.forward(&previous.activation),
                None => layer.forward(input),
            };
            trace.push(cache);
        }
        trace
    }

    /// Backpropagates `grad_output` through the trace, accumulating every layer's gradients.
    ///
    /// `code_grad`, when given, is added to the gradient arriving at the code layer's output.
    pub(crate) fn backward(
        &mut self,
        input: &Array2<f32>,
        trace: &[LayerActivations],
        grad_output: Array2<f32>,
        code_grad: Option<&Array2<f32>>,
    ) {
        let mut grad = grad_output;
        for i in (0..self.layers.len()).rev() {
            if i == self.code_layer {
                if let Some(extra) = code_grad {
                    grad += extra;
                }
            }
            let layer_input = if i == 0 { input } else { &trace[i - 1].activation };
            grad = self.layers[i].backward(layer_input, &trace[i], &grad);
        }
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Box<dyn Layer>] {
        &mut self.layers
    }

    pub(crate) fn zero_gradients(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grads();
        }
    }
}

/// `[input, h1, ..., code, ..., h1, input]`
fn mirrored_sizes(input_dim: usize, hidden: &[usize]) -> Vec<usize> {
    std::iter::once(input_dim)
        .chain(hidden.iter().copied())
        .chain(hidden.iter().rev().skip(1).copied())
        .chain(std::iter::once(input_dim))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::Loss;
    use crate::sparsity::Sparsity;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mirrored_sizes() {
        assert_eq!(mirrored_sizes(784, &[2]), vec![784, 2, 784]);
        assert_eq!(mirrored_sizes(784, &[128, 64, 2]), vec![784, 128, 64, 2, 64, 128, 784]);
    }

    fn total_loss(model: &Autoencoder, input: &Array2<f32>, sparsity: &Sparsity) -> f32 {
        let out = model.forward_batch(input).unwrap();
        Loss::MeanSquaredError.calculate(&out.reconstruction, input) + sparsity.penalty(&out.code)
    }

    #[test]
    fn test_backward_with_sparsity_matches_finite_differences() {
        let hp = Hyperparameters {
            hidden: vec![4, 2],
            activation: ActivationType::Sigmoid,
            ..Default::default()
        };
        let mut model = Autoencoder::new(3, &hp, &mut StdRng::seed_from_u64(17)).unwrap();
        let input = array![
            [0.1_f32, 0.5, 0.9],
            [0.8, 0.2, 0.4],
            [0.3, 0.7, 0.1],
            [0.6, 0.6, 0.6],
        ];
        // sigmoid codes sit near 0.5, so the penalty term is far from flat
        let sparsity = Sparsity::new(2.0, 0.05);

        model.zero_gradients();
        let trace = model.trace(&input);
        let output = &trace[trace.len() - 1].activation;
        let grad_output = Loss::MeanSquaredError.gradient(output, &input);
        let code_grad = sparsity.gradient(&trace[model.code_layer()].activation);
        model.backward(&input, &trace, grad_output, Some(&code_grad));

        // both layers below the code layer see the penalty
        let eps = 1e-2;
        for layer in 0..=model.code_layer() {
            let analytic = model.layers()[layer].params().weight_grads.clone();
            for ((i, j), &expected) in analytic.indexed_iter() {
                let mut plus = model.clone();
                plus.layers_mut()[layer].params_mut().weights[[i, j]] += eps;
                let mut minus = model.clone();
                minus.layers_mut()[layer].params_mut().weights[[i, j]] -= eps;

                let numeric = (total_loss(&plus, &input, &sparsity)
                    - total_loss(&minus, &input, &sparsity))
                    / (2.0 * eps);
                assert!(
                    (numeric - expected).abs() < 2e-3,
                    "layer {layer} weight ({i}, {j}): numeric {numeric}, backprop {expected}"
                );
            }
        }
    }
}
