use ndarray::{Array1, Array2};

use crate::layers::Layer;

/// Mini-batch gradient descent with optional momentum and L2 weight decay
#[derive(Debug, Clone)]
pub struct Optimizer {
    pub learning_rate: f32,
    pub momentum: f32,
    pub weight_decay: f32,
    velocities: Vec<(Array2<f32>, Array1<f32>)>,
}

impl Optimizer {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            momentum: 0.0,
            weight_decay: 0.0,
            velocities: Vec::new(),
        }
    }

    pub fn with_momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Applies the accumulated gradients of every layer
    pub fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        if self.velocities.len() != layers.len() {
            self.velocities = layers
                .iter()
                .map(|layer| {
                    let params = layer.params();
                    (
                        Array2::zeros(params.weights.raw_dim()),
                        Array1::zeros(params.bias.raw_dim()),
                    )
                })
                .collect();
        }

        let (lr, mu, decay) = (self.learning_rate, self.momentum, self.weight_decay);
        for (layer, (weight_velocity, bias_velocity)) in layers.iter_mut().zip(&mut self.velocities) {
            let params = layer.params_mut();

            let mut weight_grads = params.weight_grads.clone();
            if decay > 0.0 {
                weight_grads.scaled_add(decay, &params.weights);
            }

            // v = mu * v - lr * g; w += v
            weight_velocity.zip_mut_with(&weight_grads, |v, &g| *v = mu * *v - lr * g);
            bias_velocity.zip_mut_with(&params.bias_grads, |v, &g| *v = mu * *v - lr * g);

            params.weights += &*weight_velocity;
            params.bias += &*bias_velocity;
        }
    }
}
