use ndarray::{Array1, Array2, Axis};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Loss {
    #[default]
    MeanSquaredError,
}

impl Loss {
    /// Loss averaged over every element of the batch
    pub fn calculate(&self, prediction: &Array2<f32>, target: &Array2<f32>) -> f32 {
        match self {
            Loss::MeanSquaredError => (prediction - target)
                .mapv(|x| x * x)
                .mean()
                .unwrap_or_default(),
        }
    }

    /// Gradient of `calculate` with respect to the prediction
    pub fn gradient(&self, prediction: &Array2<f32>, target: &Array2<f32>) -> Array2<f32> {
        match self {
            Loss::MeanSquaredError => {
                let n = prediction.len().max(1) as f32;
                (prediction - target) * (2.0 / n)
            }
        }
    }

    /// One loss value per row
    pub fn per_example(&self, prediction: &Array2<f32>, target: &Array2<f32>) -> Array1<f32> {
        match self {
            Loss::MeanSquaredError => {
                let squared = (prediction - target).mapv(|x| x * x);
                match squared.mean_axis(Axis(1)) {
                    Some(errors) => errors,
                    None => Array1::zeros(squared.nrows()),
                }
            }
        }
    }
}
