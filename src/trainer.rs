use log::{debug, info};
use ndarray::{Array2, Axis};
use rand::Rng;

use crate::corruption::Corruption;
use crate::dataset::Dataset;
use crate::error::{AutoencoderError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::loss::Loss;
use crate::model::Autoencoder;
use crate::optimizer::Optimizer;

/// Losses recorded at the end of one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    /// Mean reconstruction loss over the epoch's batches
    pub training_loss: f32,
    /// Mean sparsity penalty over the epoch's batches, zero without sparsity
    pub sparsity_penalty: f32,
    /// Clean reconstruction loss on the validation set, if one was given
    pub validation_loss: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Reconstruction loss of the untrained model on the training set
    pub initial_loss: f32,
    pub history: Vec<EpochStats>,
}

impl TrainingReport {
    pub fn final_training_loss(&self) -> f32 {
        self.history
            .last()
            .map_or(self.initial_loss, |stats| stats.training_loss)
    }

    /// Validation loss of the last epoch, or its training loss without a validation set
    pub fn final_validation_loss(&self) -> f32 {
        self.history
            .last()
            .map_or(self.initial_loss, |stats| stats.validation_loss.unwrap_or(stats.training_loss))
    }
}

/// A trained parameter snapshot together with how it got there
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: Autoencoder,
    pub report: TrainingReport,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    hyperparameters: Hyperparameters,
    loss: Loss,
}

impl Trainer {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Trainer {
            hyperparameters,
            loss: Loss::MeanSquaredError,
        }
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Fits a fresh autoencoder to `train`.
    ///
    /// Batches are reshuffled every epoch. With corruption configured, the network sees the
    /// corrupted batch while the clean batch stays the reconstruction target.
    pub fn train<R: Rng + ?Sized>(
        &self,
        train: &Dataset,
        validation: Option<&Dataset>,
        rng: &mut R,
    ) -> Result<TrainedModel> {
        let hp = &self.hyperparameters;
        hp.validate(train.dim())?;
        if train.len() < hp.batch_size {
            return Err(AutoencoderError::InsufficientData {
                examples: train.len(),
                batch_size: hp.batch_size,
            });
        }
        if let Some(validation) = validation {
            if validation.dim() != train.dim() {
                return Err(AutoencoderError::DimensionMismatch {
                    what: "validation set",
                    expected: train.dim(),
                    actual: validation.dim(),
                });
            }
        }

        let mut model = Autoencoder::from_validated(train.dim(), hp, rng);
        let corruption = hp
            .corruption
            .as_ref()
            .map(|config| config.resolve(train))
            .transpose()?;
        let mut optimizer = Optimizer::new(hp.learning_rate)
            .with_momentum(hp.momentum)
            .with_weight_decay(hp.weight_decay);

        let initial_loss = self.evaluate(&model, train)?;
        info!(
            "training {:?} autoencoder on {} examples for {} epochs (initial loss {initial_loss:.6})",
            model.layer_sizes(),
            train.len(),
            hp.epochs
        );
        if !initial_loss.is_finite() {
            return Err(AutoencoderError::Diverged { epoch: 0, loss: initial_loss });
        }

        let mut history = Vec::with_capacity(hp.epochs);
        for epoch in 1..=hp.epochs {
            let (training_loss, sparsity_penalty) =
                self.train_epoch(&mut model, &mut optimizer, train, corruption.as_ref(), rng)?;
            if !training_loss.is_finite() || !sparsity_penalty.is_finite() {
                return Err(AutoencoderError::Diverged {
                    epoch,
                    loss: training_loss + sparsity_penalty,
                });
            }

            let validation_loss = validation
                .map(|validation| self.evaluate(&model, validation))
                .transpose()?;
            if let Some(loss) = validation_loss.filter(|loss| !loss.is_finite()) {
                return Err(AutoencoderError::Diverged { epoch, loss });
            }

            debug!(
                "epoch {epoch}/{}: loss {training_loss:.6}, sparsity {sparsity_penalty:.6}, validation {validation_loss:?}",
                hp.epochs
            );
            history.push(EpochStats {
                epoch,
                training_loss,
                sparsity_penalty,
                validation_loss,
            });
        }

        let report = TrainingReport { initial_loss, history };
        info!(
            "finished training: loss {:.6} -> {:.6}",
            report.initial_loss,
            report.final_training_loss()
        );
        Ok(TrainedModel { model, report })
    }

    /// Mean clean reconstruction loss of `model` over `dataset`
    pub fn evaluate(&self, model: &Autoencoder, dataset: &Dataset) -> Result<f32> {
        let reconstruction = model.reconstruct(dataset.features())?;
        Ok(self.loss.calculate(&reconstruction, dataset.features()))
    }

    /// One pass over the data; returns the mean batch loss and mean sparsity penalty
    fn train_epoch<R: Rng + ?Sized>(
        &self,
        model: &mut Autoencoder,
        optimizer: &mut Optimizer,
        train: &Dataset,
        corruption: Option<&Corruption>,
        rng: &mut R,
    ) -> Result<(f32, f32)> {
        let hp = &self.hyperparameters;
        let batches = train.batch_indices(hp.batch_size, true, rng);
        let batch_count = batches.len().max(1) as f32;

        let mut total_loss = 0.0;
        let mut total_penalty = 0.0;
        for indices in &batches {
            let target = train.features().select(Axis(0), indices);
            let input = match corruption {
                Some(corruption) => corruption.corrupt_batch(&target, rng)?,
                None => target.clone(),
            };

            let (loss, penalty) = self.train_batch(model, optimizer, &input, &target);
            total_loss += loss;
            total_penalty += penalty;
        }

        Ok((total_loss / batch_count, total_penalty / batch_count))
    }

    fn train_batch(
        &self,
        model: &mut Autoencoder,
        optimizer: &mut Optimizer,
        input: &Array2<f32>,
        target: &Array2<f32>,
    ) -> (f32, f32) {
        model.zero_gradients();

        let trace = model.trace(input);
        let Some(output) = trace.last() else {
            return (0.0, 0.0);
        };
        let loss = self.loss.calculate(&output.activation, target);
        let grad_output = self.loss.gradient(&output.activation, target);

        let (penalty, code_grad) = match &self.hyperparameters.sparsity {
            Some(sparsity) => {
                let code = &trace[model.code_layer()].activation;
                (sparsity.penalty(code), Some(sparsity.gradient(code)))
            }
            None => (0.0, None),
        };

        model.backward(input, &trace, grad_output, code_grad.as_ref());
        optimizer.step(model.layers_mut());

        (loss, penalty)
    }
}
