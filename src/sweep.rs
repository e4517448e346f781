use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::corruption::CorruptionConfig;
use crate::dataset::Dataset;
use crate::error::{AutoencoderError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::model::Autoencoder;
use crate::sparsity::Sparsity;
use crate::trainer::{Trainer, TrainingReport};

/// Candidate values per hyperparameter; an empty list keeps the base value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterGrid {
    pub base: Hyperparameters,
    pub hidden: Vec<Vec<usize>>,
    pub activation: Vec<ActivationType>,
    pub sparsity: Vec<Option<Sparsity>>,
    pub corruption: Vec<Option<CorruptionConfig>>,
    pub learning_rate: Vec<f32>,
    pub epochs: Vec<usize>,
}

impl HyperparameterGrid {
    pub fn new(base: Hyperparameters) -> Self {
        HyperparameterGrid { base, ..Default::default() }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Cartesian product of every dimension, `hidden` varying slowest and `epochs` fastest
    pub fn configurations(&self) -> Vec<Hyperparameters> {
        let mut configs = vec![self.base.clone()];
        expand(&mut configs, &self.hidden, |hp, v| hp.hidden = v.clone());
        expand(&mut configs, &self.activation, |hp, v| hp.activation = *v);
        expand(&mut configs, &self.sparsity, |hp, v| hp.sparsity = *v);
        expand(&mut configs, &self.corruption, |hp, v| hp.corruption = *v);
        expand(&mut configs, &self.learning_rate, |hp, v| hp.learning_rate = *v);
        expand(&mut configs, &self.epochs, |hp, v| hp.epochs = *v);
        configs
    }
}

fn expand<T>(configs: &mut Vec<Hyperparameters>, values: &[T], set: impl Fn(&mut Hyperparameters, &T)) {
    if values.is_empty() {
        return;
    }
    *configs = configs
        .iter()
        .flat_map(|config| {
            values.iter().map(|value| {
                let mut next = config.clone();
                set(&mut next, value);
                next
            })
        })
        .collect();
}

/// Requests that a running sweep start no further training runs
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// A successful run
#[derive(Debug, Clone)]
pub struct SweepEntry {
    /// Position of the configuration in the sweep's input
    pub index: usize,
    pub hyperparameters: Hyperparameters,
    pub validation_loss: f32,
    pub model: Autoencoder,
    pub report: TrainingReport,
}

#[derive(Debug)]
pub struct FailedRun {
    pub index: usize,
    pub hyperparameters: Hyperparameters,
    pub error: AutoencoderError,
}

#[derive(Debug)]
pub struct SweepReport {
    /// Ascending by validation loss, ties in input order
    pub ranked: Vec<SweepEntry>,
    pub failed: Vec<FailedRun>,
    /// Runs that never started because the sweep was stopped
    pub skipped: Vec<usize>,
}

impl SweepReport {
    pub fn best(&self) -> Option<&SweepEntry> {
        self.ranked.first()
    }
}

enum RunOutcome {
    Trained(SweepEntry),
    Failed(FailedRun),
    Skipped(usize),
}

/// Trains one independent model per configuration and ranks them on held-out data
#[derive(Debug, Clone)]
pub struct Sweep {
    configs: Vec<Hyperparameters>,
    seed: u64,
    threads: Option<usize>,
    stop: StopHandle,
}

impl Sweep {
    pub fn new(configs: Vec<Hyperparameters>) -> Self {
        Sweep {
            configs,
            seed: 0,
            threads: None,
            stop: StopHandle::default(),
        }
    }

    pub fn from_grid(grid: &HyperparameterGrid) -> Self {
        Self::new(grid.configurations())
    }

    /// Every run draws from its own `StdRng::seed_from_u64(seed)`, so a configuration's
    /// result does not depend on its position in the sweep
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs on a dedicated pool of `threads` workers instead of the global one
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn configs(&self) -> &[Hyperparameters] {
        &self.configs
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Trains every configuration, waits for all of them, then ranks the survivors.
    ///
    /// The stop flag is checked before each run starts, never during one.
    pub fn run(&self, train: &Dataset, validation: Option<&Dataset>) -> Result<SweepReport> {
        info!("starting sweep over {} configurations", self.configs.len());

        let outcomes = match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| AutoencoderError::invalid_config(e.to_string()))?;
                pool.install(|| self.run_all(train, validation))
            }
            None => self.run_all(train, validation),
        };

        let mut report = SweepReport {
            ranked: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        };
        for outcome in outcomes {
            match outcome {
                RunOutcome::Trained(entry) => report.ranked.push(entry),
                RunOutcome::Failed(failed) => report.failed.push(failed),
                RunOutcome::Skipped(index) => report.skipped.push(index),
            }
        }
        // outcomes arrive in input order and the sort is stable
        report.ranked.sort_by(|a, b| a.validation_loss.total_cmp(&b.validation_loss));

        info!(
            "sweep finished: {} ranked, {} failed, {} skipped",
            report.ranked.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn run_all(&self, train: &Dataset, validation: Option<&Dataset>) -> Vec<RunOutcome> {
        self.configs
            .par_iter()
            .enumerate()
            .map(|(index, hyperparameters)| self.run_one(index, hyperparameters, train, validation))
            .collect()
    }

    fn run_one(
        &self,
        index: usize,
        hyperparameters: &Hyperparameters,
        train: &Dataset,
        validation: Option<&Dataset>,
    ) -> RunOutcome {
        if self.stop.is_stopped() {
            return RunOutcome::Skipped(index);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let trainer = Trainer::new(hyperparameters.clone());
        match trainer.train(train, validation, &mut rng) {
            Ok(trained) => RunOutcome::Trained(SweepEntry {
                index,
                hyperparameters: hyperparameters.clone(),
                validation_loss: trained.report.final_validation_loss(),
                model: trained.model,
                report: trained.report,
            }),
            Err(error) => {
                warn!("configuration {index} failed: {error}");
                RunOutcome::Failed(FailedRun {
                    index,
                    hyperparameters: hyperparameters.clone(),
                    error,
                })
            }
        }
    }
}
