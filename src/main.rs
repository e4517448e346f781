use std::{env, process::ExitCode};

use autoencode::{
    scorer, ActivationType, CorruptionConfig, Dataset, HyperparameterGrid, Hyperparameters,
    Sparsity, Sweep,
};
use log::{error, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: usize = 64;
const EXAMPLES: usize = 400;
const ANOMALIES: usize = 8;
const DEFAULT_SEED: u64 = 42;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> autoencode::Result<()> {
    let seed = env::var("AUTOENCODE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let mut rng = StdRng::seed_from_u64(seed);

    let grid = match env::args().nth(1) {
        Some(path) => {
            info!("loading grid from {path}");
            HyperparameterGrid::from_json_path(path)?
        }
        None => default_grid(),
    };

    let dataset = synthetic_dataset(&mut rng)?;
    let (train, validation) = dataset.split(0.2, &mut rng)?;
    info!(
        "{} training and {} validation examples of dimension {}",
        train.len(),
        validation.len(),
        train.dim()
    );

    let sweep = Sweep::from_grid(&grid).with_seed(seed);
    let report = sweep.run(&train, Some(&validation))?;

    for entry in &report.ranked {
        info!(
            "#{} hidden {:?} {:?} sparsity {:?}: validation loss {:.6}",
            entry.index,
            entry.hyperparameters.hidden,
            entry.hyperparameters.activation,
            entry.hyperparameters.sparsity,
            entry.validation_loss
        );
    }
    for failed in &report.failed {
        info!("#{} failed: {}", failed.index, failed.error);
    }

    let Some(best) = report.best() else {
        info!("no configuration trained successfully");
        return Ok(());
    };
    let ranking = scorer::score(&best.model, &dataset)?;
    for entry in ranking.top_k(ANOMALIES) {
        info!(
            "anomaly candidate {} ({}): error {:.6}",
            entry.index,
            dataset.label(entry.index).unwrap_or("?"),
            entry.error
        );
    }
    Ok(())
}

fn default_grid() -> HyperparameterGrid {
    let base = Hyperparameters {
        hidden: vec![16, 4],
        activation: ActivationType::Tanh,
        learning_rate: 0.05,
        momentum: 0.5,
        epochs: 40,
        batch_size: 16,
        ..Default::default()
    };

    HyperparameterGrid {
        hidden: vec![vec![4], vec![16, 4], vec![32, 8]],
        sparsity: vec![None, Some(Sparsity::new(0.1, 0.05))],
        corruption: vec![None, Some(CorruptionConfig::on_off(0.3))],
        ..HyperparameterGrid::new(base)
    }
}

/// Noisy mixtures of a few smooth prototypes, with a handful of pure-noise rows mixed in
fn synthetic_dataset(rng: &mut StdRng) -> autoencode::Result<Dataset> {
    let prototypes: Vec<Vec<f32>> = (0..3)
        .map(|p| {
            (0..DIM)
                .map(|i| (0.5 + 0.5 * ((i as f32 + 1.0) * (p as f32 + 1.0) * 0.1).sin()).clamp(0.0, 1.0))
                .collect()
        })
        .collect();

    let mut features = Array2::zeros((EXAMPLES, DIM));
    let mut labels = Vec::with_capacity(EXAMPLES);
    for (n, mut row) in features.rows_mut().into_iter().enumerate() {
        if n % (EXAMPLES / ANOMALIES) == 0 {
            row.mapv_inplace(|_| rng.random::<f32>());
            labels.push("noise".to_string());
            continue;
        }

        let p = rng.random_range(0..prototypes.len());
        for (value, base) in row.iter_mut().zip(&prototypes[p]) {
            *value = (base + rng.random_range(-0.05_f32..0.05)).clamp(0.0, 1.0);
        }
        labels.push(format!("prototype {p}"));
    }

    Dataset::from_array(features)?.with_labels(labels)
}
