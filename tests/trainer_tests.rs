use autoencode::{
    ActivationType,
    AutoencoderError,
    CorruptionConfig,
    Dataset,
    Hyperparameters,
    Sparsity,
    Trainer,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn small_dataset() -> Dataset {
    Dataset::from_rows(vec![
        vec![0.1, 0.5, 0.9],
        vec![0.8, 0.2, 0.4],
        vec![0.3, 0.7, 0.1],
        vec![0.6, 0.6, 0.6],
        vec![0.9, 0.1, 0.3],
        vec![0.2, 0.4, 0.8],
    ]).unwrap()
}

/// Two smooth patterns plus uniform noise, values in [0, 1]
fn synthetic_images(examples: usize, dim: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = Array2::from_shape_fn((examples, dim), |(n, i)| {
        let pattern = ((i + 1) as f32 * (n % 2 + 1) as f32 * 0.05).sin();
        (0.5 + 0.5 * pattern + rng.random_range(-0.1_f32..0.1)).clamp(0.0, 1.0)
    });
    Dataset::from_array(features).unwrap()
}

#[test]
fn test_identity_capable_network_converges() {
    let hp = Hyperparameters {
        hidden: vec![3],
        activation: ActivationType::Linear,
        output_activation: ActivationType::Linear,
        learning_rate: 0.15,
        epochs: 6000,
        batch_size: 6,
        ..Default::default()
    };
    let trained = Trainer::new(hp)
        .train(&small_dataset(), None, &mut StdRng::seed_from_u64(7))
        .unwrap();

    let report = &trained.report;
    assert_eq!(report.history.len(), 6000);
    assert!(
        report.final_training_loss() < 1e-2,
        "loss went from {} to {}",
        report.initial_loss,
        report.final_training_loss()
    );
}

#[test]
fn test_undercomplete_784_to_2_improves() {
    let data = synthetic_images(100, 784, 1);
    let hp = Hyperparameters {
        hidden: vec![2],
        activation: ActivationType::Tanh,
        learning_rate: 0.001,
        epochs: 50,
        batch_size: 10,
        ..Default::default()
    };

    let trained = Trainer::new(hp)
        .train(&data, None, &mut StdRng::seed_from_u64(13))
        .unwrap();

    let report = &trained.report;
    assert_eq!(trained.model.layer_sizes(), vec![784, 2, 784]);
    assert!(
        report.final_training_loss() < report.initial_loss,
        "loss went from {} to {}",
        report.initial_loss,
        report.final_training_loss()
    );

    // Reconstructions keep the input's shape
    let reconstruction = trained.model.reconstruct(data.features()).unwrap();
    assert_eq!(reconstruction.dim(), (100, 784));
}

#[test]
fn test_same_seed_same_run() {
    let hp = Hyperparameters {
        hidden: vec![2],
        epochs: 5,
        batch_size: 2,
        corruption: Some(CorruptionConfig::on_off(0.3)),
        ..Default::default()
    };
    let trainer = Trainer::new(hp);

    let a = trainer.train(&small_dataset(), None, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = trainer.train(&small_dataset(), None, &mut StdRng::seed_from_u64(1)).unwrap();

    assert_eq!(a.report.history, b.report.history);
}

#[test]
fn test_validation_loss_is_reported() {
    let data = synthetic_images(40, 16, 2);
    let mut rng = StdRng::seed_from_u64(3);
    let (train, validation) = data.split(0.25, &mut rng).unwrap();
    let hp = Hyperparameters {
        hidden: vec![8, 4],
        learning_rate: 0.05,
        epochs: 10,
        batch_size: 5,
        ..Default::default()
    };

    let trained = Trainer::new(hp).train(&train, Some(&validation), &mut rng).unwrap();

    assert!(trained.report.history.iter().all(|stats| stats.validation_loss.is_some()));
    let last = trained.report.history.last().unwrap();
    assert_eq!(Some(trained.report.final_validation_loss()), last.validation_loss);
}

#[test]
fn test_denoising_and_sparse_training() {
    let data = synthetic_images(30, 12, 4);
    let hp = Hyperparameters {
        hidden: vec![6],
        activation: ActivationType::Sigmoid,
        sparsity: Some(Sparsity::new(0.5, 0.05)),
        corruption: Some(CorruptionConfig::on_off(0.3)),
        learning_rate: 0.1,
        epochs: 20,
        batch_size: 10,
        ..Default::default()
    };

    let trained = Trainer::new(hp).train(&data, None, &mut StdRng::seed_from_u64(8)).unwrap();

    let history = &trained.report.history;
    assert_eq!(history.len(), 20);
    assert!(history.iter().all(|stats| stats.training_loss.is_finite()));
    // sigmoid code units start near 0.5, far from the 0.05 target
    assert!(history[0].sparsity_penalty > 0.0);
    assert!(history[19].sparsity_penalty < history[0].sparsity_penalty);
}

#[test]
fn test_divergence_is_reported() {
    let hp = Hyperparameters {
        hidden: vec![3],
        activation: ActivationType::Linear,
        learning_rate: 1.0e4,
        epochs: 50,
        batch_size: 2,
        ..Default::default()
    };

    let result = Trainer::new(hp).train(&small_dataset(), None, &mut StdRng::seed_from_u64(0));

    assert!(matches!(result, Err(AutoencoderError::Diverged { .. })));
}

#[test]
fn test_insufficient_data() {
    let hp = Hyperparameters {
        hidden: vec![2],
        batch_size: 32,
        ..Default::default()
    };

    let result = Trainer::new(hp).train(&small_dataset(), None, &mut StdRng::seed_from_u64(0));

    assert!(matches!(
        result,
        Err(AutoencoderError::InsufficientData { examples: 6, batch_size: 32 })
    ));
}

#[test]
fn test_validation_set_must_match() {
    let hp = Hyperparameters { hidden: vec![2], batch_size: 2, ..Default::default() };
    let other = Dataset::from_rows(vec![vec![0.0, 1.0]]).unwrap();

    let result = Trainer::new(hp).train(&small_dataset(), Some(&other), &mut StdRng::seed_from_u64(0));

    assert!(matches!(result, Err(AutoencoderError::DimensionMismatch { .. })));
}
