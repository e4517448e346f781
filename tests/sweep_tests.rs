use std::collections::BTreeSet;

use autoencode::{
    ActivationType,
    AutoencoderError,
    Dataset,
    HyperparameterGrid,
    Hyperparameters,
    Sparsity,
    Sweep,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn data() -> (Dataset, Dataset) {
    let dataset = Dataset::from_array(Array2::from_shape_fn((40, 10), |(n, i)| {
        (((n % 4) as f32 + 1.0) * (i as f32 + 1.0) * 0.1).sin() * 0.5 + 0.5
    })).unwrap();
    dataset.split(0.25, &mut StdRng::seed_from_u64(0)).unwrap()
}

fn config(hidden: Vec<usize>) -> Hyperparameters {
    Hyperparameters {
        hidden,
        learning_rate: 0.05,
        epochs: 15,
        batch_size: 10,
        ..Default::default()
    }
}

#[test]
fn test_one_result_per_configuration_sorted() {
    let (train, validation) = data();
    let configs = vec![config(vec![2]), config(vec![6, 4]), config(vec![8])];

    let report = Sweep::new(configs)
        .with_seed(5)
        .run(&train, Some(&validation))
        .unwrap();

    assert_eq!(report.ranked.len(), 3);
    assert!(report.failed.is_empty());
    assert!(report.skipped.is_empty());
    let seen: BTreeSet<usize> = report.ranked.iter().map(|entry| entry.index).collect();
    assert_eq!(seen, BTreeSet::from([0, 1, 2]));
    assert!(report
        .ranked
        .windows(2)
        .all(|pair| pair[0].validation_loss <= pair[1].validation_loss));
    assert_eq!(report.best().map(|entry| entry.index), Some(report.ranked[0].index));
}

#[test]
fn test_ties_keep_input_order() {
    let (train, validation) = data();
    // identical configurations train identical models
    let configs = vec![config(vec![3]), config(vec![3]), config(vec![3])];

    let report = Sweep::new(configs)
        .with_seed(9)
        .with_threads(3)
        .run(&train, Some(&validation))
        .unwrap();

    let order: Vec<usize> = report.ranked.iter().map(|entry| entry.index).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(report.ranked[0].validation_loss, report.ranked[2].validation_loss);
}

#[test]
fn test_failed_run_does_not_abort_sweep() {
    let (train, validation) = data();
    let diverging = Hyperparameters {
        activation: ActivationType::Linear,
        learning_rate: 1.0e4,
        ..config(vec![4])
    };
    let configs = vec![config(vec![4]), diverging, config(vec![2])];

    let report = Sweep::new(configs).run(&train, Some(&validation)).unwrap();

    assert_eq!(report.ranked.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 1);
    assert!(matches!(report.failed[0].error, AutoencoderError::Diverged { .. }));
    assert!(report.ranked.iter().all(|entry| entry.index != 1));
}

#[test]
fn test_stopped_sweep_skips_runs() {
    let (train, validation) = data();
    let sweep = Sweep::new(vec![config(vec![2]), config(vec![4])]);

    let handle = sweep.stop_handle();
    handle.stop();
    let report = sweep.run(&train, Some(&validation)).unwrap();

    assert!(handle.is_stopped());
    assert!(report.ranked.is_empty());
    assert_eq!(report.skipped, vec![0, 1]);
}

#[test]
fn test_grid_is_cartesian_product() {
    let grid = HyperparameterGrid {
        hidden: vec![vec![4], vec![8, 2]],
        sparsity: vec![None, Some(Sparsity::new(0.1, 0.05)), Some(Sparsity::new(1.0, 0.05))],
        ..HyperparameterGrid::new(config(vec![3]))
    };

    let configs = grid.configurations();

    assert_eq!(configs.len(), 6);
    assert_eq!(configs[0].hidden, vec![4]);
    assert_eq!(configs[0].sparsity, None);
    assert_eq!(configs[1].sparsity, Some(Sparsity::new(0.1, 0.05)));
    assert_eq!(configs[3].hidden, vec![8, 2]);
    assert_eq!(configs[5].sparsity, Some(Sparsity::new(1.0, 0.05)));
    // untouched dimensions keep the base value
    assert!(configs.iter().all(|hp| hp.epochs == 15));
}

#[test]
fn test_empty_grid_is_just_the_base() {
    let grid = HyperparameterGrid::new(config(vec![3]));

    assert_eq!(grid.configurations(), vec![config(vec![3])]);
}

#[test]
fn test_grid_from_json() {
    let grid = HyperparameterGrid::from_json_str(
        r#"{ "base": { "epochs": 3 },
             "hidden": [[16, 2], [32, 2]],
             "activation": ["tanh", "relu"] }"#,
    )
    .unwrap();

    let configs = grid.configurations();
    assert_eq!(configs.len(), 4);
    assert_eq!(configs[1].activation, ActivationType::ReLU);
    assert_eq!(configs[2].hidden, vec![32, 2]);
    assert!(configs.iter().all(|hp| hp.epochs == 3 && hp.batch_size == 32));
}
