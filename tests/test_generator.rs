//! Tests for synthetic data generation

use sylva::pipeline::{create_synthetic_data, GeneratorConfig};
use sylva::PipelineError;

fn config(n_samples: usize, seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        n_samples,
        seed,
        ..Default::default()
    }
}

#[test]
fn test_default_shape() {
    let dataset = create_synthetic_data(&config(1000, 42)).unwrap();

    assert_eq!(dataset.n_samples(), 1000);
    assert_eq!(dataset.n_features(), 20);
    assert_eq!(dataset.labels.len(), 1000);
    assert!(dataset.labels.iter().all(|&label| label < 2));
    assert!(dataset.features.iter().all(|v| v.is_finite()));
}

#[test]
fn test_same_seed_same_data() {
    let first = create_synthetic_data(&config(300, 11)).unwrap();
    let second = create_synthetic_data(&config(300, 11)).unwrap();
    assert_eq!(first, second, "Same seed should reproduce the dataset exactly");
}

#[test]
fn test_different_seed_different_data() {
    let first = create_synthetic_data(&config(300, 11)).unwrap();
    let second = create_synthetic_data(&config(300, 12)).unwrap();
    assert_ne!(first.features, second.features);
}

#[test]
fn test_classes_balanced_without_label_noise() {
    let generator = GeneratorConfig {
        n_samples: 1000,
        flip_y: 0.0,
        seed: 5,
        ..Default::default()
    };
    let dataset = create_synthetic_data(&generator).unwrap();

    let counts = dataset.class_counts();
    assert_eq!(counts.get(&0), Some(&500));
    assert_eq!(counts.get(&1), Some(&500));
}

#[test]
fn test_multiclass_labels() {
    let generator = GeneratorConfig {
        n_samples: 600,
        n_classes: 3,
        flip_y: 0.0,
        seed: 9,
        ..Default::default()
    };
    let dataset = create_synthetic_data(&generator).unwrap();

    let counts = dataset.class_counts();
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&count| count == 200));
}

#[test]
fn test_zero_samples_is_invalid() {
    let result = create_synthetic_data(&config(0, 42));
    assert!(matches!(result, Err(PipelineError::InvalidArgument(_))));
}

#[test]
fn test_too_many_structured_features_is_invalid() {
    let generator = GeneratorConfig {
        n_features: 10,
        n_informative: 8,
        n_redundant: 5,
        ..Default::default()
    };
    let result = create_synthetic_data(&generator);
    assert!(matches!(result, Err(PipelineError::InvalidArgument(_))));
}

#[test]
fn test_too_many_clusters_for_informative_dims() {
    // 2 classes x 2 clusters = 4 clusters, but only 2^1 = 2 hypercube vertices
    let generator = GeneratorConfig {
        n_features: 5,
        n_informative: 1,
        n_redundant: 0,
        ..Default::default()
    };
    let result = create_synthetic_data(&generator);
    assert!(matches!(result, Err(PipelineError::InvalidArgument(_))));
}
