//! Integration tests for the full training pipeline

use sylva::pipeline::*;
use sylva::utils::Reporter;
use sylva::PipelineError;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_default_sized_run_writes_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        output: OutputConfig {
            output_dir: temp_dir.path().join("models"),
            ..Default::default()
        },
        ..Default::default()
    }
    .with_seed(42);
    assert_eq!(config.generator.n_samples, 1000);
    assert_eq!(config.generator.n_features, 20);
    assert_eq!(config.generator.n_informative, 15);
    assert_eq!(config.generator.n_redundant, 5);

    let outcome = run_pipeline(&config, &Reporter::quiet()).unwrap();

    assert_eq!(outcome.n_train, 800);
    assert_eq!(outcome.n_test, 200);
    assert!((0.0..=1.0).contains(&outcome.metrics.accuracy));
    for path in outcome.artifacts.iter() {
        assert!(path.is_file(), "Missing artifact {}", path.display());
    }
    assert_eq!(count_files(&config.output.output_dir), 3);

    let text = std::fs::read_to_string(&outcome.artifacts.metrics).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(json["accuracy"].is_number());
    assert!(json["classification_report"]["weighted avg"].is_object());

    let model_name = outcome
        .artifacts
        .model
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    assert!(model_name.starts_with("random_forest_model_"));
    assert!(model_name.ends_with(".bin"));
}

#[test]
fn test_informative_data_learns_something() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_small_config(temp_dir.path());

    let outcome = run_pipeline(&config, &Reporter::quiet()).unwrap();

    assert!(
        outcome.metrics.accuracy > 0.6,
        "Accuracy {} should beat chance on informative data",
        outcome.metrics.accuracy
    );
    let importance_sum: f64 = outcome.feature_importances.iter().sum();
    assert!((importance_sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_reloaded_model_matches_reported_accuracy() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_small_config(temp_dir.path());
    let outcome = run_pipeline(&config, &Reporter::quiet()).unwrap();

    // Rebuild the test partition from the same seeds
    let dataset = create_synthetic_data(&config.generator).unwrap();
    let partition = stratified_split(dataset.labels.view(), &config.split).unwrap();
    let x_test = dataset
        .features
        .select(ndarray::Axis(0), &partition.test);
    let y_test = dataset.labels.select(ndarray::Axis(0), &partition.test);

    let model = load_model(&outcome.artifacts.model).unwrap();
    let scaler = load_scaler(&outcome.artifacts.scaler).unwrap();
    let x_test_scaled = scaler.transform(x_test.view()).unwrap();
    let metrics = evaluate_model(&model, x_test_scaled.view(), y_test.view()).unwrap();

    assert_eq!(metrics.accuracy, outcome.metrics.accuracy);
}

#[test]
fn test_runs_are_reproducible() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();

    let first = run_pipeline(&create_small_config(first_dir.path()), &Reporter::quiet()).unwrap();
    let second = run_pipeline(&create_small_config(second_dir.path()), &Reporter::quiet()).unwrap();

    assert_eq!(first.metrics.accuracy, second.metrics.accuracy);
    assert_eq!(first.feature_importances, second.feature_importances);
}

#[test]
fn test_zero_samples_fails_before_any_io() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_small_config(&temp_dir.path().join("never_created"));
    config.generator.n_samples = 0;

    let failure = run_pipeline(&config, &Reporter::quiet()).unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Init);
    assert!(matches!(failure.error, PipelineError::InvalidArgument(_)));
    assert_eq!(failure.error.kind(), "InvalidArgument");
    assert!(!config.output.output_dir.exists());
}

#[test]
fn test_invalid_split_fails_before_any_io() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_small_config(&temp_dir.path().join("never_created"));
    config.split.test_size = 1.5;

    let failure = run_pipeline(&config, &Reporter::quiet()).unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Init);
    assert!(!config.output.output_dir.exists());
}

#[test]
fn test_persist_failure_reports_stage() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let config = create_small_config(&blocker);

    let failure = run_pipeline(&config, &Reporter::quiet()).unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Evaluated);
    assert!(matches!(failure.error, PipelineError::Io { .. }));
}

#[test]
fn test_summary_tables_cover_every_class() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_pipeline(&create_small_config(temp_dir.path()), &Reporter::quiet()).unwrap();

    let summary = sylva::report::TrainingSummary::new(&outcome);
    // two classes, then macro avg and weighted avg
    assert_eq!(summary.metrics_table().row_iter().count(), 4);
    assert!(summary.overview_table().to_string().contains("Accuracy"));

    let top = summary.top_features();
    assert_eq!(top.len(), 5);
    assert!(top.windows(2).all(|pair| pair[0].1 >= pair[1].1));
}
