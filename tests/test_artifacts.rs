//! Tests for artifact persistence and reloading

use sylva::pipeline::{
    evaluate_model, load_metrics, load_model, load_scaler, save_model_and_artifacts,
    Classifier, ForestConfig, RandomForestClassifier, StandardScaler,
};
use sylva::PipelineError;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn fitted() -> (
    RandomForestClassifier,
    StandardScaler,
    ndarray::Array2<f64>,
    ndarray::Array1<usize>,
) {
    let (x, y) = create_separable_dataset(25);
    let (scaler, x_scaled) = StandardScaler::fit_transform(x.view()).unwrap();
    let config = ForestConfig {
        n_estimators: 10,
        n_jobs: Some(1),
        ..Default::default()
    };
    let forest = RandomForestClassifier::fit(x_scaled.view(), y.view(), &config).unwrap();
    (forest, scaler, x_scaled, y)
}

#[test]
fn test_saves_three_files_with_shared_suffix() {
    let (_temp_dir, output) = create_temp_output();
    let (forest, scaler, x, y) = fitted();
    let metrics = evaluate_model(&forest, x.view(), y.view()).unwrap();

    let paths = save_model_and_artifacts(&forest, &scaler, &metrics, &output).unwrap();

    assert!(output.output_dir.is_dir(), "Output directory should be created");
    assert_eq!(count_files(&output.output_dir), 3);

    let suffix = metrics.timestamp.format("%Y%m%d_%H%M%S").to_string();
    let name = |path: &std::path::Path| path.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(name(&paths.model), format!("rf_{}.bin", suffix));
    assert_eq!(name(&paths.scaler), format!("rf_scaler_{}.bin", suffix));
    assert_eq!(name(&paths.metrics), format!("rf_metrics_{}.json", suffix));
}

#[test]
fn test_reloaded_artifacts_reproduce_predictions() {
    let (_temp_dir, output) = create_temp_output();
    let (forest, scaler, x, y) = fitted();
    let metrics = evaluate_model(&forest, x.view(), y.view()).unwrap();
    let paths = save_model_and_artifacts(&forest, &scaler, &metrics, &output).unwrap();

    let reloaded_model = load_model(&paths.model).unwrap();
    let reloaded_scaler = load_scaler(&paths.scaler).unwrap();

    assert_eq!(reloaded_model, forest);
    assert_eq!(reloaded_scaler, scaler);
    assert_eq!(
        reloaded_model.predict(x.view()).unwrap(),
        forest.predict(x.view()).unwrap()
    );
}

#[test]
fn test_metrics_document_layout() {
    let (_temp_dir, output) = create_temp_output();
    let (forest, scaler, x, y) = fitted();
    let metrics = evaluate_model(&forest, x.view(), y.view()).unwrap();
    let paths = save_model_and_artifacts(&forest, &scaler, &metrics, &output).unwrap();

    let text = std::fs::read_to_string(&paths.metrics).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(json["accuracy"].is_number());
    assert!(json["timestamp"].is_string());
    assert!(json["classification_report"]["0"]["precision"].is_number());
    assert!(json["classification_report"]["macro avg"]["f1-score"].is_number());

    let reloaded = load_metrics(&paths.metrics).unwrap();
    assert_eq!(reloaded.timestamp, metrics.timestamp);
    assert!((reloaded.accuracy - metrics.accuracy).abs() < 1e-12);
    assert_eq!(
        reloaded.classification_report.classes.keys().collect::<Vec<_>>(),
        vec!["0", "1"]
    );
}

#[test]
fn test_existing_output_directory_is_reused() {
    let (_temp_dir, output) = create_temp_output();
    std::fs::create_dir_all(&output.output_dir).unwrap();
    let (forest, scaler, x, y) = fitted();
    let metrics = evaluate_model(&forest, x.view(), y.view()).unwrap();

    save_model_and_artifacts(&forest, &scaler, &metrics, &output).unwrap();
    save_model_and_artifacts(&forest, &scaler, &metrics, &output).unwrap();

    assert_eq!(count_files(&output.output_dir), 3);
}

#[test]
fn test_output_path_blocked_by_file() {
    let (temp_dir, mut output) = create_temp_output();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    output.output_dir = blocker;

    let (forest, scaler, x, y) = fitted();
    let metrics = evaluate_model(&forest, x.view(), y.view()).unwrap();
    let result = save_model_and_artifacts(&forest, &scaler, &metrics, &output);
    assert!(matches!(result, Err(PipelineError::Io { .. })));
}
