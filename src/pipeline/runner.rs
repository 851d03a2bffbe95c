//! Stage composition
//!
//! `run_pipeline` drives one run through
//! `Init → Generated → Preprocessed → Trained → Evaluated → Persisted → Done`.
//! Any stage error stops the run; the returned [`PipelineFailure`] records the
//! last state that was reached.

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::config::PipelineConfig;
use super::evaluate::{evaluate_model, MetricsRecord};
use super::forest::train_model;
use super::generator::create_synthetic_data;
use super::persist::{save_model_and_artifacts, ArtifactPaths};
use super::preprocess::preprocess_data;
use crate::error::PipelineError;
use crate::utils::Reporter;

/// Where a run is in the stage sequence. A failed run is reported through
/// [`PipelineFailure`] rather than a separate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    Generated,
    Preprocessed,
    Trained,
    Evaluated,
    Persisted,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::Generated => "generated",
            PipelineStage::Preprocessed => "preprocessed",
            PipelineStage::Trained => "trained",
            PipelineStage::Evaluated => "evaluated",
            PipelineStage::Persisted => "persisted",
            PipelineStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// A stage error together with the last state the run reached
#[derive(Debug, Error)]
#[error("pipeline failed after reaching '{stage}'")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: PipelineError,
}

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub generate: Duration,
    pub preprocess: Duration,
    pub train: Duration,
    pub evaluate: Duration,
    pub persist: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.generate + self.preprocess + self.train + self.evaluate + self.persist
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub artifacts: ArtifactPaths,
    pub metrics: MetricsRecord,
    pub feature_importances: Vec<f64>,
    pub timings: StageTimings,
    pub n_train: usize,
    pub n_test: usize,
}

/// Run generate, preprocess, train, evaluate and persist in order.
///
/// The whole configuration is validated before anything is generated or
/// written, so an invalid configuration leaves the filesystem untouched.
pub fn run_pipeline(
    config: &PipelineConfig,
    reporter: &Reporter,
) -> std::result::Result<RunOutcome, PipelineFailure> {
    let mut stage = PipelineStage::Init;
    let fail = |stage: PipelineStage| {
        move |error: PipelineError| {
            tracing::debug!(%stage, kind = error.kind(), "Stage failed");
            PipelineFailure { stage, error }
        }
    };

    config.validate().map_err(fail(stage))?;
    tracing::debug!(?config, "Configuration validated");

    let mut timings = StageTimings::default();

    // Step 1: generate
    reporter.step(1, "Generate Synthetic Data");
    let step_start = Instant::now();
    let spinner = reporter.spinner("Generating samples...");
    let dataset = match create_synthetic_data(&config.generator) {
        Ok(dataset) => dataset,
        Err(error) => {
            reporter.abandon(&spinner, "Data generation failed");
            return Err(fail(stage)(error));
        }
    };
    reporter.finish(&spinner, "Synthetic data generated");
    reporter.count("samples", dataset.n_samples(), None);
    reporter.count("features", dataset.n_features(), None);
    for (label, count) in dataset.class_counts() {
        reporter.count(&format!("samples in class {}", label), count, None);
    }
    if config.generator.flip_y > 0.0 {
        reporter.info(&format!(
            "Label noise: {:.1}% of labels re-drawn at random",
            config.generator.flip_y * 100.0
        ));
    }
    timings.generate = step_start.elapsed();
    reporter.step_time(timings.generate);
    stage = PipelineStage::Generated;

    // Step 2: split + scale
    reporter.step(2, "Preprocess");
    let step_start = Instant::now();
    let spinner = reporter.spinner("Splitting and scaling...");
    let prepared = match preprocess_data(
        dataset.features.view(),
        dataset.labels.view(),
        &config.split,
    ) {
        Ok(prepared) => prepared,
        Err(error) => {
            reporter.abandon(&spinner, "Preprocessing failed");
            return Err(fail(stage)(error));
        }
    };
    reporter.finish(&spinner, "Features standardized");
    let n_train = prepared.y_train.len();
    let n_test = prepared.y_test.len();
    reporter.count("training rows", n_train, None);
    reporter.count(
        "test rows",
        n_test,
        Some(&format!("(test_size {:.2})", config.split.test_size)),
    );
    timings.preprocess = step_start.elapsed();
    reporter.step_time(timings.preprocess);
    stage = PipelineStage::Preprocessed;

    // Step 3: train
    reporter.step(3, "Train Random Forest");
    let step_start = Instant::now();
    let progress = reporter.progress_bar(config.forest.n_estimators as u64, "Fitting trees");
    let model = match train_model(
        prepared.x_train.view(),
        prepared.y_train.view(),
        &config.forest,
        &progress,
    ) {
        Ok(model) => model,
        Err(error) => {
            reporter.abandon(&progress, "Training failed");
            return Err(fail(stage)(error));
        }
    };
    reporter.finish(&progress, &format!("Fitted {} trees", model.n_trees()));
    timings.train = step_start.elapsed();
    reporter.step_time(timings.train);
    stage = PipelineStage::Trained;

    // Step 4: evaluate
    reporter.step(4, "Evaluate");
    let step_start = Instant::now();
    let metrics = evaluate_model(&model, prepared.x_test.view(), prepared.y_test.view())
        .map_err(fail(stage))?;
    reporter.success(&format!("Test accuracy: {:.4}", metrics.accuracy));
    timings.evaluate = step_start.elapsed();
    reporter.step_time(timings.evaluate);
    stage = PipelineStage::Evaluated;

    // Step 5: persist
    reporter.step(5, "Save Artifacts");
    let step_start = Instant::now();
    let spinner = reporter.spinner("Writing model, scaler and metrics...");
    let artifacts =
        match save_model_and_artifacts(&model, &prepared.scaler, &metrics, &config.output) {
            Ok(artifacts) => artifacts,
            Err(error) => {
                reporter.abandon(&spinner, "Saving artifacts failed");
                return Err(fail(stage)(error));
            }
        };
    reporter.finish(
        &spinner,
        &format!("Saved to {}", config.output.output_dir.display()),
    );
    timings.persist = step_start.elapsed();
    reporter.step_time(timings.persist);
    stage = PipelineStage::Persisted;
    tracing::debug!(%stage, "Artifacts persisted");

    tracing::info!(
        stage = %PipelineStage::Done,
        model = %artifacts.model.display(),
        total_ms = timings.total().as_millis() as u64,
        "Pipeline finished"
    );

    Ok(RunOutcome {
        artifacts,
        feature_importances: model.feature_importances().to_vec(),
        metrics,
        timings,
        n_train,
        n_test,
    })
}
