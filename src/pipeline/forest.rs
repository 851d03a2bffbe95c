//! Random forest classifier and the training stage
//!
//! Trees are fitted in parallel with rayon. Every tree draws from its own RNG
//! seeded from the master seed in tree order, so the fitted forest does not
//! depend on the number of worker threads.

use std::collections::BTreeMap;

use indicatif::ProgressBar;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::ForestConfig;
use super::tree::{DecisionTree, TreeParams};
use crate::error::{PipelineError, Result};

/// Anything that can label a feature matrix.
///
/// The evaluator only needs predictions, so it works against this trait rather
/// than a concrete model type.
pub trait Classifier {
    /// Predict one class label per row of `x`.
    ///
    /// # Errors
    /// `DataShape` if `x` has a different number of columns than the training data.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>>;
}

/// Bagged ensemble of CART trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    /// Sorted class labels; tree leaves index into this list
    classes: Vec<usize>,
    n_features: usize,
    config: ForestConfig,
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    /// Fit a forest on `x` / `y`.
    ///
    /// # Errors
    /// - `InvalidArgument` if `config` is out of range for this data
    /// - `DataShape` if `x` and `y` disagree on row count
    /// - `Fit` for empty input, a single class, or thread-pool failure
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<usize>, config: &ForestConfig) -> Result<Self> {
        Self::fit_with_progress(x, y, config, &ProgressBar::hidden())
    }

    /// Like [`fit`](Self::fit), ticking `progress` once per finished tree
    pub fn fit_with_progress(
        x: ArrayView2<f64>,
        y: ArrayView1<usize>,
        config: &ForestConfig,
        progress: &ProgressBar,
    ) -> Result<Self> {
        config.validate()?;

        if x.nrows() != y.len() {
            return Err(PipelineError::DataShape(format!(
                "training matrix has {} rows but label vector has {} entries",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(PipelineError::Fit(format!(
                "cannot fit a forest on a {}x{} matrix",
                x.nrows(),
                x.ncols()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Fit(
                "training matrix contains NaN or infinite values".to_string(),
            ));
        }

        let classes: Vec<usize> = {
            let mut labels: Vec<usize> = y.to_vec();
            labels.sort_unstable();
            labels.dedup();
            labels
        };
        if classes.len() < 2 {
            return Err(PipelineError::Fit(format!(
                "training labels contain {} distinct class(es); at least 2 are required",
                classes.len()
            )));
        }

        let class_index: BTreeMap<usize, usize> = classes
            .iter()
            .enumerate()
            .map(|(index, &label)| (label, index))
            .collect();
        let targets: Vec<usize> = y.iter().map(|label| class_index[label]).collect();

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(x.ncols())?,
        };

        let mut master = StdRng::seed_from_u64(config.seed);
        let tree_seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        tracing::info!(
            n_estimators = config.n_estimators,
            max_depth = ?config.max_depth,
            max_features = params.max_features,
            n_jobs = ?config.n_jobs,
            "Training random forest"
        );

        progress.set_length(config.n_estimators as u64);
        let n_rows = x.nrows();
        let n_classes = classes.len();
        let fit_all = || -> Vec<DecisionTree> {
            tree_seeds
                .par_iter()
                .map(|&seed| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let rows: Vec<usize> = if config.bootstrap {
                        (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                    } else {
                        (0..n_rows).collect()
                    };
                    let tree = DecisionTree::fit(x, &targets, rows, n_classes, &params, &mut rng);
                    progress.inc(1);
                    tree
                })
                .collect()
        };

        let trees = match config.n_jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| PipelineError::Fit(format!("failed to build thread pool: {}", e)))?
                .install(fit_all),
            None => fit_all(),
        };

        let feature_importances = average_importances(&trees, x.ncols());

        tracing::info!(
            trees = trees.len(),
            mean_depth = trees.iter().map(|t| t.depth() as f64).sum::<f64>() / trees.len() as f64,
            total_nodes = trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            "Model training completed"
        );

        Ok(Self {
            trees,
            classes,
            n_features: x.ncols(),
            config: config.clone(),
            feature_importances,
        })
    }

    /// Mean class distribution over all trees; columns follow [`classes`](Self::classes)
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(x)?;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.classes.len()));
        for (sample, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            for tree in &self.trees {
                for (acc, p) in out.iter_mut().zip(tree.predict_distribution(sample)) {
                    *acc += p;
                }
            }
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Sorted class labels seen during training
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Hyperparameters the forest was fitted with
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Mean decrease in impurity per feature, summing to 1 unless no tree split
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn check_width(&self, x: ArrayView2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::DataShape(format!(
                "model was trained on {} features but input has {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

impl Classifier for RandomForestClassifier {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row)])
            .collect())
    }
}

/// Training stage: fit the forest with the configured hyperparameters.
///
/// # Errors
/// See [`RandomForestClassifier::fit`].
pub fn train_model(
    x_train: ArrayView2<f64>,
    y_train: ArrayView1<usize>,
    config: &ForestConfig,
    progress: &ProgressBar,
) -> Result<RandomForestClassifier> {
    RandomForestClassifier::fit_with_progress(x_train, y_train, config, progress)
}

/// Index of the largest value; the first one wins ties
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (index, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = index;
        }
    }
    best
}

fn average_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut importances = vec![0.0; n_features];
    let mut contributing = 0usize;
    for tree in trees {
        let tree_importances = tree.feature_importances();
        if tree_importances.iter().all(|v| *v == 0.0) {
            continue;
        }
        contributing += 1;
        for (acc, v) in importances.iter_mut().zip(tree_importances) {
            *acc += v;
        }
    }
    if contributing > 0 {
        for v in importances.iter_mut() {
            *v /= contributing as f64;
        }
    }
    importances
}
