//! Stratified train/test split and feature scaling

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::config::SplitConfig;
use super::scaler::StandardScaler;
use crate::error::{PipelineError, Result};

/// Row indices of the original dataset assigned to each partition.
///
/// Every row appears in exactly one of `train` or `test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Output of the preprocessing stage
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Standardized training features
    pub x_train: Array2<f64>,
    /// Test features standardized with the training statistics
    pub x_test: Array2<f64>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
    /// Scaler fitted on the training rows only
    pub scaler: StandardScaler,
    pub partition: Partition,
}

/// Split, then standardize with statistics from the training rows.
///
/// # Errors
/// - `InvalidArgument` if `config` is out of range
/// - `DataShape` if `x` and `y` disagree on row count or stratification is impossible
/// - `Fit` if the scaler cannot be fitted
pub fn preprocess_data(
    x: ArrayView2<f64>,
    y: ArrayView1<usize>,
    config: &SplitConfig,
) -> Result<Preprocessed> {
    if x.nrows() != y.len() {
        return Err(PipelineError::DataShape(format!(
            "sample matrix has {} rows but label vector has {} entries",
            x.nrows(),
            y.len()
        )));
    }

    tracing::info!(test_size = config.test_size, "Splitting data into train/test sets");
    let partition = stratified_split(y, config)?;

    let x_train = x.select(Axis(0), &partition.train);
    let x_test = x.select(Axis(0), &partition.test);
    let y_train = y.select(Axis(0), &partition.train);
    let y_test = y.select(Axis(0), &partition.test);

    tracing::info!("Scaling features");
    let scaler = StandardScaler::fit(x_train.view())?;
    let x_train = scaler.transform(x_train.view())?;
    let x_test = scaler.transform(x_test.view())?;

    Ok(Preprocessed {
        x_train,
        x_test,
        y_train,
        y_test,
        scaler,
        partition,
    })
}

/// Partition row indices so each class keeps its share in both subsets.
///
/// The test partition receives `ceil(test_size * n)` rows; per-class quotas are
/// allocated by largest remainder, ties going to the lower label.
///
/// # Errors
/// `DataShape` when the labels are empty, a class has fewer than two members,
/// or either partition would hold fewer rows than there are classes.
pub fn stratified_split(labels: ArrayView1<usize>, config: &SplitConfig) -> Result<Partition> {
    config.validate()?;

    let n_samples = labels.len();
    if n_samples == 0 {
        return Err(PipelineError::DataShape(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let mut rows_by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        rows_by_class.entry(label).or_default().push(row);
    }

    if let Some((label, rows)) = rows_by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(PipelineError::DataShape(format!(
            "class {} has only {} member(s); stratification needs at least 2 per class",
            label,
            rows.len()
        )));
    }

    let n_classes = rows_by_class.len();
    let n_test = (config.test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples - n_test.min(n_samples);
    if n_test < n_classes || n_train < n_classes {
        return Err(PipelineError::DataShape(format!(
            "train ({}) and test ({}) partitions must each hold at least one row per class ({})",
            n_train, n_test, n_classes
        )));
    }

    let class_sizes: Vec<usize> = rows_by_class.values().map(Vec::len).collect();
    let test_quota = allocate_proportionally(&class_sizes, n_test);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (rows, quota) in rows_by_class.values_mut().zip(test_quota) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..quota]);
        train.extend_from_slice(&rows[quota..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(
        n_train = train.len(),
        n_test = test.len(),
        n_classes,
        "Stratified split complete"
    );

    Ok(Partition { train, test })
}

/// Distribute `draws` across groups in proportion to their sizes.
///
/// Floors first, then hands the leftover draws to the largest fractional
/// remainders. Never assigns a group more than its size.
fn allocate_proportionally(sizes: &[usize], draws: usize) -> Vec<usize> {
    let population: usize = sizes.iter().sum();
    if population == 0 {
        return vec![0; sizes.len()];
    }

    let exact: Vec<f64> = sizes
        .iter()
        .map(|&size| size as f64 * draws as f64 / population as f64)
        .collect();
    let mut quota: Vec<usize> = exact
        .iter()
        .zip(sizes)
        .map(|(e, &size)| (e.floor() as usize).min(size))
        .collect();

    let mut remaining = draws.saturating_sub(quota.iter().sum());
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let frac_a = exact[a] - quota[a] as f64;
        let frac_b = exact[b] - quota[b] as f64;
        frac_b
            .partial_cmp(&frac_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    while remaining > 0 {
        let mut progressed = false;
        for &group in &order {
            if remaining == 0 {
                break;
            }
            if quota[group] < sizes[group] {
                quota[group] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    quota
}
