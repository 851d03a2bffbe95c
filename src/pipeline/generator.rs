//! Synthetic classification data
//!
//! Builds a labelled dataset from Gaussian clusters placed on the vertices of
//! a hypercube, with optional redundant, repeated and pure-noise columns.
//! Output is fully determined by the configuration, seed included.

use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::config::GeneratorConfig;
use crate::error::Result;

/// A labelled sample matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Rows are samples, columns are features
    pub features: Array2<f64>,
    /// One class label per row
    pub labels: Array1<usize>,
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of rows carrying each label, ordered by label
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        class_counts(self.labels.iter().copied())
    }
}

pub(crate) fn class_counts(labels: impl Iterator<Item = usize>) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Generate a synthetic classification dataset.
///
/// # Errors
/// `InvalidArgument` when the configuration fails [`GeneratorConfig::validate`].
pub fn create_synthetic_data(config: &GeneratorConfig) -> Result<Dataset> {
    config.validate()?;

    tracing::info!(
        n_samples = config.n_samples,
        n_features = config.n_features,
        n_informative = config.n_informative,
        n_redundant = config.n_redundant,
        seed = config.seed,
        "Creating synthetic dataset"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);

    let n_samples = config.n_samples;
    let n_informative = config.n_informative;
    let n_redundant = config.n_redundant;
    let n_repeated = config.n_repeated;
    let n_classes = config.n_classes;
    let n_clusters = n_classes * config.n_clusters_per_class;

    let centroids = generate_centroids(
        &mut rng,
        n_clusters,
        n_informative,
        config.class_sep,
        config.hypercube,
    );

    let mut features = Array2::<f64>::zeros((n_samples, config.n_features));
    let mut labels = Array1::<usize>::zeros(n_samples);

    // Informative block: per-cluster Gaussian noise, linearly mixed, then shifted
    let mut informative =
        Array2::from_shape_fn((n_samples, n_informative), |_| standard_normal(&mut rng));

    let mut start = 0;
    for (cluster, count) in samples_per_cluster(n_samples, n_clusters)
        .into_iter()
        .enumerate()
    {
        let stop = start + count;
        labels.slice_mut(s![start..stop]).fill(cluster % n_classes);

        let mixing = uniform_matrix(&mut rng, n_informative, n_informative);
        let mut block = informative.slice_mut(s![start..stop, ..]);
        let mixed = block.dot(&mixing);
        block.assign(&mixed);
        block += &centroids.row(cluster);

        start = stop;
    }

    features
        .slice_mut(s![.., 0..n_informative])
        .assign(&informative);

    if n_redundant > 0 {
        let combination = uniform_matrix(&mut rng, n_informative, n_redundant);
        features
            .slice_mut(s![.., n_informative..n_informative + n_redundant])
            .assign(&informative.dot(&combination));
    }

    let structured = n_informative + n_redundant;
    for offset in 0..n_repeated {
        let source = ((structured - 1) as f64 * rng.gen::<f64>() + 0.5) as usize;
        let column = features.column(source).to_owned();
        features.column_mut(structured + offset).assign(&column);
    }

    let n_useful = structured + n_repeated;
    for value in features.slice_mut(s![.., n_useful..]).iter_mut() {
        *value = standard_normal(&mut rng);
    }

    if config.flip_y > 0.0 {
        let mut flipped = 0usize;
        for label in labels.iter_mut() {
            if rng.gen::<f64>() < config.flip_y {
                *label = rng.gen_range(0..n_classes);
                flipped += 1;
            }
        }
        tracing::debug!(flipped, "Re-drew labels for noise");
    }

    if config.shift != 0.0 || config.scale != 1.0 {
        let (shift, scale) = (config.shift, config.scale);
        features.mapv_inplace(|v| (v + shift) * scale);
    }

    if config.shuffle {
        let mut rows: Vec<usize> = (0..n_samples).collect();
        rows.shuffle(&mut rng);
        features = features.select(Axis(0), &rows);
        labels = labels.select(Axis(0), &rows);

        let mut columns: Vec<usize> = (0..config.n_features).collect();
        columns.shuffle(&mut rng);
        features = features.select(Axis(1), &columns);
    }

    Ok(Dataset { features, labels })
}

/// Split `n_samples` evenly across clusters, remainder to the first clusters
fn samples_per_cluster(n_samples: usize, n_clusters: usize) -> Vec<usize> {
    let base = n_samples / n_clusters;
    let remainder = n_samples % n_clusters;
    (0..n_clusters)
        .map(|k| base + usize::from(k < remainder))
        .collect()
}

/// Cluster centroids, one row per cluster
fn generate_centroids(
    rng: &mut StdRng,
    n_clusters: usize,
    n_informative: usize,
    class_sep: f64,
    hypercube: bool,
) -> Array2<f64> {
    let mut centroids = Array2::<f64>::zeros((n_clusters, n_informative));
    if hypercube {
        let vertices = sample_hypercube_vertices(rng, n_clusters, n_informative);
        for (cluster, vertex) in vertices.iter().enumerate() {
            for (dim, &bit) in vertex.iter().enumerate() {
                centroids[[cluster, dim]] = if bit { class_sep } else { -class_sep };
            }
        }
    } else {
        centroids.mapv_inplace(|_| (2.0 * rng.gen::<f64>() - 1.0) * class_sep);
    }
    centroids
}

/// Draw `count` distinct vertices of the unit hypercube in `dims` dimensions.
///
/// Caller guarantees `count <= 2^dims`.
fn sample_hypercube_vertices(rng: &mut StdRng, count: usize, dims: usize) -> Vec<Vec<bool>> {
    let mut seen = HashSet::with_capacity(count);
    let mut vertices = Vec::with_capacity(count);
    while vertices.len() < count {
        let vertex: Vec<bool> = (0..dims).map(|_| rng.gen::<bool>()).collect();
        if seen.insert(vertex.clone()) {
            vertices.push(vertex);
        }
    }
    vertices
}

/// Matrix with entries uniform in [-1, 1)
fn uniform_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| 2.0 * rng.gen::<f64>() - 1.0)
}

/// Standard normal draw via the Box-Muller transform
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
