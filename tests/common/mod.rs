//! Shared test utilities and fixture generators
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;

use ndarray::{Array1, Array2};
use sylva::pipeline::{
    ForestConfig, GeneratorConfig, OutputConfig, Partition, PipelineConfig, SplitConfig,
};
use tempfile::TempDir;

/// Two classes that a single threshold on column 0 separates perfectly.
///
/// Class 0 sits in [0, 1), class 1 in [10, 11). Column 1 is a sawtooth carrying
/// no class information.
pub fn create_separable_dataset(n_per_class: usize) -> (Array2<f64>, Array1<usize>) {
    let n = n_per_class * 2;
    let x = Array2::from_shape_fn((n, 2), |(row, col)| {
        let class = row % 2;
        let step = (row / 2) as f64 / n_per_class as f64;
        match col {
            0 => class as f64 * 10.0 + step,
            _ => (row % 7) as f64,
        }
    });
    let y = Array1::from_shape_fn(n, |row| row % 2);
    (x, y)
}

/// A fast end-to-end configuration writing into `output_dir`
pub fn create_small_config(output_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        generator: GeneratorConfig {
            n_samples: 200,
            n_features: 8,
            n_informative: 4,
            n_redundant: 2,
            ..Default::default()
        },
        split: SplitConfig::default(),
        forest: ForestConfig {
            n_estimators: 15,
            max_depth: Some(6),
            ..Default::default()
        },
        output: OutputConfig {
            output_dir: output_dir.to_path_buf(),
            model_name: "test_model".to_string(),
        },
    }
    .with_seed(7)
}

/// Create a temporary directory and an output configuration pointing below it
pub fn create_temp_output() -> (TempDir, OutputConfig) {
    let temp_dir = TempDir::new().unwrap();
    let output = OutputConfig {
        output_dir: temp_dir.path().join("models"),
        model_name: "rf".to_string(),
    };
    (temp_dir, output)
}

/// Number of entries in a directory
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Assert that train and test are disjoint and together cover 0..n
pub fn assert_partition_exhaustive(partition: &Partition, n: usize) {
    let train: BTreeSet<usize> = partition.train.iter().copied().collect();
    let test: BTreeSet<usize> = partition.test.iter().copied().collect();

    assert_eq!(train.len(), partition.train.len(), "Duplicate rows in train");
    assert_eq!(test.len(), partition.test.len(), "Duplicate rows in test");
    assert!(train.is_disjoint(&test), "Train and test share rows");

    let all: BTreeSet<usize> = train.union(&test).copied().collect();
    assert_eq!(all, (0..n).collect::<BTreeSet<usize>>(), "Partition does not cover every row");
}
