//! Typed configuration for every pipeline stage
//!
//! Defaults reproduce the fixed constants of the reference training run
//! (1000 samples, 20 features, 20% test split, 100 trees of depth 10, seed 42).
//! Every struct uses `#[serde(default)]` so a partial JSON document only
//! overrides the keys it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Seed shared by all stochastic stages unless overridden
pub const DEFAULT_SEED: u64 = 42;

/// Default directory for persisted artifacts, relative to the working directory
/// of the process
pub const DEFAULT_OUTPUT_DIR: &str = "models";

/// Default artifact name prefix
pub const DEFAULT_MODEL_NAME: &str = "random_forest_model";

/// Options for the synthetic data generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of rows to generate
    pub n_samples: usize,
    /// Total number of feature columns
    pub n_features: usize,
    /// Columns drawn around the class cluster centroids
    pub n_informative: usize,
    /// Columns that are random linear combinations of the informative ones
    pub n_redundant: usize,
    /// Columns duplicated from informative/redundant columns
    pub n_repeated: usize,
    /// Number of class labels
    pub n_classes: usize,
    /// Gaussian clusters per class
    pub n_clusters_per_class: usize,
    /// Half-side of the hypercube holding the cluster centroids
    pub class_sep: f64,
    /// Fraction of labels re-drawn uniformly at random
    pub flip_y: f64,
    /// Place centroids on hypercube vertices (otherwise random points in the box)
    pub hypercube: bool,
    /// Constant added to every feature
    pub shift: f64,
    /// Constant multiplying every feature
    pub scale: f64,
    /// Permute rows and feature columns after generation
    pub shuffle: bool,
    /// RNG seed
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            n_features: 20,
            n_informative: 15,
            n_redundant: 5,
            n_repeated: 0,
            n_classes: 2,
            n_clusters_per_class: 2,
            class_sep: 1.0,
            flip_y: 0.01,
            hypercube: true,
            shift: 0.0,
            scale: 1.0,
            shuffle: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl GeneratorConfig {
    /// Check every option; returns `InvalidArgument` on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.n_samples == 0 {
            return invalid("n_samples must be a positive integer, got 0");
        }
        if self.n_features == 0 {
            return invalid("n_features must be a positive integer, got 0");
        }
        if self.n_informative == 0 {
            return invalid("n_informative must be a positive integer, got 0");
        }
        let structured = self
            .n_informative
            .checked_add(self.n_redundant)
            .and_then(|sum| sum.checked_add(self.n_repeated));
        match structured {
            Some(structured) if structured <= self.n_features => {}
            _ => {
                return invalid(format!(
                    "n_informative + n_redundant + n_repeated ({} + {} + {}) \
                     must not exceed n_features ({})",
                    self.n_informative, self.n_redundant, self.n_repeated, self.n_features
                ));
            }
        }
        if self.n_classes < 2 {
            return invalid(format!("n_classes must be at least 2, got {}", self.n_classes));
        }
        if self.n_clusters_per_class == 0 {
            return invalid("n_clusters_per_class must be a positive integer, got 0");
        }
        let Some(n_clusters) = self.n_classes.checked_mul(self.n_clusters_per_class) else {
            return invalid(format!(
                "n_classes * n_clusters_per_class ({} * {}) is too large",
                self.n_classes, self.n_clusters_per_class
            ));
        };
        // 2^n_informative vertices; anything past 63 bits is plenty
        let vertices = if self.n_informative >= 63 {
            u64::MAX
        } else {
            1u64 << self.n_informative
        };
        if n_clusters as u64 > vertices {
            return invalid(format!(
                "n_classes * n_clusters_per_class ({}) must be at most 2^n_informative ({})",
                n_clusters, vertices
            ));
        }
        if !(0.0..=1.0).contains(&self.flip_y) {
            return invalid(format!("flip_y must be between 0.0 and 1.0, got {}", self.flip_y));
        }
        for (name, value) in [
            ("class_sep", self.class_sep),
            ("shift", self.shift),
            ("scale", self.scale),
        ] {
            if !value.is_finite() {
                return invalid(format!("{} must be finite, got {}", name, value));
            }
        }
        Ok(())
    }
}

/// Options for the stratified train/test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows assigned to the test partition
    pub test_size: f64,
    /// RNG seed for the per-class shuffles
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: DEFAULT_SEED,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return invalid(format!(
                "test_size must be strictly between 0.0 and 1.0, got {}",
                self.test_size
            ));
        }
        Ok(())
    }
}

/// Number of candidate features examined at each split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features)), at least one
    #[default]
    Sqrt,
    /// floor(log2(n_features)), at least one
    Log2,
    /// Every feature
    All,
    /// A fixed count
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for a matrix with `n_features` columns.
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        let n = n_features as f64;
        let count = match self {
            MaxFeatures::Sqrt => (n.sqrt() as usize).max(1),
            MaxFeatures::Log2 => (n.log2() as usize).max(1),
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => {
                if *k == 0 || *k > n_features {
                    return invalid(format!(
                        "max_features must be between 1 and {} for this dataset, got {}",
                        n_features, k
                    ));
                }
                *k
            }
        };
        Ok(count.min(n_features))
    }
}

impl std::fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxFeatures::Sqrt => write!(f, "sqrt"),
            MaxFeatures::Log2 => write!(f, "log2"),
            MaxFeatures::All => write!(f, "all"),
            MaxFeatures::Count(k) => write!(f, "{}", k),
        }
    }
}

impl std::str::FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => other.parse::<usize>().map(MaxFeatures::Count).map_err(|_| {
                format!(
                    "Unknown max_features: '{}'. Use 'sqrt', 'log2', 'all' or a positive integer.",
                    s
                )
            }),
        }
    }
}

/// Hyperparameters for the random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Depth cap; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum node size for a split to be attempted
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
    /// Features sampled per split
    pub max_features: MaxFeatures,
    /// Draw each tree's rows with replacement
    pub bootstrap: bool,
    /// Master seed; per-tree seeds are derived from it
    pub seed: u64,
    /// Worker threads for tree fitting; `None` uses every available core
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: DEFAULT_SEED,
            n_jobs: None,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return invalid("n_estimators must be a positive integer, got 0");
        }
        if self.max_depth == Some(0) {
            return invalid("max_depth must be a positive integer when set, got 0");
        }
        if self.min_samples_split < 2 {
            return invalid(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            ));
        }
        if self.min_samples_leaf == 0 {
            return invalid("min_samples_leaf must be a positive integer, got 0");
        }
        if self.max_features == MaxFeatures::Count(0) {
            return invalid("max_features must be a positive integer, got 0");
        }
        if self.n_jobs == Some(0) {
            return invalid("n_jobs must be a positive integer when set, got 0");
        }
        Ok(())
    }
}

/// Where and under which name artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the artifact set (created if absent)
    pub output_dir: PathBuf,
    /// Prefix shared by the model, scaler and metrics files
    pub model_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return invalid("model_name must not be empty");
        }
        if self
            .model_name
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\0')
        {
            return invalid(format!(
                "model_name must be a plain file name prefix, got '{}'",
                self.model_name
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return invalid("output_dir must not be empty");
        }
        Ok(())
    }
}

/// Complete configuration for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub split: SplitConfig,
    pub forest: ForestConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load a (possibly partial) configuration document from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            PipelineError::InvalidArgument(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Validate all stage configurations. Runs once, before any stage executes.
    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        self.split.validate()?;
        self.forest.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Apply one seed to every stochastic stage
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator.seed = seed;
        self.split.seed = seed;
        self.forest.seed = seed;
        self
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(PipelineError::InvalidArgument(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_structured_features_cannot_exceed_total() {
        let config = GeneratorConfig {
            n_features: 10,
            n_informative: 8,
            n_redundant: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_too_many_clusters_for_hypercube() {
        let config = GeneratorConfig {
            n_features: 2,
            n_informative: 1,
            n_redundant: 0,
            n_clusters_per_class: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_output_dir_is_relative_to_working_directory() {
        let output = OutputConfig::default();
        assert!(output.output_dir.is_relative());
        assert_eq!(output.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_huge_redundant_count_is_rejected_without_overflow() {
        let config = GeneratorConfig {
            n_redundant: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_huge_class_count_is_rejected_without_overflow() {
        let config = GeneratorConfig {
            n_classes: usize::MAX,
            n_clusters_per_class: 2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_test_size_bounds() {
        for bad in [0.0, 1.0, -0.5, f64::NAN] {
            let config = SplitConfig {
                test_size: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "test_size {} should be rejected", bad);
        }
    }

    #[test]
    fn test_max_features_from_str() {
        assert_eq!("sqrt".parse::<MaxFeatures>().unwrap(), MaxFeatures::Sqrt);
        assert_eq!("LOG2".parse::<MaxFeatures>().unwrap(), MaxFeatures::Log2);
        assert_eq!("all".parse::<MaxFeatures>().unwrap(), MaxFeatures::All);
        assert_eq!("7".parse::<MaxFeatures>().unwrap(), MaxFeatures::Count(7));
        assert!("half".parse::<MaxFeatures>().is_err());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(20).unwrap(), 4);
        assert_eq!(MaxFeatures::Log2.resolve(20).unwrap(), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::All.resolve(20).unwrap(), 20);
        assert!(MaxFeatures::Count(21).resolve(20).is_err());
    }

    #[test]
    fn test_model_name_rejects_separators() {
        let config = OutputConfig {
            model_name: "nested/name".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "forest": { "n_estimators": 7 } }"#).unwrap();
        assert_eq!(config.forest.n_estimators, 7);
        assert_eq!(config.forest.max_depth, Some(10));
        assert_eq!(config.generator, GeneratorConfig::default());
    }
}
