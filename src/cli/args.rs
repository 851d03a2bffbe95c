//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::pipeline::{MaxFeatures, PipelineConfig};

/// Sylva - Train, evaluate and persist a random forest on synthetic data
///
/// Every option defaults to the built-in configuration. A JSON file given with
/// --config replaces those defaults; individual flags override both.
#[derive(Parser, Debug, Default)]
#[command(name = "sylva")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file (keys: generator, split, forest, output).
    /// Missing keys keep their defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of samples to generate
    #[arg(long)]
    pub n_samples: Option<usize>,

    /// Total number of feature columns
    #[arg(long)]
    pub n_features: Option<usize>,

    /// Number of informative features
    #[arg(long)]
    pub n_informative: Option<usize>,

    /// Number of redundant features (linear combinations of informative ones)
    #[arg(long)]
    pub n_redundant: Option<usize>,

    /// Number of classes
    #[arg(long)]
    pub n_classes: Option<usize>,

    /// Fraction of labels flipped at random (0.0 disables label noise)
    #[arg(long)]
    pub flip_y: Option<f64>,

    /// Fraction of samples held out for evaluation, in (0, 1)
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Number of trees in the forest
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Maximum tree depth
    #[arg(long, conflicts_with = "unlimited_depth")]
    pub max_depth: Option<usize>,

    /// Grow trees until leaves are pure instead of capping their depth
    #[arg(long, default_value = "false")]
    pub unlimited_depth: bool,

    /// Features considered per split.
    /// Options: "sqrt" (default), "log2", "all" or a positive integer
    #[arg(long, value_parser = parse_max_features)]
    pub max_features: Option<MaxFeatures>,

    /// Worker threads for tree fitting. Defaults to every available core.
    #[arg(long)]
    pub n_jobs: Option<usize>,

    /// Seed applied to data generation, splitting and training
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory receiving the model, scaler and metrics files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Filename prefix for the artifact set
    #[arg(long)]
    pub model_name: Option<String>,

    /// Suppress the banner, step output and summary tables
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Emit debug logs on stderr (RUST_LOG overrides this)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

impl Cli {
    /// Build the run configuration: defaults, then the --config file, then flags.
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }

        let generator = &mut config.generator;
        if let Some(n) = self.n_samples {
            generator.n_samples = n;
        }
        if let Some(n) = self.n_features {
            generator.n_features = n;
        }
        if let Some(n) = self.n_informative {
            generator.n_informative = n;
        }
        if let Some(n) = self.n_redundant {
            generator.n_redundant = n;
        }
        if let Some(n) = self.n_classes {
            generator.n_classes = n;
        }
        if let Some(flip_y) = self.flip_y {
            generator.flip_y = flip_y;
        }

        if let Some(test_size) = self.test_size {
            config.split.test_size = test_size;
        }

        let forest = &mut config.forest;
        if let Some(n) = self.n_estimators {
            forest.n_estimators = n;
        }
        if self.unlimited_depth {
            forest.max_depth = None;
        } else if let Some(depth) = self.max_depth {
            forest.max_depth = Some(depth);
        }
        if let Some(max_features) = self.max_features {
            forest.max_features = max_features;
        }
        if let Some(n_jobs) = self.n_jobs {
            forest.n_jobs = Some(n_jobs);
        }

        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(name) = &self.model_name {
            config.output.model_name = name.clone();
        }

        Ok(config)
    }
}

/// Validator for max_features parameter
fn parse_max_features(s: &str) -> std::result::Result<MaxFeatures, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_gives_defaults() {
        let cli = Cli::parse_from(["sylva"]);
        assert_eq!(cli.resolve_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_max_features_parses_keywords_and_counts() {
        let cli = Cli::parse_from(["sylva", "--max-features", "log2"]);
        assert_eq!(cli.max_features, Some(MaxFeatures::Log2));

        let cli = Cli::parse_from(["sylva", "--max-features", "7"]);
        assert_eq!(cli.max_features, Some(MaxFeatures::Count(7)));

        assert!(Cli::try_parse_from(["sylva", "--max-features", "half"]).is_err());
    }

    #[test]
    fn test_depth_flags_conflict() {
        let result = Cli::try_parse_from(["sylva", "--max-depth", "4", "--unlimited-depth"]);
        assert!(result.is_err());
    }
}
