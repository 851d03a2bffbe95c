//! Sylva: random forests from synthetic data
//!
//! A library that generates a synthetic classification dataset, splits and
//! standardizes it, trains a random forest, evaluates it on held-out rows and
//! persists the model, scaler and metrics.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{PipelineError, Result};
