//! Artifact persistence
//!
//! One run writes three files sharing a timestamp suffix:
//! `<name>_<ts>.bin` (model), `<name>_scaler_<ts>.bin` and
//! `<name>_metrics_<ts>.json`. Each file goes through a temporary sibling
//! that is renamed into place, so a reader never sees a half-written file.
//! Files written before a failure are left on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::OutputConfig;
use super::evaluate::MetricsRecord;
use super::forest::RandomForestClassifier;
use super::scaler::StandardScaler;
use crate::error::{PipelineError, Result};

/// Paths of one run's artifact set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub metrics: PathBuf,
}

impl ArtifactPaths {
    /// Paths for `output` stamped with `timestamp`
    pub fn new(output: &OutputConfig, timestamp: &DateTime<Local>) -> Self {
        let suffix = artifact_suffix(timestamp);
        let dir = &output.output_dir;
        let name = &output.model_name;
        Self {
            model: dir.join(format!("{}_{}.bin", name, suffix)),
            scaler: dir.join(format!("{}_scaler_{}.bin", name, suffix)),
            metrics: dir.join(format!("{}_metrics_{}.json", name, suffix)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            self.model.as_path(),
            self.scaler.as_path(),
            self.metrics.as_path(),
        ]
        .into_iter()
    }
}

/// Filename suffix shared by an artifact set, e.g. `20261016_142501`
pub fn artifact_suffix(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y%m%d_%H%M%S").to_string()
}

/// Persistence stage: write model, scaler and metrics, in that order.
///
/// Creates `output.output_dir` if needed. Returns the paths written; the
/// model path is `paths.model`.
///
/// # Errors
/// `Io` on any filesystem failure, `Serialization` if an artifact cannot be
/// encoded. No rollback of files already written.
pub fn save_model_and_artifacts(
    model: &RandomForestClassifier,
    scaler: &StandardScaler,
    metrics: &MetricsRecord,
    output: &OutputConfig,
) -> Result<ArtifactPaths> {
    fs::create_dir_all(&output.output_dir)
        .map_err(|e| PipelineError::io(&output.output_dir, e))?;

    let paths = ArtifactPaths::new(output, &metrics.timestamp);

    tracing::info!(path = %paths.model.display(), "Saving model");
    write_atomically(&paths.model, &encode_binary(model, "model")?)?;

    tracing::info!(path = %paths.scaler.display(), "Saving scaler");
    write_atomically(&paths.scaler, &encode_binary(scaler, "scaler")?)?;

    tracing::info!(path = %paths.metrics.display(), "Saving metrics");
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|e| PipelineError::Serialization(format!("failed to encode metrics: {}", e)))?;
    write_atomically(&paths.metrics, json.as_bytes())?;

    Ok(paths)
}

/// Reload a persisted model
pub fn load_model(path: &Path) -> Result<RandomForestClassifier> {
    decode_binary(path)
}

/// Reload a persisted scaler
pub fn load_scaler(path: &Path) -> Result<StandardScaler> {
    decode_binary(path)
}

/// Reload a persisted metrics document
pub fn load_metrics(path: &Path) -> Result<MetricsRecord> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        PipelineError::Serialization(format!("failed to decode {}: {}", path.display(), e))
    })
}

fn encode_binary<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| PipelineError::Serialization(format!("failed to encode {}: {}", what, e)))
}

fn decode_binary<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    bincode::deserialize(&bytes).map_err(|e| {
        PipelineError::Serialization(format!("failed to decode {}: {}", path.display(), e))
    })
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PipelineError::InvalidArgument(format!(
                "artifact path has no file name: {}",
                path.display()
            ))
        })?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    if let Err(e) = fs::write(&temp_path, bytes) {
        let _ = fs::remove_file(&temp_path);
        return Err(PipelineError::io(&temp_path, e));
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(PipelineError::io(path, e));
    }
    Ok(())
}
