//! Pre-trained model artifacts.
//!
//! Artifacts are produced elsewhere and exported as JSON. Each one is read and
//! validated once at startup, then used read-only for the life of the process.
//! Structural problems (wrong column names, mismatched widths, broken trees)
//! surface here as `ModelError` instead of as wrong answers later.

pub mod classifier;
pub mod kmeans;
pub mod pca;
pub mod scaler;
pub mod segmenter;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use classifier::{ClassifierSummary, FlopClassifier, FlopPrediction};
pub use kmeans::CentroidModel;
pub use pca::Projector;
pub use scaler::Scaler;
pub use segmenter::{PipelineSummary, SegmentAssignment, SegmentPipeline};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read {artifact} artifact {path}: {source}")]
    Io {
        artifact: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {artifact} artifact: {source}")]
    Parse {
        artifact: &'static str,
        source: serde_json::Error,
    },
    #[error("{artifact} artifact column mismatch: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        artifact: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("{artifact} artifact shape error: {message}")]
    Shape {
        artifact: &'static str,
        message: String,
    },
    #[error("{artifact} artifact has an invalid value: {message}")]
    InvalidValue {
        artifact: &'static str,
        message: String,
    },
    #[error("Centroid model has {found} clusters but {expected} segments are defined")]
    SegmentCount { expected: usize, found: usize },
    #[error("Cluster id {0} has no segment")]
    UnknownCluster(usize),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A JSON-exported model artifact with its own structural checks.
pub trait Artifact: DeserializeOwned {
    /// Human-readable artifact name used in errors and logs.
    const NAME: &'static str;

    fn validate(&self) -> Result<()>;

    fn from_json(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json).map_err(|source| ModelError::Parse {
            artifact: Self::NAME,
            source,
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            artifact: Self::NAME,
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_json(&json)?;
        log::debug!("Loaded {} artifact from {}", Self::NAME, path.display());
        Ok(artifact)
    }
}

/// File names of the four artifacts inside the models directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactFiles {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
    pub projector: PathBuf,
    pub centroids: PathBuf,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            classifier: PathBuf::from("spotify_flop_classifier.json"),
            scaler: PathBuf::from("scaler.json"),
            projector: PathBuf::from("pca.json"),
            centroids: PathBuf::from("kmeans.json"),
        }
    }
}

/// Every loaded model, shared read-only by all analyses.
#[derive(Debug)]
pub struct ModelSet {
    pub classifier: FlopClassifier,
    pub segmenter: SegmentPipeline,
}

impl ModelSet {
    /// Load all artifacts from `dir`. Relative file names resolve against `dir`.
    pub fn load(dir: &Path, files: &ArtifactFiles) -> Result<Self> {
        let classifier = FlopClassifier::load(&dir.join(&files.classifier))?;
        let scaler = Scaler::load(&dir.join(&files.scaler))?;
        let projector = Projector::load(&dir.join(&files.projector))?;
        let centroids = CentroidModel::load(&dir.join(&files.centroids))?;
        let segmenter = SegmentPipeline::new(scaler, projector, centroids)?;

        log::info!("Models loaded from {}", dir.display());
        log::info!("  {}", classifier.describe());
        log::info!("  {}", segmenter.describe());

        Ok(Self {
            classifier,
            segmenter,
        })
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            classifier: self.classifier.summary(),
            segmenter: self.segmenter.summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub classifier: ClassifierSummary,
    pub segmenter: PipelineSummary,
}

pub(crate) fn check_finite(artifact: &'static str, what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ModelError::InvalidValue {
            artifact,
            message: format!("{}[{}] is not finite", what, i),
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_columns(artifact: &'static str, expected: &[&str], found: &[String]) -> Result<()> {
    if found.len() == expected.len() && found.iter().zip(expected).all(|(f, e)| f == e) {
        Ok(())
    } else {
        Err(ModelError::SchemaMismatch {
            artifact,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.to_vec(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const CLASSIFIER: &str = include_str!("../../testdata/models/spotify_flop_classifier.json");
    pub const SCALER: &str = include_str!("../../testdata/models/scaler.json");
    pub const PROJECTOR: &str = include_str!("../../testdata/models/pca.json");
    pub const CENTROIDS: &str = include_str!("../../testdata/models/kmeans.json");

    use super::*;

    pub fn model_set() -> ModelSet {
        ModelSet {
            classifier: FlopClassifier::from_json(CLASSIFIER).unwrap(),
            segmenter: SegmentPipeline::new(
                Scaler::from_json(SCALER).unwrap(),
                Projector::from_json(PROJECTOR).unwrap(),
                CentroidModel::from_json(CENTROIDS).unwrap(),
            )
            .unwrap(),
        }
    }
}
