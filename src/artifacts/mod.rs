//! Model and scaler artifacts loaded once at startup.
//!
//! A missing or unreadable artifact never stops the server: the slot is
//! left empty and the prediction handler reports it per request.

pub mod native;
pub mod onnx;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use tracing::{error, info, warn};

use crate::config::ApiConfig;
use crate::error::{ArtifactError, ArtifactResult};
use crate::models::FEATURE_COUNT;

/// Label and optional `[negative, positive]` class probabilities for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: i64,
    pub probabilities: Option<[f32; 2]>,
}

/// A trained binary classifier over `1 x FEATURE_COUNT` matrices.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &Array2<f32>) -> ArtifactResult<i64>;

    /// `Ok(None)` when the model cannot produce class probabilities.
    fn predict_proba(&self, _features: &Array2<f32>) -> ArtifactResult<Option<[f32; 2]>> {
        Ok(None)
    }

    fn classify(&self, features: &Array2<f32>) -> ArtifactResult<Classification> {
        Ok(Classification {
            label: self.predict(features)?,
            probabilities: self.predict_proba(features)?,
        })
    }
}

/// Feature normalization applied before prediction.
pub trait Transformer: Send + Sync {
    fn transform(&self, features: &Array2<f32>) -> ArtifactResult<Array2<f32>>;
}

/// Process-wide artifacts. Built once in `main` and shared read-only.
#[derive(Clone)]
pub struct Artifacts {
    model: Option<Arc<dyn Predictor>>,
    scaler: Option<Arc<dyn Transformer>>,
    model_path: PathBuf,
    model_name: String,
}

impl Artifacts {
    pub fn new(
        model: Option<Arc<dyn Predictor>>,
        scaler: Option<Arc<dyn Transformer>>,
        model_path: impl Into<PathBuf>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            model,
            scaler,
            model_path: model_path.into(),
            model_name: model_name.into(),
        }
    }

    /// Loads both artifacts from the configured paths, logging every outcome.
    pub fn load(config: &ApiConfig) -> Self {
        let model = load_slot(
            &config.model_path,
            "model",
            "predictions will be unavailable until a model is provided",
            load_predictor,
        );
        let scaler = load_slot(
            &config.scaler_path,
            "scaler",
            "input will not be scaled",
            load_transformer,
        );
        Self::new(model, scaler, config.model_path.clone(), config.model_name.clone())
    }

    pub fn model(&self) -> Option<&Arc<dyn Predictor>> {
        self.model.as_ref()
    }

    pub fn scaler(&self) -> Option<&Arc<dyn Transformer>> {
        self.scaler.as_ref()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifacts")
            .field("model_loaded", &self.model.is_some())
            .field("scaler_loaded", &self.scaler.is_some())
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Onnx,
    Json,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> ArtifactResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("onnx") => Ok(Self::Onnx),
            Some("json") => Ok(Self::Json),
            _ => Err(ArtifactError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

pub fn load_predictor(path: &Path) -> ArtifactResult<Arc<dyn Predictor>> {
    Ok(match ArtifactFormat::from_path(path)? {
        ArtifactFormat::Onnx => Arc::new(onnx::OnnxClassifier::load(path)?),
        ArtifactFormat::Json => Arc::new(native::NativeModel::load(path)?),
    })
}

pub fn load_transformer(path: &Path) -> ArtifactResult<Arc<dyn Transformer>> {
    Ok(match ArtifactFormat::from_path(path)? {
        ArtifactFormat::Onnx => Arc::new(onnx::OnnxScaler::load(path)?),
        ArtifactFormat::Json => Arc::new(native::NativeScaler::load(path)?),
    })
}

fn load_slot<T: ?Sized>(
    path: &Path,
    kind: &str,
    when_missing: &str,
    loader: fn(&Path) -> ArtifactResult<Arc<T>>,
) -> Option<Arc<T>> {
    match std::fs::metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "{kind} not found - {when_missing}");
            return None;
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to stat {kind} artifact");
            return None;
        }
        Ok(_) => {}
    }

    match loader(path) {
        Ok(artifact) => {
            info!(path = %path.display(), "loaded {kind}");
            Some(artifact)
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load {kind}");
            None
        }
    }
}

/// Rejects matrices that are not a single `1 x FEATURE_COUNT` row.
pub(crate) fn check_shape(features: &Array2<f32>) -> ArtifactResult<()> {
    let (rows, cols) = features.dim();
    if rows != 1 {
        return Err(ArtifactError::Invalid(format!(
            "expected a single input row, got {rows}"
        )));
    }
    if cols != FEATURE_COUNT {
        return Err(ArtifactError::Shape {
            expected: FEATURE_COUNT,
            actual: cols,
        });
    }
    Ok(())
}
