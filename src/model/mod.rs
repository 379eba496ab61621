// src/model/mod.rs
// Fare regression model: artifact loading and inference

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::features::{derive_features, Feature, FeatureVector, FEATURE_COUNT};
use crate::trip::ValidatedTripRequest;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("No model artifacts found in {0}")]
    NoArtifacts(PathBuf),

    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode model artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model artifact has no coefficient for feature '{0}'")]
    MissingCoefficient(&'static str),

    #[error("Model artifact references unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("Model produced a non-finite prediction")]
    NonFinite,
}

/// Anything that maps a feature vector to a fare
pub trait FareModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    fn name(&self) -> &str;
}

/// On-disk form of a linear fare model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    #[serde(default)]
    pub name: Option<String>,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct LinearFareModel {
    name: String,
    intercept: f64,
    weights: [f64; FEATURE_COUNT],
}

impl LinearFareModel {
    pub fn from_artifact(
        name: impl Into<String>,
        artifact: LinearArtifact,
    ) -> Result<Self, ModelError> {
        if let Some(unknown) = artifact
            .coefficients
            .keys()
            .find(|key| Feature::from_name(key).is_none())
        {
            return Err(ModelError::UnknownFeature(unknown.clone()));
        }

        let mut weights = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            weights[feature.index()] = *artifact
                .coefficients
                .get(feature.name())
                .ok_or(ModelError::MissingCoefficient(feature.name()))?;
        }

        Ok(Self {
            name: artifact.name.unwrap_or_else(|| name.into()),
            intercept: artifact.intercept,
            weights,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: LinearArtifact =
            serde_json::from_str(&raw).map_err(|source| ModelError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_artifact(file_name, artifact)
    }
}

impl FareModel for LinearFareModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let value = self.intercept
            + self
                .weights
                .iter()
                .zip(features.values())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Pick the artifact whose file name sorts last. Modification time is ignored.
pub fn latest_artifact(models_dir: &Path) -> Result<PathBuf, ModelError> {
    let entries = std::fs::read_dir(models_dir).map_err(|source| ModelError::Io {
        path: models_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ModelError::Io {
            path: models_dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_file() {
            files.push(entry.path());
        }
    }

    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    files
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::NoArtifacts(models_dir.to_path_buf()))
}

/// Load the latest model from a directory. Failure here is fatal for the process.
pub fn load_latest(models_dir: &Path) -> Result<LinearFareModel, ModelError> {
    let path = latest_artifact(models_dir)?;
    let model = LinearFareModel::load(&path)?;
    info!("Loaded fare model '{}' from {}", model.name(), path.display());
    Ok(model)
}

/// Round to two decimals, exact halves going to the even cent.
pub fn round_fare(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Rounded fare ready to show to a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FarePrediction(pub f64);

impl FarePrediction {
    pub fn amount(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FarePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Features plus the model, shared process-wide
#[derive(Clone)]
pub struct FarePredictor {
    model: Arc<dyn FareModel>,
}

impl FarePredictor {
    pub fn new(model: Arc<dyn FareModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn estimate(&self, trip: &ValidatedTripRequest) -> Result<FarePrediction, ModelError> {
        let features = derive_features(trip);
        self.estimate_features(&features)
    }

    pub fn estimate_features(
        &self,
        features: &FeatureVector,
    ) -> Result<FarePrediction, ModelError> {
        let raw = self.model.predict(features)?;
        debug!(raw, distance_km = features.distance_km(), "Fare predicted");
        Ok(FarePrediction(round_fare(raw)))
    }
}
