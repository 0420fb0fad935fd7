//! Artifact persistence.
//!
//! A training run writes one classifier artifact (`model.json`) and nine
//! encoder artifacts (`le_<field>.json`, eight features plus the target)
//! into a directory. Loading distinguishes a *missing* file from a
//! *corrupt* one, so a serving process can log which case kept the model
//! from loading instead of swallowing both.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::encoding::LabelEncoder;
use crate::error::{Result, RewearError};
use crate::features::EncoderSet;
use crate::forest::RandomForestClassifier;

/// File name of the classifier artifact.
pub const MODEL_FILE: &str = "model.json";

/// Field name of the target encoder.
const TARGET_FIELD: &str = "usability_class";

/// Serialize a value to pretty JSON at `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Deserialize a value from JSON at `path`, tagging the failure mode.
///
/// A file that does not exist maps to [`RewearError::ArtifactMissing`];
/// a file that exists but cannot be decoded maps to
/// [`RewearError::ArtifactCorrupt`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            RewearError::ArtifactMissing {
                path: path.display().to_string(),
            }
        } else {
            RewearError::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|e| RewearError::ArtifactCorrupt {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

/// Everything a serving process needs in memory: the classifier, the
/// feature encoders, and the target encoder.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: RandomForestClassifier,
    pub encoders: EncoderSet,
    pub target: LabelEncoder,
}

/// A directory holding one training run's artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`. The directory is created lazily
    /// on save.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    /// The store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the classifier artifact.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    /// Path of the encoder artifact for `field`.
    pub fn encoder_path(&self, field: &str) -> PathBuf {
        self.dir.join(format!("le_{field}.json"))
    }

    /// Persist a full training run: the model plus all nine encoders.
    pub fn save(
        &self,
        model: &RandomForestClassifier,
        encoders: &EncoderSet,
        target: &LabelEncoder,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        model.save(&self.model_path())?;
        for encoder in encoders.all() {
            encoder.save(&self.encoder_path(encoder.field()))?;
        }
        target.save(&self.encoder_path(TARGET_FIELD))?;

        Ok(())
    }

    /// Load the model and all nine encoders.
    ///
    /// The first missing or corrupt artifact aborts the load with its
    /// tagged error; the caller decides whether that is fatal.
    pub fn load(&self) -> Result<ArtifactBundle> {
        let model = RandomForestClassifier::load(&self.model_path())?;

        let encoders = EncoderSet {
            category: LabelEncoder::load(&self.encoder_path("category"))?,
            material: LabelEncoder::load(&self.encoder_path("material"))?,
            brand: LabelEncoder::load(&self.encoder_path("brand"))?,
            condition: LabelEncoder::load(&self.encoder_path("condition"))?,
            seasonality: LabelEncoder::load(&self.encoder_path("seasonality"))?,
            certifications: LabelEncoder::load(&self.encoder_path("certifications"))?,
            eco_friendly_manufacturing: LabelEncoder::load(
                &self.encoder_path("eco_friendly_manufacturing"),
            )?,
            recycling_programs: LabelEncoder::load(&self.encoder_path("recycling_programs"))?,
        };

        let target = LabelEncoder::load(&self.encoder_path(TARGET_FIELD))?;

        Ok(ArtifactBundle {
            model,
            encoders,
            target,
        })
    }
}
