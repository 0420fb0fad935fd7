//! Offline training pipeline.
//!
//! One-shot batch job: load the dataset, fit the encoders and the
//! forest, measure held-out accuracy, persist the artifacts. No
//! concurrency beyond the forest's own parallel tree fitting.

use std::path::PathBuf;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;
use crate::dataset::Dataset;
use crate::encoding::LabelEncoder;
use crate::error::{Result, RewearError};
use crate::features::{EncoderSet, FeatureProfile};
use crate::forest::{ForestConfig, RandomForestClassifier};

/// Configuration of one training run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Path of the training CSV.
    pub data_path: PathBuf,
    /// Directory the artifacts are written to.
    pub output_dir: PathBuf,
    /// Feature profile to train with.
    pub profile: FeatureProfile,
    /// Forest hyperparameters.
    pub forest: ForestConfig,
    /// Fraction of rows held out for accuracy measurement.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub seed: u64,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Total dataset rows.
    pub rows: usize,
    /// Rows used for fitting.
    pub train_rows: usize,
    /// Rows held out for evaluation.
    pub test_rows: usize,
    /// Accuracy on the held-out rows.
    pub accuracy: f64,
    /// Target classes, in code order.
    pub classes: Vec<String>,
    /// Feature profile trained.
    pub profile: FeatureProfile,
    /// Wall-clock training time.
    pub elapsed_ms: u64,
    /// Directory the artifacts were written to.
    pub output_dir: String,
}

/// Run a full training pass and persist the artifacts.
pub fn train(config: &TrainerConfig) -> Result<TrainingReport> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(RewearError::invalid_argument(format!(
            "test fraction must be in [0, 1), got {}",
            config.test_fraction
        )));
    }

    let start = Instant::now();

    let dataset = Dataset::load_csv(&config.data_path)?;
    info!(rows = dataset.len(), path = %config.data_path.display(), "dataset loaded");

    let records = dataset.records();
    let encoders = EncoderSet::fit(records)?;
    let target = LabelEncoder::fit(
        "usability_class",
        records.iter().map(|r| r.usability_class.as_str()),
    )?;

    let mut x: Vec<Vec<f64>> = Vec::with_capacity(records.len());
    let mut y: Vec<usize> = Vec::with_capacity(records.len());
    for record in records {
        x.push(encoders.feature_vector(record, config.profile)?);
        y.push(target.encode(&record.usability_class)?);
    }

    let (train_idx, test_idx) = split_indices(records.len(), config.test_fraction, config.seed);
    debug!(
        train = train_idx.len(),
        test = test_idx.len(),
        "train/test split"
    );

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();

    let mut model = RandomForestClassifier::new(config.forest.clone());
    model.fit(&x_train, &y_train, target.len(), config.profile)?;

    let accuracy = if test_idx.is_empty() {
        f64::NAN
    } else {
        let mut correct = 0usize;
        for &i in &test_idx {
            if model.predict(&x[i])? == y[i] {
                correct += 1;
            }
        }
        correct as f64 / test_idx.len() as f64
    };
    if accuracy.is_finite() {
        model.set_validation_metric("accuracy", accuracy)?;
    }
    info!(accuracy, trees = config.forest.n_trees, "forest fitted");

    let store = ArtifactStore::new(&config.output_dir);
    store.save(&model, &encoders, &target)?;
    info!(dir = %store.dir().display(), "artifacts written");

    Ok(TrainingReport {
        rows: records.len(),
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        accuracy,
        classes: target.classes().to_vec(),
        profile: config.profile,
        elapsed_ms: start.elapsed().as_millis() as u64,
        output_dir: store.dir().display().to_string(),
    })
}

/// Seeded shuffle of `0..n`, split into (train, test) index lists.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // At least one training row; the test split may be empty.
    let test_len = ((n as f64) * test_fraction).round() as usize;
    let test_len = test_len.min(n.saturating_sub(1));

    let train = indices[test_len..].to_vec();
    let test = indices[..test_len].to_vec();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_indices_partitions() {
        let (train, test) = split_indices(50, 0.2, 42);
        assert_eq!(train.len(), 40);
        assert_eq!(test.len(), 10);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seed_deterministic() {
        assert_eq!(split_indices(30, 0.2, 7), split_indices(30, 0.2, 7));
        assert_ne!(split_indices(30, 0.2, 7).0, split_indices(30, 0.2, 8).0);
    }

    #[test]
    fn test_split_keeps_at_least_one_training_row() {
        let (train, test) = split_indices(2, 0.9, 1);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn test_invalid_test_fraction() {
        let config = TrainerConfig {
            data_path: PathBuf::from("unused.csv"),
            output_dir: PathBuf::from("unused"),
            profile: FeatureProfile::Api,
            forest: ForestConfig::default(),
            test_fraction: 1.5,
            seed: 42,
        };
        assert!(matches!(
            train(&config),
            Err(RewearError::InvalidArgument(_))
        ));
    }
}
