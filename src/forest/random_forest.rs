//! Random forest classifier over the fixed-order feature vector.
//!
//! An ensemble of CART trees, each fitted on a bootstrap sample with
//! sqrt-feature subsetting per split. Tree seeds are derived from the
//! forest seed and the tree index, so fitting is deterministic even
//! though trees are grown in parallel. Consumers only see the
//! `predict` / `predict_proba` contract.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::artifacts::{read_json, write_json};
use crate::error::{Result, RewearError};
use crate::features::FeatureProfile;
use crate::forest::tree::{DecisionTree, TreeParams};

/// Minimum rows required to fit a forest.
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples required in each child of a split.
    pub min_samples_leaf: usize,
    /// Seed for bootstrap sampling and feature subsetting.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 100,
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Metadata stamped onto a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier.
    pub name: String,
    /// Artifact format version.
    pub version: String,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Feature profile the model was trained with.
    pub profile: FeatureProfile,
    /// Ordered feature names, matching the profile.
    pub feature_names: Vec<String>,
    /// Number of target classes.
    pub n_classes: usize,
    /// Hyperparameters used for training.
    pub hyperparameters: HashMap<String, f64>,
    /// Metrics measured on the held-out split.
    pub validation_metrics: HashMap<String, f64>,
}

/// An ensemble of decision trees; immutable once fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    config: ForestConfig,
    metadata: Option<ModelMetadata>,
}

impl RandomForestClassifier {
    /// Create an untrained forest with the given hyperparameters.
    pub fn new(config: ForestConfig) -> Self {
        RandomForestClassifier {
            trees: Vec::new(),
            config,
            metadata: None,
        }
    }

    /// Fit the forest on encoded rows.
    ///
    /// Rows must match the arity of `profile` and every label must be
    /// below `n_classes`.
    pub fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        profile: FeatureProfile,
    ) -> Result<()> {
        if x.len() != y.len() {
            return Err(RewearError::invalid_argument(format!(
                "feature rows ({}) and labels ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if x.len() < MIN_TRAINING_SAMPLES {
            return Err(RewearError::InsufficientTrainingData {
                min_samples: MIN_TRAINING_SAMPLES,
                actual: x.len(),
            });
        }

        let arity = profile.arity();
        if let Some(row) = x.iter().find(|row| row.len() != arity) {
            return Err(RewearError::InvalidFeatureVector {
                expected: arity,
                actual: row.len(),
            });
        }
        if n_classes == 0 {
            return Err(RewearError::invalid_argument("n_classes must be positive"));
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(RewearError::invalid_argument(format!(
                "label {label} out of range for {n_classes} classes"
            )));
        }

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: sqrt_features(arity),
        };

        let n = x.len();
        let seed = self.config.seed;
        self.trees = (0..self.config.n_trees)
            .into_par_iter()
            .map(|t| {
                // Per-tree seed: deterministic regardless of scheduling.
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                let bx: Vec<Vec<f64>> = sample.iter().map(|&i| x[i].clone()).collect();
                let by: Vec<usize> = sample.iter().map(|&i| y[i]).collect();
                DecisionTree::fit(&bx, &by, n_classes, &params, &mut rng)
            })
            .collect();

        self.metadata = Some(ModelMetadata {
            name: "RandomForestClassifier".to_string(),
            version: "1.0".to_string(),
            trained_at: Utc::now(),
            training_examples: n,
            profile,
            feature_names: profile
                .feature_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            n_classes,
            hyperparameters: HashMap::from([
                ("n_trees".to_string(), self.config.n_trees as f64),
                ("max_depth".to_string(), self.config.max_depth as f64),
                (
                    "min_samples_split".to_string(),
                    self.config.min_samples_split as f64,
                ),
                (
                    "min_samples_leaf".to_string(),
                    self.config.min_samples_leaf as f64,
                ),
                ("max_features".to_string(), params.max_features as f64),
                ("seed".to_string(), self.config.seed as f64),
            ]),
            validation_metrics: HashMap::new(),
        });

        Ok(())
    }

    /// Whether the forest has been fitted.
    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Metadata of the fitted model, if trained.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Hyperparameters the forest was constructed with.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Record a metric measured on held-out data.
    pub fn set_validation_metric(&mut self, name: &str, value: f64) -> Result<()> {
        let meta = self.metadata.as_mut().ok_or(RewearError::ModelNotTrained)?;
        meta.validation_metrics.insert(name.to_string(), value);
        Ok(())
    }

    /// Probability distribution over classes for one feature vector.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let meta = self.metadata.as_ref().ok_or(RewearError::ModelNotTrained)?;
        if self.trees.is_empty() {
            return Err(RewearError::ModelNotTrained);
        }
        if features.len() != meta.feature_names.len() {
            return Err(RewearError::InvalidFeatureVector {
                expected: meta.feature_names.len(),
                actual: features.len(),
            });
        }

        let mut acc = vec![0.0f64; meta.n_classes];
        for tree in &self.trees {
            for (slot, p) in acc.iter_mut().zip(tree.predict_proba(features)) {
                *slot += p;
            }
        }
        let count = self.trees.len() as f64;
        for slot in &mut acc {
            *slot /= count;
        }
        Ok(acc)
    }

    /// Predicted class code (argmax of the probability distribution,
    /// first class wins ties).
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (class, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Save the model to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Load a model from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }
}

/// sqrt(n_features), rounded, at least 1.
fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().round() as usize).max(1)
}
