//! Random forest classification.
//!
//! The classifier is an ensemble of CART decision trees over the
//! fixed-order numeric feature vector, fitted once by the training
//! pipeline and consumed by servers through the `predict` /
//! `predict_proba` contract only.

pub mod random_forest;
pub mod tree;

pub use random_forest::{ForestConfig, ModelMetadata, RandomForestClassifier, MIN_TRAINING_SAMPLES};
pub use tree::{DecisionTree, TreeParams};
