//! # rewear
//!
//! Usability classification for sustainable fashion items.
//!
//! ## Features
//!
//! - CSV-backed training of a random-forest usability classifier
//! - Label encoding with exact-then-normalized lookup
//! - JSON artifact persistence (one model, nine encoders)
//! - Brand-tier bucketing by price quartiles
//! - Two HTTP prediction server variants on axum

pub mod artifacts;
pub mod brands;
pub mod cli;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod features;
pub mod forest;
pub mod server;
pub mod train;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
