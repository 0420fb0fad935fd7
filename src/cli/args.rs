//! Command line argument parsing for the rewear CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::features::FeatureProfile;

/// rewear - train and serve a clothing usability classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "rewear")]
#[command(about = "Train and serve a clothing usability classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RewearArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format for command results
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RewearArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Output format for command results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train the classifier and persist its artifacts
    Train(TrainArgs),

    /// Serve predictions (api variant: explicit brand + wear frequency)
    #[command(name = "serve-api")]
    ServeApi(ServeApiArgs),

    /// Serve predictions (web variant: brand or brand tier)
    #[command(name = "serve-web")]
    ServeWeb(ServeWebArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Path to the training CSV
    #[arg(short, long, value_name = "CSV_FILE")]
    pub data: PathBuf,

    /// Directory to write the artifacts into
    #[arg(short, long, value_name = "DIR", default_value = "./artifacts")]
    pub output: PathBuf,

    /// Feature profile to train (api, web, or full)
    #[arg(long, default_value = "api", value_parser = parse_profile)]
    pub profile: FeatureProfile,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    /// Maximum depth of each tree
    #[arg(long, default_value_t = 15)]
    pub max_depth: usize,

    /// Minimum samples required to split a node
    #[arg(long, default_value_t = 5)]
    pub min_samples_split: usize,

    /// Minimum samples required in each leaf
    #[arg(long, default_value_t = 2)]
    pub min_samples_leaf: usize,

    /// Fraction of rows held out for accuracy measurement
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for sampling and splitting
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Arguments for the api server variant
#[derive(Parser, Debug, Clone)]
pub struct ServeApiArgs {
    /// Directory containing the trained artifacts
    #[arg(short, long, value_name = "DIR", default_value = "./artifacts")]
    pub artifacts: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,
}

/// Arguments for the web server variant
#[derive(Parser, Debug, Clone)]
pub struct ServeWebArgs {
    /// Directory containing the trained artifacts
    #[arg(short, long, value_name = "DIR", default_value = "./artifacts")]
    pub artifacts: PathBuf,

    /// Catalog CSV used to build the brand bucket table
    #[arg(long, value_name = "CSV_FILE")]
    pub catalog: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (also read from the PORT environment variable)
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

fn parse_profile(s: &str) -> Result<FeatureProfile, String> {
    s.parse().map_err(|e: crate::error::RewearError| e.to_string())
}
