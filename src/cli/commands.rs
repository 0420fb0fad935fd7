//! Command implementations for the rewear CLI.

use std::net::SocketAddr;

use tracing::{info, warn};

use crate::artifacts::ArtifactStore;
use crate::brands::BrandBucketTable;
use crate::cli::args::*;
use crate::error::{Result, RewearError};
use crate::features::FeatureProfile;
use crate::forest::ForestConfig;
use crate::server;
use crate::train::{self, TrainerConfig, TrainingReport};

/// Execute a CLI command.
pub fn execute_command(args: RewearArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => run_train(train_args.clone(), &args),
        Command::ServeApi(serve_args) => run_serve_api(serve_args.clone(), &args),
        Command::ServeWeb(serve_args) => run_serve_web(serve_args.clone(), &args),
    }
}

/// Train the classifier and print the training report.
fn run_train(args: TrainArgs, cli_args: &RewearArgs) -> Result<()> {
    let config = TrainerConfig {
        data_path: args.data,
        output_dir: args.output,
        profile: args.profile,
        forest: ForestConfig {
            n_trees: args.trees,
            max_depth: args.max_depth,
            min_samples_split: args.min_samples_split,
            min_samples_leaf: args.min_samples_leaf,
            seed: args.seed,
        },
        test_fraction: args.test_fraction,
        seed: args.seed,
    };

    let report = train::train(&config)?;
    output_report(&report, cli_args)
}

/// Print a training report in the requested format.
fn output_report(report: &TrainingReport, args: &RewearArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("Training complete");
                println!("-----------------");
            }
            println!(
                "rows: {} (train {}, test {})",
                report.rows, report.train_rows, report.test_rows
            );
            println!("profile: {}", report.profile);
            println!("classes: {}", report.classes.join(", "));
            println!("accuracy: {:.4}", report.accuracy);
            println!("elapsed: {}ms", report.elapsed_ms);
            println!("artifacts: {}", report.output_dir);
        }
    }
    Ok(())
}

/// Run the api server variant.
fn run_serve_api(args: ServeApiArgs, _cli_args: &RewearArgs) -> Result<()> {
    let store = ArtifactStore::new(args.artifacts);
    let state = server::load_state(&store, FeatureProfile::Api, BrandBucketTable::empty());
    let addr = bind_addr(&args.host, args.port)?;
    run_server(server::api::router(state), addr)
}

/// Run the web server variant, building the brand bucket table first.
fn run_serve_web(args: ServeWebArgs, _cli_args: &RewearArgs) -> Result<()> {
    let buckets = match &args.catalog {
        Some(path) => match BrandBucketTable::from_catalog_csv(path) {
            Ok(table) => {
                info!(brands = table.brand_count(), "brand buckets built");
                table
            }
            Err(err) => {
                warn!(error = %err, "failed to build brand buckets; tier resolution disabled");
                BrandBucketTable::empty()
            }
        },
        None => {
            warn!("no catalog given; tier resolution disabled");
            BrandBucketTable::empty()
        }
    };

    let store = ArtifactStore::new(args.artifacts);
    let state = server::load_state(&store, FeatureProfile::Web, buckets);
    let addr = bind_addr(&args.host, args.port)?;
    run_server(server::web::router(state), addr)
}

fn bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}").parse().map_err(|_| {
        RewearError::invalid_argument(format!("invalid listen address {host}:{port}"))
    })
}

/// Drive an async server from the synchronous CLI.
fn run_server(router: axum::Router, addr: SocketAddr) -> Result<()> {
    tokio::runtime::Runtime::new()?.block_on(server::serve(router, addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        assert_eq!(
            bind_addr("127.0.0.1", 8000).unwrap(),
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert!(bind_addr("not a host", 8000).is_err());
    }
}
