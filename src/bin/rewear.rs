//! rewear CLI binary.

use std::process;

use clap::Parser;
use tracing::Level;

use rewear::cli::args::RewearArgs;
use rewear::cli::commands::execute_command;

fn main() {
    // Parse command line arguments using clap
    let args = RewearArgs::parse();

    // Map verbosity onto a tracing level
    let level = match args.verbosity() {
        0 => Level::ERROR, // Quiet mode
        1 => Level::INFO,  // Default
        2 => Level::DEBUG, // Verbose
        _ => Level::TRACE, // Very verbose (3+)
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
