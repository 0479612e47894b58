/// # Media Directory Server
///
/// A lightweight HTTP server that exposes a local directory tree with
/// browsable listings, JSON metadata endpoints, forced downloads and
/// range-aware byte streaming for media playback.
///
/// This library contains the core logic for the server. The `run` function
/// initializes and starts the server based on command-line arguments.
pub mod api;
pub mod cli;
pub mod error;
pub mod fs;
pub mod http;
pub mod meta;
pub mod range;
pub mod resolve;
pub mod response;
pub mod server;
pub mod stream;
pub mod utils;


use crate::cli::Cli;
use clap::Parser;
use log::error;

/// Initializes the logger, parses command-line arguments, and starts the
/// server. If the server returns an error, it is logged and the process
/// exits.
pub fn run() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.detailed_logging {
        "info"
    } else {
        "warn"
    };

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::debug!("Log level set to: {log_level}");

    if let Err(e) = server::run_server(cli, None, None) {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
