use clap::Parser;
use std::path::PathBuf;

/// Command-line interface for the media directory server.
#[derive(Parser)]
#[command(
    version,
    about = "Serves a directory tree over HTTP with browsable listings, a JSON API and range-aware media streaming.",
    long_about = "Serves a directory tree over HTTP.\n\
        Directories render as browsable listings; files stream with Range support for\n\
        resumable downloads and media playback. /api/ endpoints expose directory and\n\
        file metadata as JSON, /download/ forces attachment downloads (finding bare\n\
        filenames anywhere in the tree) and /play/ redirects to a file's direct URL.\n\
        All served paths are confined to the configured directory."
)]
pub struct Cli {
    /// Directory path to serve, mandatory
    #[arg(short, long, required = true)]
    pub directory: PathBuf,

    /// Host address to listen on (e.g. "127.0.0.1" for local, "0.0.0.0" for the whole network)
    #[arg(short, long, default_value = "127.0.0.1")]
    pub listen: String,

    /// Port number to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Number of threads in the thread pool
    #[arg(short, long, default_value_t = 8)]
    pub threads: usize,

    /// Enable verbose logging for debugging (log level: debug)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Enable more detailed logging (log level: info)
    #[arg(long, default_value_t = false)]
    pub detailed_logging: bool,
}
