//! Command line interface definition

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// drs - client for GA4GH Data Repository Service servers
#[derive(Parser)]
#[command(name = "drs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for GA4GH Data Repository Service servers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Args)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print nothing but errors; metadata is not echoed to stdout
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Output logs and the download summary in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Get the metadata of a DRS object and optionally download its bytes
    Get(GetArgs),

    /// List the URL schemes and checksum algorithms this client supports
    Schemes,
}

#[derive(Args)]
pub struct GetArgs {
    /// Base URL of the DRS server (http or https)
    pub url: String,

    /// Id of the object or bundle
    pub object_id: String,

    /// Ask the server to inline the contents of nested bundles
    #[arg(long)]
    pub expand: bool,

    /// Download the object, or every object under a bundle
    #[arg(short, long)]
    pub download: bool,

    /// Directory downloaded files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the metadata JSON to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output_metadata: Option<PathBuf>,

    /// Write the download report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Number of parallel downloads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Bearer token sent with every request
    #[arg(long, value_name = "TOKEN")]
    pub authtoken: Option<String>,

    /// Only verify this checksum algorithm (sha-256, sha-512, md5)
    #[arg(long, value_name = "ALG")]
    pub checksum: Option<String>,

    /// Do not verify TLS certificates
    #[arg(long)]
    pub suppress_ssl_verify: bool,
}
