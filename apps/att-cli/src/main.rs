//! `att`: archives transfer tool.
//!
//! Copies submissions from the Dropbox intake folder to the NAS, verifying
//! every file against Dropbox's content hash and leaving a manifest and a
//! metadata sidecar next to it.
//!
//! # Usage
//!
//! ```text
//! att check                                         # both stores reachable?
//! att single-file-copy --remote-file A1/report.zip  # one file
//! att bulk-file-copy --remote-csv A1/files.csv      # every file in a list
//! att -v --overwrite single-file-copy --remote-file A1/report.zip
//! ```

mod app;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "att", version, about = "Validated archive transfers from Dropbox to the NAS")]
struct Cli {
    /// Log every pipeline step.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Replace files (and their sidecars) that already exist on the NAS.
    #[arg(long, visible_alias = "ow", global = true)]
    overwrite: bool,

    /// Path to a TOML config file. Environment variables take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify that Dropbox and the NAS are reachable.
    Check,

    /// Copy one file.
    SingleFileCopy {
        /// File to copy, relative to the Dropbox folder (`folder/name.ext`).
        #[arg(long)]
        remote_file: String,
    },

    /// Copy every file named in a CSV list.
    ///
    /// The first column holds file names relative to the list's folder;
    /// remaining columns are recorded in each file's manifest.
    BulkFileCopy {
        /// CSV list, relative to the Dropbox folder (`folder/list.csv`).
        #[arg(long)]
        remote_csv: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting att");

    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(
        workspace = ?config.workspace,
        remote = %config.dropbox_folder,
        local = %config.nas_folder,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let ok = rt.block_on(app::run(cli.command, config, cli.overwrite))?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
