//! Command implementations.

use std::sync::Arc;

use anyhow::{Context, bail};
use att_local::{FsSink, LocalObjectSink};
use att_remote::{DirectorySource, DropboxSource, RemoteObjectSource, validate_remote_file};
use att_transfer::{
    BatchRunner, TransferEvent, TransferOptions, TransferOrchestrator, TransferOutcome,
    TransferRequest, TransferStatus, load_file_list,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::Commands;
use crate::config::{Config, Workspace};

/// Runs one command. Returns `Ok(false)` when any item or check failed.
pub async fn run(command: Commands, config: Config, overwrite: bool) -> anyhow::Result<bool> {
    let remote = connect_remote(&config).await?;
    let sink: Arc<dyn LocalObjectSink> = Arc::new(
        FsSink::new(config.nas_root()).require_top_folder(config.require_submission_folder),
    );

    match command {
        Commands::Check => Ok(check(remote.as_ref(), sink.as_ref()).await),
        Commands::SingleFileCopy { remote_file } => {
            preflight(remote.as_ref(), sink.as_ref()).await?;
            let orchestrator = orchestrator(remote, sink, &config, overwrite);
            single_file_copy(&orchestrator, &remote_file).await
        }
        Commands::BulkFileCopy { remote_csv } => {
            preflight(remote.as_ref(), sink.as_ref()).await?;
            bulk_file_copy(remote, sink, &config, overwrite, &remote_csv).await
        }
    }
}

async fn connect_remote(config: &Config) -> anyhow::Result<Arc<dyn RemoteObjectSource>> {
    match config.workspace {
        Workspace::Test => {
            info!(root = %config.dropbox_folder, "using local directory as remote store");
            Ok(Arc::new(
                DirectorySource::new(&config.dropbox_folder)
                    .with_metadata_name(&config.metadata_name),
            ))
        }
        Workspace::Prod | Workspace::Dev => {
            let token = config
                .dropbox_access_token
                .as_deref()
                .context("DROPBOX_ACCESS_TOKEN is not set")?;
            let mut source = DropboxSource::connect(token, &config.dropbox_folder)
                .await
                .context("connecting to Dropbox")?
                .with_metadata_name(&config.metadata_name);
            if let Some(team) = &config.expected_team {
                source = source.with_expected_team(team);
            }
            Ok(Arc::new(source))
        }
    }
}

fn orchestrator(
    remote: Arc<dyn RemoteObjectSource>,
    sink: Arc<dyn LocalObjectSink>,
    config: &Config,
    overwrite: bool,
) -> TransferOrchestrator {
    TransferOrchestrator::new(remote, sink, TransferOptions { overwrite })
        .with_metadata_name(&config.metadata_name)
}

/// Reports the reachability of both stores.
async fn check(remote: &dyn RemoteObjectSource, sink: &dyn LocalObjectSink) -> bool {
    let mut ok = true;
    match remote.check().await {
        Ok(desc) => println!("remote store: ok ({desc})"),
        Err(e) => {
            println!("remote store: unreachable ({e})");
            ok = false;
        }
    }
    match sink.check().await {
        Ok(desc) => println!("local store:  ok ({desc})"),
        Err(e) => {
            println!("local store:  unreachable ({e})");
            ok = false;
        }
    }
    ok
}

/// Aborts the run before any item is attempted if a store is unreachable.
async fn preflight(
    remote: &dyn RemoteObjectSource,
    sink: &dyn LocalObjectSink,
) -> anyhow::Result<()> {
    let desc = remote.check().await.context("remote store unreachable")?;
    debug!(remote = %desc, "remote store reachable");
    let desc = sink.check().await.context("local store unreachable")?;
    debug!(local = %desc, "local store reachable");
    Ok(())
}

async fn single_file_copy(
    orchestrator: &TransferOrchestrator,
    remote_file: &str,
) -> anyhow::Result<bool> {
    validate_remote_file(remote_file)?;
    let request = TransferRequest::for_archive(remote_file);
    let outcome = orchestrator.transfer(&request).await;
    println!("{}", format_outcome(&outcome));
    Ok(!outcome.status.is_failed())
}

async fn bulk_file_copy(
    remote: Arc<dyn RemoteObjectSource>,
    sink: Arc<dyn LocalObjectSink>,
    config: &Config,
    overwrite: bool,
    remote_csv: &str,
) -> anyhow::Result<bool> {
    validate_remote_file(remote_csv)?;
    let requests = load_file_list(remote.as_ref(), remote_csv)
        .await
        .with_context(|| format!("loading batch list {remote_csv}"))?;
    if requests.is_empty() {
        bail!("batch list {remote_csv} names no files");
    }
    let total = requests.len();
    info!(list = remote_csv, files = total, "starting batch");

    let (tx, rx) = mpsc::channel(64);
    let runner = BatchRunner::new(orchestrator(remote, sink, config, overwrite).with_events(tx))
        .with_concurrency(config.concurrency);
    let reporter = tokio::spawn(report_progress(rx, total));

    let cancel = runner.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight transfers");
            cancel.cancel();
        }
    });

    let summary = runner.run(requests).await;
    interrupt.abort();
    // Closes the event channel so the reporter drains and exits.
    drop(runner);
    if let Err(e) = reporter.await {
        warn!(error = %e, "progress reporter failed");
    }

    for outcome in summary.outcomes.iter().filter(|o| o.status.is_failed()) {
        println!("{}", format_outcome(outcome));
    }
    println!(
        "{} copied, {} skipped, {} failed ({} total)",
        summary.succeeded, summary.skipped, summary.failed, total
    );
    Ok(summary.all_succeeded())
}

/// Prints each outcome as it finishes.
async fn report_progress(mut rx: mpsc::Receiver<TransferEvent>, total: usize) {
    let mut done = 0;
    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Started { remote_path } => debug!(remote = %remote_path, "started"),
            TransferEvent::Finished { outcome } => {
                done += 1;
                println!("[{done}/{total}] {}", format_outcome(&outcome));
            }
        }
    }
}

/// One report line per file.
pub fn format_outcome(outcome: &TransferOutcome) -> String {
    match &outcome.status {
        TransferStatus::Success => {
            let digest = outcome
                .standard_digest
                .as_ref()
                .map(|d| format!(" {} {}", d.algorithm(), d.hex()))
                .unwrap_or_default();
            format!(
                "copied   {} -> {}{digest}",
                outcome.remote_path,
                outcome.local_path.display()
            )
        }
        TransferStatus::SkippedExisting => format!(
            "skipped  {} ({} already exists)",
            outcome.remote_path,
            outcome.local_path.display()
        ),
        TransferStatus::Failed { reason } => {
            format!("FAILED   {}: {reason}", outcome.remote_path)
        }
    }
}
