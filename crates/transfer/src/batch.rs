//! Batch transfers over a bounded worker pool.
//!
//! Items are independent: one failure never stops the rest. Requests whose
//! local paths overlap (same target, or same stem and therefore the same
//! sidecars) are chained on one worker, in request order, so concurrent
//! writers never collide on a path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::TransferError;
use crate::orchestrator::TransferOrchestrator;
use crate::types::{BatchSummary, TransferOutcome, TransferRequest};

/// Runs many requests through one orchestrator.
pub struct BatchRunner {
    orchestrator: TransferOrchestrator,
    concurrency: usize,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// Creates a sequential runner.
    pub fn new(orchestrator: TransferOrchestrator) -> Self {
        Self {
            orchestrator,
            concurrency: 1,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the number of items processed at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Cancelling stops new items from launching; in-flight items finish.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every request and returns one outcome per request, in order.
    pub async fn run(&self, requests: Vec<TransferRequest>) -> BatchSummary {
        let total = requests.len();
        let requests = Arc::new(requests);
        let results: Arc<Mutex<Vec<Option<TransferOutcome>>>> =
            Arc::new(Mutex::new(vec![None; total]));
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for group in group_by_local_paths(&requests) {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let orchestrator = self.orchestrator.clone();
            let requests = Arc::clone(&requests);
            let results = Arc::clone(&results);
            let cancel = self.cancel.clone();

            workers.spawn(async move {
                let _permit = permit;
                for index in group {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let outcome = orchestrator.transfer(&requests[index]).await;
                    results.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(outcome);
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "transfer worker aborted");
            }
        }

        let reason_missing = if self.cancel.is_cancelled() {
            TransferError::Cancelled
        } else {
            TransferError::Aborted
        };
        let collected =
            std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
        let outcomes = collected
            .into_iter()
            .zip(requests.iter())
            .map(|(outcome, request)| {
                outcome.unwrap_or_else(|| {
                    TransferOutcome::failed(request, reason_missing.to_string())
                })
            })
            .collect();

        let summary = BatchSummary::from_outcomes(outcomes);
        info!(
            total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }
}

/// Groups request indices by manifest path, keeping first-appearance order.
///
/// Equal targets imply equal manifest paths, so one key covers both the
/// file and its sidecars.
fn group_by_local_paths(requests: &[TransferRequest]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_manifest: HashMap<PathBuf, usize> = HashMap::new();
    for (index, request) in requests.iter().enumerate() {
        let key = request.manifest_path();
        match by_manifest.get(&key) {
            Some(&group) => groups[group].push(index),
            None => {
                by_manifest.insert(key, groups.len());
                groups.push(vec![index]);
            }
        }
    }
    groups
}
