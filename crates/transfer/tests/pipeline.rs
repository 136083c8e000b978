//! End-to-end transfers between a directory-backed remote and a filesystem sink.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use att_checksum::{DigestAlgorithm, digest_bytes, digest_file};
use att_local::FsSink;
use att_remote::{ByteStream, DirectorySource, RemoteError, RemoteObjectHandle, RemoteObjectSource};
use att_transfer::{
    BatchRunner, Manifest, TransferEvent, TransferOptions, TransferOrchestrator, TransferRequest,
    TransferStatus,
};
use futures_util::future::BoxFuture;
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
const METADATA: &[u8] = b"<metadata><creator>Archives</creator></metadata>\n";

struct Fixture {
    remote_dir: TempDir,
    local_dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            remote_dir: tempfile::tempdir().unwrap(),
            local_dir: tempfile::tempdir().unwrap(),
        };
        fixture.put_remote("A1/default_metadata.xml", METADATA);
        fixture
    }

    fn put_remote(&self, path: &str, data: &[u8]) {
        let full = self.remote_dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, data).unwrap();
    }

    fn local(&self, path: &str) -> PathBuf {
        self.local_dir.path().join(path)
    }

    fn directory_source(&self) -> DirectorySource {
        DirectorySource::new(self.remote_dir.path())
    }

    fn orchestrator(&self, overwrite: bool) -> TransferOrchestrator {
        self.orchestrator_with(Arc::new(self.directory_source()), overwrite)
    }

    fn orchestrator_with(
        &self,
        remote: Arc<dyn RemoteObjectSource>,
        overwrite: bool,
    ) -> TransferOrchestrator {
        TransferOrchestrator::new(
            remote,
            Arc::new(FsSink::new(self.local_dir.path())),
            TransferOptions { overwrite },
        )
    }
}

fn report_request() -> TransferRequest {
    TransferRequest::new("A1/report.zip", "ATT")
}

fn failure_reason(status: &TransferStatus) -> &str {
    match status {
        TransferStatus::Failed { reason } => reason,
        other => panic!("expected failure, got {other:?}"),
    }
}

/// Wraps a directory source and tampers with what it reports or serves.
struct TamperedRemote {
    inner: DirectorySource,
    declared: Option<Option<String>>,
    fail_stream_after: Option<usize>,
}

impl TamperedRemote {
    fn declaring(inner: DirectorySource, declared: Option<&str>) -> Self {
        Self {
            inner,
            declared: Some(declared.map(String::from)),
            fail_stream_after: None,
        }
    }

    fn failing_after(inner: DirectorySource, bytes: usize) -> Self {
        Self {
            inner,
            declared: None,
            fail_stream_after: Some(bytes),
        }
    }
}

impl RemoteObjectSource for TamperedRemote {
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<RemoteObjectHandle, RemoteError>> {
        Box::pin(async move {
            let mut handle = self.inner.resolve(path).await?;
            if let Some(declared) = &self.declared {
                handle.declared_digest = declared.clone();
            }
            Ok(handle)
        })
    }

    fn open_stream<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        Box::pin(async move {
            let stream = self.inner.open_stream(path).await?;
            match self.fail_stream_after {
                Some(limit) => Ok(Box::pin(FailAfter {
                    inner: stream,
                    remaining: limit,
                }) as ByteStream),
                None => Ok(stream),
            }
        })
    }

    fn fetch_default_metadata<'a>(
        &'a self,
        folder: &'a str,
    ) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        self.inner.fetch_default_metadata(folder)
    }

    fn check(&self) -> BoxFuture<'_, Result<String, RemoteError>> {
        self.inner.check()
    }
}

/// Serves `remaining` bytes of the inner stream, then fails.
struct FailAfter {
    inner: ByteStream,
    remaining: usize,
}

impl AsyncRead for FailAfter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        let limit = self.remaining.min(buf.remaining());
        let mut limited = ReadBuf::new(buf.initialize_unfilled_to(limit));
        let poll = self.inner.as_mut().poll_read(cx, &mut limited);
        let n = limited.filled().len();
        if let Poll::Ready(Ok(())) = &poll {
            buf.advance(n);
            self.remaining -= n;
        }
        poll
    }
}

// ---------------------------------------------------------------------------
// Single-file protocol
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_writes_file_metadata_and_manifest() {
    let fx = Fixture::new();
    let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    fx.put_remote("A1/report.zip", &payload);

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert_eq!(outcome.status, TransferStatus::Success);
    assert_eq!(outcome.local_path, PathBuf::from("ATT/report.zip"));
    assert_eq!(std::fs::read(fx.local("ATT/report.zip")).unwrap(), payload);
    assert_eq!(std::fs::read(fx.local("ATT/report_metadata.xml")).unwrap(), METADATA);
    assert!(fx.local("ATT/report_manifest.txt").exists());

    let declared = outcome.remote_digest.clone().unwrap();
    assert_eq!(declared, digest_bytes(&payload, DigestAlgorithm::ContentHash).hex());
}

#[tokio::test]
async fn stored_file_rehashes_to_declared_content_hash() {
    let fx = Fixture::new();
    // Spans two content-hash blocks.
    let payload = vec![0xA5u8; 4 * 1024 * 1024 + 4096];
    fx.put_remote("A1/report.zip", &payload);

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;
    assert_eq!(outcome.status, TransferStatus::Success);

    let rehashed = digest_file(&fx.local("ATT/report.zip"), DigestAlgorithm::ContentHash)
        .await
        .unwrap();
    assert_eq!(Some(rehashed.hex().to_string()), outcome.remote_digest);
}

#[tokio::test]
async fn manifest_digest_recomputes_from_local_file() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"archival payload");

    let request = report_request().with_extra(vec![
        ("beginning_year".into(), "1990".into()),
        ("description".into(), "Board minutes".into()),
    ]);
    let outcome = fx.orchestrator(false).transfer(&request).await;
    assert_eq!(outcome.status, TransferStatus::Success);

    let text = std::fs::read_to_string(fx.local("ATT/report_manifest.txt")).unwrap();
    let manifest = Manifest::parse(&text).unwrap();
    let recomputed = digest_file(&fx.local("ATT/report.zip"), DigestAlgorithm::Sha256)
        .await
        .unwrap();

    assert_eq!(manifest.digest, recomputed);
    assert_eq!(outcome.standard_digest, Some(recomputed));
    assert_eq!(manifest.file_name, "report.zip");
    assert!(manifest.remote_path.ends_with("/A1/report.zip"));
    assert_eq!(manifest.extra, request.extra().to_vec());
}

#[tokio::test]
async fn existing_target_is_skipped_untouched() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"remote version");
    std::fs::create_dir_all(fx.local("ATT")).unwrap();
    std::fs::write(fx.local("ATT/report.zip"), b"local version").unwrap();

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert_eq!(outcome.status, TransferStatus::SkippedExisting);
    assert!(outcome.standard_digest.is_none());
    assert_eq!(std::fs::read(fx.local("ATT/report.zip")).unwrap(), b"local version");
    assert!(!fx.local("ATT/report_manifest.txt").exists());
    assert!(!fx.local("ATT/report_metadata.xml").exists());
}

#[tokio::test]
async fn repeat_without_overwrite_succeeds_then_skips() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    let orchestrator = fx.orchestrator(false);

    let first = orchestrator.transfer(&report_request()).await;
    let second = orchestrator.transfer(&report_request()).await;

    assert_eq!(first.status, TransferStatus::Success);
    assert_eq!(second.status, TransferStatus::SkippedExisting);
}

#[tokio::test]
async fn repeat_with_overwrite_latest_manifest_wins() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"first revision");
    let orchestrator = fx.orchestrator(true);

    let first = orchestrator.transfer(&report_request()).await;
    assert_eq!(first.status, TransferStatus::Success);
    let first_manifest =
        Manifest::parse(&std::fs::read_to_string(fx.local("ATT/report_manifest.txt")).unwrap())
            .unwrap();

    fx.put_remote("A1/report.zip", b"second, longer revision");
    let second = orchestrator.transfer(&report_request()).await;
    assert_eq!(second.status, TransferStatus::Success);

    let second_manifest =
        Manifest::parse(&std::fs::read_to_string(fx.local("ATT/report_manifest.txt")).unwrap())
            .unwrap();
    assert_ne!(first_manifest.digest, second_manifest.digest);
    assert!(second_manifest.transferred_at >= first_manifest.transferred_at);
    assert_eq!(
        second_manifest.digest,
        digest_bytes(b"second, longer revision", DigestAlgorithm::Sha256)
    );
    assert_eq!(
        std::fs::read(fx.local("ATT/report.zip")).unwrap(),
        b"second, longer revision"
    );
}

#[tokio::test]
async fn mismatch_fails_and_removes_target() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"actual bytes");
    let remote = TamperedRemote::declaring(fx.directory_source(), Some(&"a".repeat(64)));

    let outcome = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&report_request())
        .await;

    assert!(failure_reason(&outcome.status).starts_with("checksum mismatch"));
    assert!(!fx.local("ATT/report.zip").exists());
    assert!(!fx.local("ATT/report_manifest.txt").exists());
    assert!(!fx.local("ATT/report_metadata.xml").exists());
    assert!(outcome.standard_digest.is_none());
    assert_eq!(outcome.remote_digest, Some("a".repeat(64)));
}

#[tokio::test]
async fn mismatch_with_overwrite_leaves_no_stale_proof() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"good bytes");
    fx.orchestrator(true).transfer(&report_request()).await;
    assert!(fx.local("ATT/report_manifest.txt").exists());

    let remote = TamperedRemote::declaring(fx.directory_source(), Some(&"b".repeat(64)));
    let outcome = fx
        .orchestrator_with(Arc::new(remote), true)
        .transfer(&report_request())
        .await;

    assert!(outcome.status.is_failed());
    assert!(!fx.local("ATT/report.zip").exists());
    assert!(!fx.local("ATT/report_manifest.txt").exists());
}

#[tokio::test]
async fn absent_remote_checksum_is_a_failure() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    let remote = TamperedRemote::declaring(fx.directory_source(), None);

    let outcome = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&report_request())
        .await;

    assert_eq!(failure_reason(&outcome.status), "missing remote checksum");
    assert!(!fx.local("ATT/report.zip").exists());
}

#[tokio::test]
async fn malformed_remote_checksum_is_a_failure() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    let remote = TamperedRemote::declaring(fx.directory_source(), Some("aaaa"));

    let outcome = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&report_request())
        .await;

    assert_eq!(failure_reason(&outcome.status), "missing remote checksum");
    assert!(!fx.local("ATT/report.zip").exists());
}

#[tokio::test]
async fn missing_remote_object_fails() {
    let fx = Fixture::new();

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert!(failure_reason(&outcome.status).starts_with("remote object not found"));
    assert!(outcome.remote_digest.is_none());
    assert!(!fx.local("ATT").exists());
}

#[tokio::test]
async fn interrupted_stream_fails_and_removes_partial_file() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", &vec![7u8; 200_000]);
    let remote = TamperedRemote::failing_after(fx.directory_source(), 70_000);

    let outcome = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&report_request())
        .await;

    assert!(failure_reason(&outcome.status).starts_with("transfer I/O error"));
    assert!(!fx.local("ATT/report.zip").exists());
}

#[tokio::test]
async fn missing_metadata_document_fails_and_cleans_up() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    std::fs::remove_file(fx.remote_dir.path().join("A1/default_metadata.xml")).unwrap();

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert!(failure_reason(&outcome.status).starts_with("metadata sidecar error"));
    assert!(!fx.local("ATT/report.zip").exists());
    assert!(!fx.local("ATT/report_manifest.txt").exists());
}

#[tokio::test]
async fn zero_byte_object_transfers() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"");

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert_eq!(outcome.status, TransferStatus::Success);
    assert_eq!(outcome.remote_digest.as_deref(), Some(EMPTY_SHA256));
    assert_eq!(outcome.standard_digest.unwrap().hex(), EMPTY_SHA256);
    assert_eq!(std::fs::metadata(fx.local("ATT/report.zip")).unwrap().len(), 0);
}

#[tokio::test]
async fn archive_layout_lands_in_cleaned_folder() {
    let fx = Fixture::new();
    fx.put_remote("A1/file name.v2.pdf", b"pdf");

    let request = TransferRequest::for_archive("A1/file name.v2.pdf");
    let outcome = fx.orchestrator(false).transfer(&request).await;

    assert_eq!(outcome.status, TransferStatus::Success);
    let folder = fx.local("A1/file_name_v2");
    assert!(folder.join("file name.v2.pdf").exists());
    assert!(folder.join("file name.v2_manifest.txt").exists());
    assert!(folder.join("file name.v2_metadata.xml").exists());
}

#[tokio::test]
async fn events_bracket_each_transfer() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let orchestrator = fx.orchestrator(false).with_events(tx);

    orchestrator.transfer(&report_request()).await;
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(e) = rx.recv().await {
        events.push(e);
    }
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        TransferEvent::Started { remote_path } if remote_path == "A1/report.zip"
    ));
    assert!(matches!(
        &events[1],
        TransferEvent::Finished { outcome } if outcome.status == TransferStatus::Success
    ));
}

// ---------------------------------------------------------------------------
// Files sharing a stem
// ---------------------------------------------------------------------------

fn read_manifest(fx: &Fixture, path: &str) -> Manifest {
    Manifest::parse(&std::fs::read_to_string(fx.local(path)).unwrap()).unwrap()
}

#[tokio::test]
async fn failed_sibling_leaves_existing_proof_alone() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"zip bytes");
    fx.put_remote("A1/report.pdf", b"pdf bytes");

    let zip = fx
        .orchestrator(false)
        .transfer(&TransferRequest::for_archive("A1/report.zip"))
        .await;
    assert_eq!(zip.status, TransferStatus::Success);

    let remote = TamperedRemote::declaring(fx.directory_source(), Some(&"c".repeat(64)));
    let pdf = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&TransferRequest::for_archive("A1/report.pdf"))
        .await;

    assert!(failure_reason(&pdf.status).starts_with("sidecar collision"));
    assert!(fx.local("A1/report/report.zip").exists());
    assert!(!fx.local("A1/report/report.pdf").exists());
    assert!(fx.local("A1/report/report_metadata.xml").exists());
    assert_eq!(read_manifest(&fx, "A1/report/report_manifest.txt").file_name, "report.zip");
}

#[tokio::test]
async fn sibling_never_replaces_existing_manifest() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"zip bytes");
    fx.put_remote("A1/report.pdf", b"pdf bytes");
    let orchestrator = fx.orchestrator(true);

    orchestrator
        .transfer(&TransferRequest::for_archive("A1/report.zip"))
        .await;
    let pdf = orchestrator
        .transfer(&TransferRequest::for_archive("A1/report.pdf"))
        .await;

    assert!(failure_reason(&pdf.status).starts_with("sidecar collision"));
    assert!(!fx.local("A1/report/report.pdf").exists());
    let manifest = read_manifest(&fx, "A1/report/report_manifest.txt");
    assert_eq!(manifest.file_name, "report.zip");
    assert_eq!(manifest.digest, digest_bytes(b"zip bytes", DigestAlgorithm::Sha256));
}

#[tokio::test]
async fn unreadable_manifest_blocks_the_transfer() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    std::fs::create_dir_all(fx.local("ATT")).unwrap();
    std::fs::write(fx.local("ATT/report_manifest.txt"), b"not a manifest").unwrap();

    let outcome = fx.orchestrator(false).transfer(&report_request()).await;

    assert!(failure_reason(&outcome.status).starts_with("sidecar collision"));
    assert!(!fx.local("ATT/report.zip").exists());
    assert_eq!(
        std::fs::read(fx.local("ATT/report_manifest.txt")).unwrap(),
        b"not a manifest"
    );
}

#[tokio::test]
async fn cleanup_keeps_sidecars_it_did_not_write() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    std::fs::create_dir_all(fx.local("ATT")).unwrap();
    std::fs::write(fx.local("ATT/report_metadata.xml"), b"<kept/>").unwrap();
    let remote = TamperedRemote::declaring(fx.directory_source(), Some(&"d".repeat(64)));

    let outcome = fx
        .orchestrator_with(Arc::new(remote), false)
        .transfer(&report_request())
        .await;

    assert!(failure_reason(&outcome.status).starts_with("checksum mismatch"));
    assert!(!fx.local("ATT/report.zip").exists());
    assert_eq!(std::fs::read(fx.local("ATT/report_metadata.xml")).unwrap(), b"<kept/>");
}

#[tokio::test]
async fn concurrent_batch_serialises_shared_stems() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"zip bytes");
    fx.put_remote("A1/report.pdf", b"pdf bytes");
    fx.put_remote("A1/other.zip", b"other bytes");
    let requests = vec![
        TransferRequest::for_archive("A1/report.zip"),
        TransferRequest::for_archive("A1/report.pdf"),
        TransferRequest::for_archive("A1/other.zip"),
    ];

    let summary = BatchRunner::new(fx.orchestrator(false))
        .with_concurrency(3)
        .run(requests)
        .await;

    assert_eq!(summary.outcomes[0].status, TransferStatus::Success);
    assert!(failure_reason(&summary.outcomes[1].status).starts_with("sidecar collision"));
    assert_eq!(summary.outcomes[2].status, TransferStatus::Success);
    assert_eq!(read_manifest(&fx, "A1/report/report_manifest.txt").file_name, "report.zip");
    assert!(fx.local("A1/report/report_metadata.xml").exists());
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

fn mixed_batch(fx: &Fixture) -> Vec<TransferRequest> {
    fx.put_remote("A1/one.zip", b"one");
    fx.put_remote("A1/three.zip", b"three");
    vec![
        TransferRequest::for_archive("A1/one.zip"),
        TransferRequest::for_archive("A1/missing.zip"),
        TransferRequest::for_archive("A1/three.zip"),
    ]
}

#[tokio::test]
async fn batch_continues_past_failures() {
    let fx = Fixture::new();
    let requests = mixed_batch(&fx);

    let summary = BatchRunner::new(fx.orchestrator(false)).run(requests).await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.all_succeeded());
    let order: Vec<&str> = summary.outcomes.iter().map(|o| o.remote_path.as_str()).collect();
    assert_eq!(order, ["A1/one.zip", "A1/missing.zip", "A1/three.zip"]);
    assert!(summary.outcomes[1].status.is_failed());
    assert!(fx.local("A1/three/three.zip").exists());
}

#[tokio::test]
async fn concurrent_batch_matches_sequential_outcomes() {
    let fx = Fixture::new();
    let mut requests = Vec::new();
    for i in 0..12 {
        let name = format!("A1/file{i:02}.zip");
        fx.put_remote(&name, format!("content {i}").as_bytes());
        requests.push(TransferRequest::for_archive(name));
    }
    requests.push(TransferRequest::for_archive("A1/absent.zip"));

    let summary = BatchRunner::new(fx.orchestrator(false))
        .with_concurrency(4)
        .run(requests.clone())
        .await;

    assert_eq!(summary.outcomes.len(), 13);
    assert_eq!(summary.succeeded, 12);
    assert_eq!(summary.failed, 1);
    for (request, outcome) in requests.iter().zip(&summary.outcomes) {
        assert_eq!(request.remote_path(), outcome.remote_path);
    }
}

#[tokio::test]
async fn shared_targets_run_in_request_order() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    let requests = vec![report_request(), report_request(), report_request()];

    let summary = BatchRunner::new(fx.orchestrator(false))
        .with_concurrency(3)
        .run(requests)
        .await;

    assert_eq!(summary.outcomes[0].status, TransferStatus::Success);
    assert_eq!(summary.outcomes[1].status, TransferStatus::SkippedExisting);
    assert_eq!(summary.outcomes[2].status, TransferStatus::SkippedExisting);
    assert!(summary.all_succeeded());
}

#[tokio::test]
async fn cancelled_batch_launches_nothing() {
    let fx = Fixture::new();
    let requests = mixed_batch(&fx);

    let runner = BatchRunner::new(fx.orchestrator(false));
    runner.cancel_token().cancel();
    let summary = runner.run(requests).await;

    assert_eq!(summary.failed, 3);
    for outcome in &summary.outcomes {
        assert_eq!(failure_reason(&outcome.status), "batch cancelled");
    }
    assert!(!fx.local("A1").exists());
}

#[tokio::test]
async fn empty_batch_is_a_success() {
    let fx = Fixture::new();
    let summary = BatchRunner::new(fx.orchestrator(false)).run(Vec::new()).await;
    assert!(summary.outcomes.is_empty());
    assert!(summary.all_succeeded());
}

#[tokio::test]
async fn batch_list_feeds_manifest_extras() {
    let fx = Fixture::new();
    fx.put_remote("A1/report.zip", b"payload");
    fx.put_remote(
        "A1/list.csv",
        b"filename,beginning_year,ending_year\nreport.zip,1990,1995\n",
    );
    let source = fx.directory_source();

    let requests = att_transfer::load_file_list(&source, "A1/list.csv").await.unwrap();
    let summary = BatchRunner::new(fx.orchestrator(false)).run(requests).await;
    assert!(summary.all_succeeded());

    let manifest_path: &Path = &fx.local("A1/report/report_manifest.txt");
    let manifest = Manifest::parse(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(
        manifest.extra,
        vec![
            ("beginning_year".to_string(), "1990".to_string()),
            ("ending_year".to_string(), "1995".to_string()),
        ]
    );
}
