use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::{ChecksumError, DigestAlgorithm, DigestValue, Hasher, READ_CHUNK_SIZE};

/// Digests an async reader until EOF.
///
/// Any read error aborts with [`ChecksumError::StreamRead`]; a partial digest
/// is never returned.
pub async fn digest_reader<R>(
    reader: &mut R,
    algorithm: DigestAlgorithm,
) -> Result<DigestValue, ChecksumError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Digests a file on disk.
pub async fn digest_file(
    path: &Path,
    algorithm: DigestAlgorithm,
) -> Result<DigestValue, ChecksumError> {
    let mut file = tokio::fs::File::open(path).await?;
    let digest = digest_reader(&mut file, algorithm).await?;
    tracing::debug!(path = %path.display(), %algorithm, digest = %digest, "file digested");
    Ok(digest)
}

/// Pass-through reader that digests every byte it yields.
///
/// Lets a single pass over a stream both feed a writer and produce a digest.
pub struct HashingReader<R> {
    inner: R,
    hasher: Hasher,
    bytes: u64,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R, algorithm: DigestAlgorithm) -> Self {
        Self {
            inner,
            hasher: Hasher::new(algorithm),
            bytes: 0,
        }
    }

    /// Bytes yielded so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Finishes the digest over everything read so far.
    pub fn finalize(self) -> DigestValue {
        self.hasher.finalize()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let fresh = &buf.filled()[before..];
            this.hasher.update(fresh);
            this.bytes += fresh.len() as u64;
        }
        poll
    }
}
