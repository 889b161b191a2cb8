//! Single-pass content hashing
//!
//! Every byte that reaches the sink also goes through a SHA-256 hasher, so a
//! payload is digested and persisted in one read of the source. Sources that
//! cannot be rewound (multipart bodies) therefore never need a second pass.

use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::error::AppError;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("payload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("failed to read source: {0}")]
    Source(std::io::Error),

    #[error("failed to write spool: {0}")]
    Sink(std::io::Error),
}

impl From<SpoolError> for AppError {
    fn from(err: SpoolError) -> Self {
        match err {
            SpoolError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                limit,
                limit / 1024 / 1024
            )),
            SpoolError::Source(e) => {
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            }
            SpoolError::Sink(e) => AppError::Storage(e),
        }
    }
}

/// Hex SHA-256 digest plus the number of bytes it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub hex: String,
    pub size: u64,
}

/// Writer adapter that hashes what it forwards and enforces a size ceiling.
///
/// A chunk that would push the total past `limit` is rejected before any of
/// it is written, so the sink never holds more than `limit` bytes.
pub struct SpoolWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
    limit: Option<u64>,
}

impl<W: AsyncWrite + Unpin> SpoolWriter<W> {
    pub fn new(inner: W, limit: Option<u64>) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
            limit,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), SpoolError> {
        let next = self.written + chunk.len() as u64;
        if let Some(limit) = self.limit {
            if next > limit {
                return Err(SpoolError::TooLarge { limit });
            }
        }

        self.inner.write_all(chunk).await.map_err(SpoolError::Sink)?;
        self.hasher.update(chunk);
        self.written = next;
        Ok(())
    }

    /// Flush the sink and return the digest together with the sink itself
    pub async fn finish(mut self) -> Result<(ContentDigest, W), SpoolError> {
        self.inner.flush().await.map_err(SpoolError::Sink)?;
        let digest = ContentDigest {
            hex: hex::encode(self.hasher.finalize()),
            size: self.written,
        };
        Ok((digest, self.inner))
    }
}

/// Drain `reader` into `writer` in `chunk_size` reads
pub async fn copy_hashed<R, W>(
    reader: &mut R,
    writer: &mut SpoolWriter<W>,
    chunk_size: usize,
) -> Result<(), SpoolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let read = reader.read(&mut buf).await.map_err(SpoolError::Source)?;
        if read == 0 {
            return Ok(());
        }
        writer.write_chunk(&buf[..read]).await?;
    }
}

/// Digest an existing file without copying it anywhere
pub async fn digest_file(path: &Path, chunk_size: usize) -> Result<ContentDigest, SpoolError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(SpoolError::Source)?;
    let mut writer = SpoolWriter::new(tokio::io::sink(), None);
    copy_hashed(&mut file, &mut writer, chunk_size).await?;
    let (digest, _) = writer.finish().await?;
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[tokio::test]
    async fn test_digest_matches_known_vector() {
        let mut sink = Vec::new();
        let mut writer = SpoolWriter::new(&mut sink, None);
        copy_hashed(&mut &b"abc"[..], &mut writer, 2).await.unwrap();
        let (digest, _) = writer.finish().await.unwrap();

        assert_eq!(digest.hex, ABC_SHA256);
        assert_eq!(digest.size, 3);
        assert_eq!(sink, b"abc");
    }

    #[tokio::test]
    async fn test_digest_independent_of_chunk_size() {
        let data: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
        let expected = hex::encode(Sha256::digest(&data));

        for chunk_size in [1, 7, 4096, 65536] {
            let mut writer = SpoolWriter::new(tokio::io::sink(), None);
            copy_hashed(&mut &data[..], &mut writer, chunk_size)
                .await
                .unwrap();
            let (digest, _) = writer.finish().await.unwrap();
            assert_eq!(digest.hex, expected, "chunk_size={}", chunk_size);
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let writer = SpoolWriter::new(tokio::io::sink(), Some(0));
        let (digest, _) = writer.finish().await.unwrap();
        assert_eq!(digest.hex, EMPTY_SHA256);
        assert_eq!(digest.size, 0);
    }

    #[tokio::test]
    async fn test_limit_enforced_before_write() {
        let mut sink = Vec::new();
        let mut writer = SpoolWriter::new(&mut sink, Some(5));
        writer.write_chunk(b"abcd").await.unwrap();

        let err = writer.write_chunk(b"ef").await.unwrap_err();
        assert!(matches!(err, SpoolError::TooLarge { limit: 5 }));
        assert_eq!(writer.written(), 4);
        drop(writer);
        assert_eq!(sink, b"abcd");
    }

    #[tokio::test]
    async fn test_exact_limit_is_accepted() {
        let mut writer = SpoolWriter::new(tokio::io::sink(), Some(3));
        copy_hashed(&mut &b"abc"[..], &mut writer, 1).await.unwrap();
        assert_eq!(writer.written(), 3);
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"ab")
            .read_error(std::io::Error::other("connection reset"))
            .build();
        let mut writer = SpoolWriter::new(tokio::io::sink(), None);

        let err = copy_hashed(&mut reader, &mut writer, 8).await.unwrap_err();
        assert!(matches!(err, SpoolError::Source(_)));
        assert_eq!(writer.written(), 2);
    }

    #[tokio::test]
    async fn test_digest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        let digest = digest_file(&path, 8192).await.unwrap();
        assert_eq!(digest.hex, ABC_SHA256);
        assert_eq!(digest.size, 3);
    }

    #[test]
    fn test_spool_error_mapping() {
        let err: AppError = SpoolError::TooLarge { limit: 10 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let err: AppError = SpoolError::Sink(std::io::Error::other("disk full")).into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
