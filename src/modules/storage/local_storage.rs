//! Local filesystem blob storage
//!
//! Payloads are spooled into `<root>/.staging/` first and only renamed into
//! their final [`PathLayout`] location once the caller decides to keep them.
//! Staging lives under the root so the rename never crosses filesystems.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hashing::{ContentDigest, SpoolWriter};
use super::path_layout::PathLayout;

const STAGING_DIR: &str = ".staging";

/// A spooled payload waiting to be committed or discarded
#[derive(Debug)]
pub struct StagedBlob {
    pub path: PathBuf,
    pub digest: ContentDigest,
}

pub struct LocalStorage {
    layout: PathLayout,
    staging_dir: PathBuf,
    chunk_size: usize,
}

impl LocalStorage {
    /// Create the storage, making sure root and staging directories exist
    pub async fn new(root: impl Into<PathBuf>, chunk_size: usize) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(STAGING_DIR)).await?;
        // Stored paths are absolute regardless of how the root was configured
        let root = tokio::fs::canonicalize(&root).await?;
        let staging_dir = root.join(STAGING_DIR);

        info!(
            "Local storage ready at {} (chunk_size={})",
            root.display(),
            chunk_size
        );

        Ok(Self {
            layout: PathLayout::new(root),
            staging_dir,
            chunk_size,
        })
    }

    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Open a fresh, uniquely named staging file wrapped in a hashing writer
    pub async fn create_spool(
        &self,
        limit: Option<u64>,
    ) -> std::io::Result<(PathBuf, SpoolWriter<File>)> {
        let path = self.staging_dir.join(format!("{}.part", Uuid::new_v4()));
        let file = File::create(&path).await?;
        Ok((path, SpoolWriter::new(file, limit)))
    }

    /// Move a staged blob to its final location and return that path.
    ///
    /// The rename is atomic, so readers never observe a partially written
    /// file at the final path. If two callers commit the same digest under
    /// the same name, the later rename replaces identical bytes.
    pub async fn commit(&self, staged: &StagedBlob, filename: &str) -> std::io::Result<PathBuf> {
        let final_path = self.layout.prepare(&staged.digest.hex, filename).await?;
        tokio::fs::rename(&staged.path, &final_path).await?;
        debug!(
            "Committed {} ({} bytes) to {}",
            staged.digest.hex,
            staged.digest.size,
            final_path.display()
        );
        Ok(final_path)
    }

    /// Best-effort removal of a staging file; failures only leave an orphan
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staging file {}: {}", path.display(), e);
            }
        }
    }

    /// Open a stored file for reading; `None` when nothing readable is there
    pub async fn open_stored(&self, path: &Path) -> std::io::Result<Option<(File, u64)>> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some((file, metadata.len())))
    }

    /// Size of the file at `path` as reported by the filesystem
    pub async fn size_of(&self, path: &Path) -> std::io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spool_commit_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), 4).await.unwrap();

        let (path, mut writer) = storage.create_spool(None).await.unwrap();
        writer.write_chunk(b"abc").await.unwrap();
        let (digest, _file) = writer.finish().await.unwrap();
        let staged = StagedBlob { path, digest };

        let final_path = storage.commit(&staged, "a.txt").await.unwrap();
        let (_file, len) = storage.open_stored(&final_path).await.unwrap().unwrap();
        assert_eq!(len, 3);
        assert!(!staged.path.exists());
        assert_eq!(storage.size_of(&final_path).await.unwrap(), 3);
        assert_eq!(
            final_path,
            storage.layout().root().join(&staged.digest.hex).join("a.txt")
        );
        assert!(final_path.is_absolute());

        let (orphan, _writer) = storage.create_spool(None).await.unwrap();
        storage.discard(&orphan).await;
        assert!(!orphan.exists());
        // Discarding twice is harmless
        storage.discard(&orphan).await;

        assert!(storage.open_stored(&orphan).await.unwrap().is_none());
        let shard = final_path.parent().unwrap();
        assert!(storage.open_stored(shard).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spool_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), 4).await.unwrap();

        let (a, _wa) = storage.create_spool(None).await.unwrap();
        let (b, _wb) = storage.create_spool(None).await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(storage.layout().root().join(STAGING_DIR)));
    }
}
