use chrono::Utc;
use futures::{pin_mut, Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::models::{
    DownloadTarget, FileFilter, FileQuery, FileRecord, FileRecordPatch, FileSortBy, SortOrder,
    UploadMetadata, UploadOutcome,
};
use crate::features::files::services::file_index::{FileIndex, InsertOutcome};
use crate::modules::storage::path_layout::sanitize_filename;
use crate::modules::storage::{
    copy_hashed, digest_file, ContentDigest, LocalStorage, SpoolError, SpoolWriter, StagedBlob,
};
use crate::shared::constants::DEFAULT_MIME_TYPE;
use crate::shared::types::QueryPage;

/// Bytes that are fully spooled and hashed but not yet indexed.
///
/// Either [`FileService::commit_upload`] or [`FileService::abandon`] must
/// consume it; a dropped pending upload leaves an orphaned staging file.
#[derive(Debug)]
pub struct PendingUpload {
    staged: StagedBlob,
    filename: String,
    mime_type: String,
}

impl PendingUpload {
    pub fn digest(&self) -> &str {
        &self.staged.digest.hex
    }
}

/// Content-addressed file store.
///
/// Bytes are hashed while they are spooled to a staging file; the digest
/// decides whether the spool is discarded (known content) or renamed into
/// place and indexed (new content). The index insert is the commit point.
pub struct FileService {
    index: Arc<FileIndex>,
    storage: LocalStorage,
    config: StorageConfig,
}

impl FileService {
    pub async fn new(index: Arc<FileIndex>, config: StorageConfig) -> Result<Self> {
        let storage = LocalStorage::new(&config.root_dir, config.chunk_size).await?;
        tokio::fs::create_dir_all(&config.import_dir).await?;
        Ok(Self {
            index,
            storage,
            config,
        })
    }

    /// Absolute root all stored files live under
    pub fn storage_root(&self) -> &Path {
        self.storage.layout().root()
    }

    pub fn chunk_size(&self) -> usize {
        self.storage.chunk_size()
    }

    pub fn max_upload_size(&self) -> u64 {
        self.config.max_upload_size
    }

    /// Upload from a live byte stream in one call
    #[cfg(test)]
    pub async fn upload_stream<S, B>(
        &self,
        stream: S,
        meta: UploadMetadata,
    ) -> Result<UploadOutcome>
    where
        S: Stream<Item = std::io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let pending = self
            .stage_stream(stream, meta.filename.as_deref(), meta.mime_type.as_deref())
            .await?;
        self.commit_upload(pending, meta.description, meta.uploader).await
    }

    /// Spool and hash a byte stream (e.g. a multipart field) without touching
    /// the index.
    ///
    /// The MIME type is checked before any byte is read and the size limit is
    /// checked chunk by chunk, so an oversized body is rejected as soon as it
    /// crosses the limit. On failure the staging file is already removed.
    pub async fn stage_stream<S, B>(
        &self,
        stream: S,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<PendingUpload>
    where
        S: Stream<Item = std::io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let filename = sanitize_filename(filename.unwrap_or_default());
        let mime_type = self.resolve_mime_type(mime_type, &filename)?;

        let (spool_path, writer) = self
            .storage
            .create_spool(Some(self.config.max_upload_size))
            .await?;

        match spool_stream(stream, writer).await {
            Ok(digest) => Ok(PendingUpload {
                staged: StagedBlob {
                    path: spool_path,
                    digest,
                },
                filename,
                mime_type,
            }),
            Err(e) => {
                self.storage.discard(&spool_path).await;
                Err(e.into())
            }
        }
    }

    /// Drop a pending upload and its staging file
    pub async fn abandon(&self, pending: PendingUpload) {
        debug!("Abandoning staged upload {}", pending.digest());
        self.storage.discard(&pending.staged.path).await;
    }

    /// Upload a file that already exists on local disk, such as an attachment
    /// the messaging client downloaded. The source is copied, never moved.
    pub async fn upload_local(&self, source: &Path, meta: UploadMetadata) -> Result<UploadOutcome> {
        let source = self.resolve_import_path(source).await?;

        let filename = match meta.filename.as_deref() {
            Some(name) => sanitize_filename(name),
            None => sanitize_filename(
                &source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        };
        let mime_type = self.resolve_mime_type(meta.mime_type.as_deref(), &filename)?;

        let limit = self.config.max_upload_size;
        if tokio::fs::metadata(&source).await?.len() > limit {
            return Err(SpoolError::TooLarge { limit }.into());
        }

        // Hash in place first so a known attachment is never copied
        let digest = digest_file(&source, self.chunk_size()).await?;
        if let Some(existing) = self.index.get_by_id(&digest.hex).await? {
            debug!(
                "Local import {} matches existing id={}",
                source.display(),
                existing.id
            );
            return Ok(UploadOutcome {
                record: existing,
                is_new: false,
            });
        }

        debug!("Importing local file {}", source.display());
        let mut reader = File::open(&source).await?;
        let (spool_path, mut writer) = self.storage.create_spool(Some(limit)).await?;
        let spooled = match copy_hashed(&mut reader, &mut writer, self.chunk_size()).await {
            Ok(()) => finish_spool(writer).await,
            Err(e) => Err(e),
        };
        let digest = match spooled {
            Ok(digest) => digest,
            Err(e) => {
                self.storage.discard(&spool_path).await;
                return Err(e.into());
            }
        };

        let pending = PendingUpload {
            staged: StagedBlob {
                path: spool_path,
                digest,
            },
            filename,
            mime_type,
        };
        self.commit_upload(pending, meta.description, meta.uploader).await
    }

    /// Index a pending upload, or resolve it to the record that already owns
    /// its digest. `description` and `uploader` only land on a new record.
    pub async fn commit_upload(
        &self,
        pending: PendingUpload,
        description: Option<String>,
        uploader: Option<String>,
    ) -> Result<UploadOutcome> {
        let PendingUpload {
            staged,
            filename,
            mime_type,
        } = pending;

        if let Some(existing) = self.index.get_by_id(&staged.digest.hex).await? {
            self.storage.discard(&staged.path).await;
            if existing.is_deleted {
                warn!(
                    "Upload matched soft-deleted file id={}; record stays deleted",
                    existing.id
                );
            } else {
                debug!("Dedup hit: id={}, keeping '{}'", existing.id, existing.filename);
            }
            return Ok(UploadOutcome {
                record: existing,
                is_new: false,
            });
        }

        let final_path = match self.storage.commit(&staged, &filename).await {
            Ok(path) => path,
            Err(e) => {
                self.storage.discard(&staged.path).await;
                return Err(e.into());
            }
        };
        let file_size = self.storage.size_of(&final_path).await?;

        let record = FileRecord {
            id: staged.digest.hex,
            filename,
            file_type: mime_type,
            file_size: file_size as i64,
            file_path: final_path.to_string_lossy().into_owned(),
            upload_time: Utc::now(),
            description,
            uploader,
            download_count: 0,
            is_deleted: false,
        };

        match self.index.insert(&record).await? {
            InsertOutcome::Inserted => {
                info!(
                    "File stored: id={}, filename={}, size={}",
                    record.id, record.filename, record.file_size
                );
                Ok(UploadOutcome {
                    record,
                    is_new: true,
                })
            }
            InsertOutcome::Duplicate => {
                // A concurrent upload of the same bytes committed first
                let existing = self.index.get_by_id(&record.id).await?.ok_or_else(|| {
                    AppError::Internal(format!("File {} vanished after conflict", record.id))
                })?;
                if existing.file_path != record.file_path {
                    self.storage.discard(&final_path).await;
                }
                debug!("Lost insert race for id={}, returning winner", record.id);
                Ok(UploadOutcome {
                    record: existing,
                    is_new: false,
                })
            }
        }
    }

    /// Get a live record; soft-deleted records are reported as absent
    pub async fn get(&self, id: &str) -> Result<Option<FileRecord>> {
        let record = self.index.get_by_id(id).await?;
        Ok(record.filter(|r| !r.is_deleted))
    }

    /// Soft delete. Returns `false` when the id is unknown or already deleted.
    /// The bytes on disk are left in place.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if self.get(id).await?.is_none() {
            return Ok(false);
        }

        let patch = FileRecordPatch {
            is_deleted: Some(true),
            ..Default::default()
        };
        let deleted = self.index.update(id, &patch).await?;
        if deleted {
            info!("File soft deleted: id={}", id);
        }
        Ok(deleted)
    }

    /// Live records only. Without an explicit sort key the listing is
    /// newest first.
    pub async fn list(&self, mut query: FileQuery) -> Result<QueryPage<FileRecord>> {
        query.filters.retain(|f| !matches!(f, FileFilter::IsDeleted(_)));
        query.filters.insert(0, FileFilter::IsDeleted(false));
        if query.sort_by.is_none() {
            query.sort_by = Some(FileSortBy::UploadTime);
            query.sort_order = SortOrder::Desc;
        }
        self.index.query(&query).await
    }

    /// Resolve a download and count it.
    ///
    /// Fails with `NotFound` when the record is absent, soft-deleted, or its
    /// file has gone missing from disk.
    pub async fn download(&self, id: &str) -> Result<DownloadTarget> {
        let record = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let path = PathBuf::from(&record.file_path);
        let Some((file, file_size)) = self.storage.open_stored(&path).await? else {
            warn!(
                "Index/disk drift: file {} is indexed at {} but missing on disk",
                record.id, record.file_path
            );
            return Err(AppError::NotFound("File content not found".to_string()));
        };

        if !self.index.increment_download_count(id).await? {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        debug!("Download counted for id={}", id);

        Ok(DownloadTarget {
            file,
            path,
            filename: record.filename,
            mime_type: record.file_type,
            file_size,
        })
    }

    /// Declared type without parameters, or a guess from the extension when
    /// the caller sent nothing or only the generic octet-stream type
    fn resolve_mime_type(&self, declared: Option<&str>, filename: &str) -> Result<String> {
        let mime_type = declared
            .map(|m| m.split(';').next().unwrap_or_default().trim().to_lowercase())
            .filter(|m| !m.is_empty() && m != DEFAULT_MIME_TYPE)
            .unwrap_or_else(|| {
                mime_guess::from_path(filename)
                    .first_raw()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string()
            });

        if !self.config.is_mime_type_allowed(&mime_type) {
            return Err(AppError::UnsupportedMediaType(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                mime_type,
                self.config.allowed_mime_types.join(", ")
            )));
        }

        Ok(mime_type)
    }

    /// Local imports must resolve inside the configured import directory
    async fn resolve_import_path(&self, source: &Path) -> Result<PathBuf> {
        let source = tokio::fs::canonicalize(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Source file not found: {}", source.display()))
            } else {
                AppError::Storage(e)
            }
        })?;

        let import_root = tokio::fs::canonicalize(&self.config.import_dir).await?;
        if !source.starts_with(&import_root) {
            return Err(AppError::Forbidden(format!(
                "Source file must be inside {}",
                import_root.display()
            )));
        }

        if !tokio::fs::metadata(&source).await?.is_file() {
            return Err(AppError::Validation(format!(
                "Source is not a regular file: {}",
                source.display()
            )));
        }

        Ok(source)
    }
}

async fn spool_stream<S, B>(
    stream: S,
    mut writer: SpoolWriter<File>,
) -> std::result::Result<ContentDigest, SpoolError>
where
    S: Stream<Item = std::io::Result<B>>,
    B: AsRef<[u8]>,
{
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(SpoolError::Source)?;
        if let Err(e) = writer.write_chunk(chunk.as_ref()).await {
            debug!("Spool stopped after {} bytes: {}", writer.written(), e);
            return Err(e);
        }
    }
    finish_spool(writer).await
}

async fn finish_spool(writer: SpoolWriter<File>) -> std::result::Result<ContentDigest, SpoolError> {
    let (digest, file) = writer.finish().await?;
    file.sync_all().await.map_err(SpoolError::Sink)?;
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_test_store, create_test_store_with};
    use futures::stream;
    use sha2::{Digest, Sha256};

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn chunks(data: &[u8], size: usize) -> Vec<std::io::Result<Vec<u8>>> {
        data.chunks(size).map(|c| Ok(c.to_vec())).collect()
    }

    fn meta(filename: &str) -> UploadMetadata {
        UploadMetadata {
            filename: Some(filename.to_string()),
            mime_type: Some("text/plain".to_string()),
            ..Default::default()
        }
    }

    async fn upload_bytes(
        service: &FileService,
        data: &[u8],
        meta: UploadMetadata,
    ) -> Result<UploadOutcome> {
        service.upload_stream(stream::iter(chunks(data, 4)), meta).await
    }

    fn staging_entries(service: &FileService) -> usize {
        std::fs::read_dir(service.storage_root().join(".staging"))
            .unwrap()
            .count()
    }

    #[tokio::test]
    async fn test_upload_then_dedup_keeps_first_metadata() {
        let store = create_test_store().await;
        let service = &store.service;

        let first = upload_bytes(
            service,
            b"abc",
            UploadMetadata {
                description: Some("first".to_string()),
                uploader: Some("alice".to_string()),
                ..meta("a.txt")
            },
        )
        .await
        .unwrap();
        assert!(first.is_new);
        assert_eq!(first.record.id, ABC_SHA256);
        assert_eq!(first.record.file_size, 3);
        assert_eq!(first.record.download_count, 0);

        let second = upload_bytes(
            service,
            b"abc",
            UploadMetadata {
                description: Some("second".to_string()),
                uploader: Some("bob".to_string()),
                ..meta("b.txt")
            },
        )
        .await
        .unwrap();
        assert!(!second.is_new);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(second.record.filename, "a.txt");
        assert_eq!(second.record.file_size, first.record.file_size);
        assert_eq!(second.record.file_path, first.record.file_path);
        assert_eq!(second.record.description.as_deref(), Some("first"));
        assert_eq!(second.record.uploader.as_deref(), Some("alice"));
        let stored = service.get(&first.record.id).await.unwrap().unwrap();
        assert_eq!(second.record.upload_time, stored.upload_time);

        // The rejected duplicate left nothing behind
        assert_eq!(staging_entries(service), 0);
        assert!(!Path::new(&first.record.file_path)
            .with_file_name("b.txt")
            .exists());
    }

    #[tokio::test]
    async fn test_id_is_digest_of_stored_bytes() {
        let store = create_test_store().await;
        let data: Vec<u8> = (0..777).map(|i| (i * 7 % 256) as u8).collect();

        let outcome = upload_bytes(&store.service, &data, meta("blob.bin"))
            .await
            .unwrap();

        let on_disk = std::fs::read(&outcome.record.file_path).unwrap();
        assert_eq!(on_disk, data);
        assert_eq!(outcome.record.id, hex::encode(Sha256::digest(&on_disk)));
        assert_eq!(outcome.record.file_size, data.len() as i64);
        assert_eq!(
            PathBuf::from(&outcome.record.file_path),
            store
                .service
                .storage_root()
                .join(&outcome.record.id)
                .join("blob.bin")
        );
    }

    #[tokio::test]
    async fn test_size_limit_rejects_one_byte_over() {
        let store = create_test_store_with(|c| c.max_upload_size = 8).await;

        let ok = upload_bytes(&store.service, b"12345678", meta("ok.txt")).await;
        assert!(ok.is_ok());

        let err = upload_bytes(&store.service, b"123456789", meta("big.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(err.is_validation());

        let listed = store.service.list(FileQuery::page(0, 100)).await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(staging_entries(&store.service), 0);
    }

    #[tokio::test]
    async fn test_disallowed_mime_type_is_rejected_before_spooling() {
        let store = create_test_store().await;

        let err = upload_bytes(
            &store.service,
            b"GIF89a",
            UploadMetadata {
                filename: Some("anim.gif".to_string()),
                mime_type: Some("image/gif".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert_eq!(staging_entries(&store.service), 0);
        assert_eq!(store.service.list(FileQuery::page(0, 10)).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_mime_type_inferred_from_extension() {
        let store = create_test_store().await;

        let outcome = upload_bytes(
            &store.service,
            b"\x89PNG",
            UploadMetadata {
                filename: Some("pic.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.record.file_type, "image/png");

        let unknown = upload_bytes(
            &store.service,
            b"???",
            UploadMetadata {
                filename: Some("mystery".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(unknown.record.file_type, DEFAULT_MIME_TYPE);

        let generic = upload_bytes(
            &store.service,
            b"plain words",
            UploadMetadata {
                filename: Some("notes.txt".to_string()),
                mime_type: Some("application/octet-stream".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(generic.record.file_type, "text/plain");
    }

    #[tokio::test]
    async fn test_staged_upload_commits_late_metadata_or_abandons() {
        let store = create_test_store().await;

        let pending = store
            .service
            .stage_stream(stream::iter(chunks(b"abc", 2)), Some("a.txt"), None)
            .await
            .unwrap();
        assert_eq!(pending.digest(), ABC_SHA256);
        assert_eq!(staging_entries(&store.service), 1);
        assert!(store.index.get_by_id(ABC_SHA256).await.unwrap().is_none());

        let outcome = store
            .service
            .commit_upload(pending, Some("late".to_string()), None)
            .await
            .unwrap();
        assert!(outcome.is_new);
        assert_eq!(outcome.record.description.as_deref(), Some("late"));
        assert_eq!(staging_entries(&store.service), 0);

        let pending = store
            .service
            .stage_stream(stream::iter(chunks(b"xyz", 2)), Some("x.txt"), None)
            .await
            .unwrap();
        store.service.abandon(pending).await;
        assert_eq!(staging_entries(&store.service), 0);
        assert_eq!(store.service.list(FileQuery::page(0, 10)).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_stream_error_leaves_no_record() {
        let store = create_test_store().await;
        let broken = stream::iter(vec![
            Ok(b"abc".to_vec()),
            Err(std::io::Error::other("client went away")),
        ]);

        let err = store
            .service
            .upload_stream(broken, meta("a.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.index.get_by_id(ABC_SHA256).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_without_destroying() {
        let store = create_test_store().await;
        let outcome = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();
        let id = outcome.record.id.clone();

        assert!(store.service.delete(&id).await.unwrap());
        assert!(store.service.get(&id).await.unwrap().is_none());
        assert_eq!(store.service.list(FileQuery::page(0, 10)).await.unwrap().total, 0);
        assert!(Path::new(&outcome.record.file_path).exists());

        // Second delete finds nothing live
        assert!(!store.service.delete(&id).await.unwrap());
        assert!(!store.service.delete(&"f".repeat(64)).await.unwrap());

        let err = store.service.download(&id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reupload_of_deleted_content_stays_deleted() {
        let store = create_test_store().await;
        let first = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();
        store.service.delete(&first.record.id).await.unwrap();

        let again = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();
        assert!(!again.is_new);
        assert!(again.record.is_deleted);
        assert!(store.service.get(&first.record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_counts_each_call() {
        let store = create_test_store().await;
        let outcome = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();
        let id = outcome.record.id;

        for expected in 1..=3 {
            let target = store.service.download(&id).await.unwrap();
            assert_eq!(target.filename, "a.txt");
            assert_eq!(target.mime_type, "text/plain");
            assert_eq!(target.path, PathBuf::from(&outcome.record.file_path));
            assert_eq!(target.file_size, 3);

            let record = store.service.get(&id).await.unwrap().unwrap();
            assert_eq!(record.download_count, expected);
        }
    }

    #[tokio::test]
    async fn test_upload_with_unusable_client_filenames() {
        let store = create_test_store().await;

        let long = format!("{}.txt", "n".repeat(400));
        let outcome = upload_bytes(&store.service, b"long", meta(&long))
            .await
            .unwrap();
        assert!(outcome.is_new);
        assert_eq!(outcome.record.filename.len(), 255);
        assert!(Path::new(&outcome.record.file_path).is_file());

        let outcome = upload_bytes(&store.service, b"nul", meta("\0\0"))
            .await
            .unwrap();
        assert_eq!(outcome.record.filename, "unnamed");
        assert!(Path::new(&outcome.record.file_path).is_file());
    }

    #[tokio::test]
    async fn test_download_holds_opened_file() {
        use tokio::io::AsyncReadExt;

        let store = create_test_store().await;
        let outcome = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();

        let mut target = store.service.download(&outcome.record.id).await.unwrap();
        std::fs::remove_file(&outcome.record.file_path).unwrap();

        let mut body = Vec::new();
        target.file.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"abc");

        // Counted once for the download that was served, not for the failed one
        let err = store.service.download(&outcome.record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let record = store.service.get(&outcome.record.id).await.unwrap().unwrap();
        assert_eq!(record.download_count, 1);
    }

    #[tokio::test]
    async fn test_download_detects_missing_file() {
        let store = create_test_store().await;
        let outcome = upload_bytes(&store.service, b"abc", meta("a.txt"))
            .await
            .unwrap();
        std::fs::remove_file(&outcome.record.file_path).unwrap();

        let err = store.service.download(&outcome.record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let record = store.service.get(&outcome.record.id).await.unwrap().unwrap();
        assert_eq!(record.download_count, 0);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = create_test_store().await;
        for n in 0..25 {
            upload_bytes(&store.service, format!("payload-{}", n).as_bytes(), meta("p.txt"))
                .await
                .unwrap();
        }

        let page = store.service.list(FileQuery::page(10, 10)).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.size, 10);
        assert_eq!(page.page, 2);
        assert!(page.has_more);

        let last = store.service.list(FileQuery::page(20, 10)).await.unwrap();
        assert_eq!(last.size, 5);
        assert!(!last.has_more);

        let all = store.service.list(FileQuery::page(0, 100)).await.unwrap();
        assert!(all
            .items
            .windows(2)
            .all(|w| w[0].upload_time >= w[1].upload_time));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = create_test_store().await;
        for (data, uploader) in [("aa", "alice"), ("bbbb", "bob"), ("c", "alice")] {
            upload_bytes(
                &store.service,
                data.as_bytes(),
                UploadMetadata {
                    uploader: Some(uploader.to_string()),
                    ..meta(&format!("{}.txt", data))
                },
            )
            .await
            .unwrap();
        }

        let page = store
            .service
            .list(FileQuery {
                filters: vec![FileFilter::Uploader("alice".to_string())],
                sort_by: Some(FileSortBy::FileSize),
                sort_order: SortOrder::Asc,
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        let names: Vec<&str> = page.items.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "aa.txt"]);

        // Deleted records stay hidden even when asked for
        let bob = store
            .service
            .list(FileQuery {
                filters: vec![FileFilter::Uploader("bob".to_string())],
                ..FileQuery::page(0, 10)
            })
            .await
            .unwrap();
        store.service.delete(&bob.items[0].id).await.unwrap();
        let page = store
            .service
            .list(FileQuery {
                filters: vec![FileFilter::IsDeleted(true)],
                ..FileQuery::page(0, 10)
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_upload_local_copies_source() {
        let store = create_test_store().await;
        let source = store.import_dir().join("voice.txt");
        std::fs::write(&source, b"abc").unwrap();

        let outcome = store
            .service
            .upload_local(&source, UploadMetadata::default())
            .await
            .unwrap();

        assert!(outcome.is_new);
        assert_eq!(outcome.record.id, ABC_SHA256);
        assert_eq!(outcome.record.filename, "voice.txt");
        assert_eq!(outcome.record.file_type, "text/plain");
        assert!(source.exists());
        assert_eq!(std::fs::read(&outcome.record.file_path).unwrap(), b"abc");

        // Same bytes through the stream path dedup against the import
        let streamed = upload_bytes(&store.service, b"abc", meta("other.txt"))
            .await
            .unwrap();
        assert!(!streamed.is_new);
        assert_eq!(streamed.record.filename, "voice.txt");

        let again = store
            .service
            .upload_local(&source, UploadMetadata::default())
            .await
            .unwrap();
        assert!(!again.is_new);
        assert_eq!(staging_entries(&store.service), 0);
    }

    #[tokio::test]
    async fn test_upload_local_rejects_paths_outside_import_dir() {
        let store = create_test_store().await;
        let outside = store.dir.path().join("secret.txt");
        std::fs::write(&outside, b"top secret").unwrap();

        let err = store
            .service
            .upload_local(&outside, UploadMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let missing = store.import_dir().join("missing.txt");
        let err = store
            .service
            .upload_local(&missing, UploadMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_local_enforces_size_limit() {
        let store = create_test_store_with(|c| c.max_upload_size = 4).await;
        let source = store.import_dir().join("big.txt");
        std::fs::write(&source, b"12345").unwrap();

        let err = store
            .service
            .upload_local(&source, UploadMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(staging_entries(&store.service), 0);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_of_same_content_insert_once() {
        let store = create_test_store().await;

        let mut handles = Vec::new();
        for n in 0..8 {
            let service = Arc::clone(&store.service);
            handles.push(tokio::spawn(async move {
                let data = b"same bytes everywhere".to_vec();
                service
                    .upload_stream(
                        stream::iter(vec![Ok::<_, std::io::Error>(data)]),
                        meta(&format!("copy-{}.txt", n)),
                    )
                    .await
            }));
        }

        let mut new_count = 0;
        let mut ids = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.is_new {
                new_count += 1;
            }
            ids.push(outcome.record.id);
        }

        assert_eq!(new_count, 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.service.list(FileQuery::page(0, 10)).await.unwrap().total, 1);

        let record = store.service.get(&ids[0]).await.unwrap().unwrap();
        assert_eq!(
            std::fs::read(&record.file_path).unwrap(),
            b"same bytes everywhere"
        );
    }
}
