use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Database model for stored files. `id` is the hex SHA-256 of the content.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub upload_time: DateTime<Utc>,
    pub description: Option<String>,
    pub uploader: Option<String>,
    pub download_count: i64,
    pub is_deleted: bool,
}

/// Columns a listing can filter on by equality
#[derive(Debug, Clone, PartialEq)]
pub enum FileFilter {
    IsDeleted(bool),
    Uploader(String),
    FileType(String),
    Filename(String),
}

/// Columns a listing can be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileSortBy {
    #[default]
    UploadTime,
    Filename,
    FileSize,
    DownloadCount,
}

impl FileSortBy {
    pub fn column(&self) -> &'static str {
        match self {
            FileSortBy::UploadTime => "upload_time",
            FileSortBy::Filename => "filename",
            FileSortBy::FileSize => "file_size",
            FileSortBy::DownloadCount => "download_count",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filtered, sorted, paginated listing request
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub filters: Vec<FileFilter>,
    pub sort_by: Option<FileSortBy>,
    pub sort_order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

impl FileQuery {
    /// Unfiltered page with the default ordering
    #[cfg(test)]
    pub fn page(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

/// Partial update; `None` fields are left untouched.
/// `download_count` is not patchable; it only moves through
/// `FileIndex::increment_download_count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecordPatch {
    pub is_deleted: Option<bool>,
    pub description: Option<String>,
    pub uploader: Option<String>,
}

impl FileRecordPatch {
    pub fn is_empty(&self) -> bool {
        self.is_deleted.is_none() && self.description.is_none() && self.uploader.is_none()
    }
}

/// Caller-supplied metadata accompanying an upload
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    /// Original filename; for local imports defaults to the source file name
    pub filename: Option<String>,
    /// Declared MIME type; inferred from the filename extension when absent
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub uploader: Option<String>,
}

/// Result of an upload: the authoritative record and whether it was created now
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record: FileRecord,
    pub is_new: bool,
}

/// An opened stored file, ready to be streamed
#[derive(Debug)]
pub struct DownloadTarget {
    pub file: tokio::fs::File,
    pub path: std::path::PathBuf,
    pub filename: String,
    pub mime_type: String,
    /// Size on disk at open time
    pub file_size: u64,
}
