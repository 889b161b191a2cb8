use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::models::{
    FileFilter, FileRecord, FileSortBy, SortOrder, UploadMetadata, UploadOutcome,
};
use crate::shared::validation::MIME_TYPE_REGEX;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler streams the Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Free-text description stored with a newly created record
    #[schema(example = "Invoice sent by a contact")]
    pub description: Option<String>,
    /// Who uploaded the file
    #[schema(example = "wx_automation")]
    pub uploader: Option<String>,
}

/// Request DTO for importing a file that already exists on the server's disk
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImportLocalFileDto {
    /// Path of the source file; must be inside the configured import directory
    #[validate(length(min = 1, message = "path is required"))]
    #[schema(example = "./downloads/report.pdf")]
    pub path: String,
    /// Declared MIME type; inferred from the extension when omitted
    #[validate(regex(path = *MIME_TYPE_REGEX, message = "Invalid MIME type"))]
    #[schema(example = "application/pdf")]
    pub mime_type: Option<String>,
    /// Filename to record instead of the source file's name
    #[validate(length(min = 1, max = 255, message = "filename must be 1-255 characters"))]
    pub filename: Option<String>,
    #[validate(length(max = 1024, message = "description must not exceed 1024 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 128, message = "uploader must not exceed 128 characters"))]
    pub uploader: Option<String>,
}

impl ImportLocalFileDto {
    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            description: self.description.clone(),
            uploader: self.uploader.clone(),
        }
    }
}

/// Response DTO for uploads and imports
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileUploadResponseDto {
    /// Content digest (hex SHA-256), also the file id
    pub file_id: String,
    /// Filename recorded by the first upload of this content
    pub filename: String,
    /// MIME type of the file
    pub file_type: String,
    /// Size of the file in bytes
    pub file_size: i64,
    /// Same value as `file_id`
    pub file_hash: String,
    /// Absolute path of the stored file
    pub file_path: String,
    pub upload_time: DateTime<Utc>,
    /// False when the content was already stored and nothing new was written
    pub is_new: bool,
}

impl From<UploadOutcome> for FileUploadResponseDto {
    fn from(outcome: UploadOutcome) -> Self {
        let record = outcome.record;
        Self {
            file_hash: record.id.clone(),
            file_id: record.id,
            filename: record.filename,
            file_type: record.file_type,
            file_size: record.file_size,
            file_path: record.file_path,
            upload_time: record.upload_time,
            is_new: outcome.is_new,
        }
    }
}

/// Response DTO for stored file records
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub upload_time: DateTime<Utc>,
    pub description: Option<String>,
    pub uploader: Option<String>,
    pub download_count: i64,
}

impl From<FileRecord> for FileResponseDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            file_type: record.file_type,
            file_size: record.file_size,
            file_path: record.file_path,
            upload_time: record.upload_time,
            description: record.description,
            uploader: record.uploader,
            download_count: record.download_count,
        }
    }
}

/// Optional filters and ordering for the file listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FileListFilter {
    /// Only files from this uploader
    pub uploader: Option<String>,
    /// Only files of this MIME type
    pub file_type: Option<String>,
    /// Only files recorded under this exact filename
    pub filename: Option<String>,
    /// Sort key (default: upload_time)
    pub sort_by: Option<FileSortBy>,
    /// Sort direction (default: desc)
    pub sort_order: Option<SortOrder>,
}

impl FileListFilter {
    pub fn filters(&self) -> Vec<FileFilter> {
        let mut filters = Vec::new();
        if let Some(uploader) = &self.uploader {
            filters.push(FileFilter::Uploader(uploader.clone()));
        }
        if let Some(file_type) = &self.file_type {
            filters.push(FileFilter::FileType(file_type.clone()));
        }
        if let Some(filename) = &self.filename {
            filters.push(FileFilter::Filename(filename.clone()));
        }
        filters
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Confirmation that the file was deleted
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_dto_validation() {
        let dto = ImportLocalFileDto {
            path: "./downloads/a.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            filename: None,
            description: None,
            uploader: None,
        };
        assert!(dto.validate().is_ok());

        let dto = ImportLocalFileDto {
            path: String::new(),
            mime_type: Some("pdf".to_string()),
            filename: None,
            description: None,
            uploader: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("path"));
        assert!(fields.contains_key("mime_type"));
    }

    #[test]
    fn test_list_filter_builds_equality_filters() {
        let filter = FileListFilter {
            uploader: Some("alice".to_string()),
            file_type: Some("image/png".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.filters(),
            vec![
                FileFilter::Uploader("alice".to_string()),
                FileFilter::FileType("image/png".to_string()),
            ]
        );
        assert!(FileListFilter::default().filters().is_empty());
    }
}
