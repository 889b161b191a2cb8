use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, FileId};
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileListFilter, FileResponseDto, FileUploadResponseDto,
    ImportLocalFileDto, UploadFileDto,
};
use crate::features::files::models::FileQuery;
use crate::features::files::services::{FileService, PendingUpload};
use crate::shared::types::{ApiResponse, ListQuery};

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `description`: Optional description, kept only when the content is new
/// - `uploader`: Optional uploader name, kept only when the content is new
///
/// Identical content is stored once; re-uploads return the existing record
/// with `is_new = false`.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form with optional description and uploader fields",
    ),
    responses(
        (status = 201, description = "File stored or matched existing content", body = ApiResponse<FileUploadResponseDto>),
        (status = 400, description = "Invalid multipart data"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large"),
        (status = 415, description = "File type not allowed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileUploadResponseDto>>)> {
    let mut form = UploadForm::default();
    if let Err(e) = read_upload_form(&service, &mut multipart, &mut form).await {
        if e.is_validation() {
            debug!("Upload rejected: {}", e);
        }
        if let Some(pending) = form.pending.take() {
            service.abandon(pending).await;
        }
        return Err(e);
    }

    let pending = form
        .pending
        .ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let outcome = service
        .commit_upload(pending, form.description, form.uploader)
        .await?;
    let message = if outcome.is_new {
        "File uploaded successfully"
    } else {
        "File already exists"
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(outcome.into()),
            Some(message.to_string()),
            None,
        )),
    ))
}

#[derive(Default)]
struct UploadForm {
    pending: Option<PendingUpload>,
    description: Option<String>,
    uploader: Option<String>,
}

/// Stream the file part straight into staging while collecting the text
/// fields, which may arrive before or after it
async fn read_upload_form(
    service: &FileService,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> Result<()> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if form.pending.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one file may be uploaded per request".to_string(),
                    ));
                }
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let chunks = field.map_err(std::io::Error::other);

                let pending = service
                    .stage_stream(chunks, file_name.as_deref(), content_type.as_deref())
                    .await?;
                form.pending = Some(pending);
            }
            "description" => {
                form.description = non_empty(field.text().await.map_err(multipart_error)?);
            }
            "uploader" => {
                form.uploader = non_empty(field.text().await.map_err(multipart_error)?);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }
    Ok(())
}

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(e.body_text());
    }
    AppError::BadRequest(format!("Failed to read multipart data: {}", e))
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Import a file that already exists on the server
///
/// Used for attachments the messaging client has downloaded into the import
/// directory. The source file is copied into the store and left untouched.
#[utoipa::path(
    post,
    path = "/api/files/import",
    tag = "files",
    request_body = ImportLocalFileDto,
    responses(
        (status = 201, description = "File stored or matched existing content", body = ApiResponse<FileUploadResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Path outside the import directory"),
        (status = 404, description = "Source file not found"),
        (status = 413, description = "File too large"),
        (status = 415, description = "File type not allowed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn import_local_file(
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<ImportLocalFileDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileUploadResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = service
        .upload_local(Path::new(&dto.path), dto.metadata())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(outcome.into()), None, None)),
    ))
}

/// List stored files
///
/// Deleted files are never listed. Newest first unless `sort_by` is given.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(ListQuery, FileListFilter),
    responses(
        (status = 200, description = "Page of files", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
    Query(page): Query<ListQuery>,
    Query(filter): Query<FileListFilter>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let query = FileQuery {
        filters: filter.filters(),
        sort_by: filter.sort_by,
        sort_order: filter.sort_order.unwrap_or_default(),
        skip: page.skip(),
        limit: page.limit(),
    };

    let page = service.list(query).await?.map(FileResponseDto::from);
    let meta = page.meta();

    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}

/// Get a file record by id
#[utoipa::path(
    get,
    path = "/api/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "Content digest (64 lowercase hex characters)")
    ),
    responses(
        (status = 200, description = "File record", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Malformed file id"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(service): State<Arc<FileService>>,
    FileId(id): FileId,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    let record = service
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Delete a file
///
/// Soft delete: the record is hidden from every read but the stored bytes
/// stay on disk.
#[utoipa::path(
    delete,
    path = "/api/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "Content digest (64 lowercase hex characters)")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 400, description = "Malformed file id"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    FileId(id): FileId,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>> {
    if !service.delete(&id).await? {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}

/// Download a file
///
/// Streams the stored bytes and counts the download.
#[utoipa::path(
    get,
    path = "/api/files/{file_id}/download",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "Content digest (64 lowercase hex characters)")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed file id"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    FileId(id): FileId,
) -> Result<Response> {
    let target = service.download(&id).await?;
    debug!("Streaming {} ({} bytes)", target.path.display(), target.file_size);

    let chunk_size = service.chunk_size();
    let chunks = futures::stream::try_unfold(target.file, move |mut file| async move {
        let mut buf = vec![0u8; chunk_size];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(read);
        Ok(Some((Bytes::from(buf), file)))
    });

    let headers = [
        (header::CONTENT_TYPE, target.mime_type),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&target.filename),
        ),
        (header::CONTENT_LENGTH, target.file_size.to_string()),
    ];

    Ok((headers, Body::from_stream(chunks)).into_response())
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
