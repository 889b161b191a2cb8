use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, get_file, import_local_file, list_files, upload_file,
};
use crate::features::files::services::FileService;

/// Room for multipart boundaries and the text fields around the file part
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    let upload_limit = usize::try_from(file_service.max_upload_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/api/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files/import", post(import_local_file))
        .route("/api/files", get(list_files))
        .route("/api/files/{file_id}", get(get_file).delete(delete_file))
        .route("/api/files/{file_id}/download", get(download_file))
        .with_state(file_service)
}
