/// Default number of records returned by list endpoints
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Maximum number of records a single list call may return
pub const MAX_LIST_LIMIT: i64 = 1000;

// =============================================================================
// FILE STORE DEFAULTS
// =============================================================================

/// Maximum upload size in bytes (10MB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Read/write chunk size used while hashing and streaming file bodies
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// MIME types accepted when no allow-list is configured
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Fallback MIME type when neither the caller nor the extension says otherwise
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
