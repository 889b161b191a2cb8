pub mod file_index;
pub mod file_service;

pub use file_index::FileIndex;
pub use file_service::{FileService, PendingUpload};
