mod file;

pub use file::{
    DownloadTarget, FileFilter, FileQuery, FileRecord, FileRecordPatch, FileSortBy, SortOrder,
    UploadMetadata, UploadOutcome,
};
