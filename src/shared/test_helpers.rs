#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::core::config::{DatabaseConfig, StorageConfig};
#[cfg(test)]
use crate::core::database;
#[cfg(test)]
use crate::features::files::services::{FileIndex, FileService};

/// Scratch storage root, SQLite index and the service wired on top of them.
/// The temp directory lives as long as the fixture.
#[cfg(test)]
pub struct TestStore {
    pub dir: tempfile::TempDir,
    pub index: Arc<FileIndex>,
    pub service: Arc<FileService>,
}

#[cfg(test)]
impl TestStore {
    pub fn import_dir(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }
}

#[cfg(test)]
pub fn test_storage_config(base: &std::path::Path) -> StorageConfig {
    StorageConfig {
        root_dir: base.join("uploads"),
        max_upload_size: 1024,
        allowed_mime_types: vec![
            "text/plain".to_string(),
            "image/png".to_string(),
            "application/octet-stream".to_string(),
        ],
        chunk_size: 4,
        import_dir: base.join("downloads"),
    }
}

#[cfg(test)]
pub async fn create_test_store() -> TestStore {
    create_test_store_with(|_| {}).await
}

#[cfg(test)]
pub async fn create_test_store_with(customize: impl FnOnce(&mut StorageConfig)) -> TestStore {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = test_storage_config(dir.path());
    customize(&mut storage);
    std::fs::create_dir_all(&storage.import_dir).unwrap();

    let db_config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("index.db").display()),
        max_connections: 4,
        min_connections: 1,
        acquire_timeout_secs: 5,
        idle_timeout_secs: 60,
        max_lifetime_secs: 300,
    };
    let pool = database::create_pool(&db_config).await.unwrap();

    let index = Arc::new(FileIndex::new(pool));
    index.create_schema().await.unwrap();

    let service = Arc::new(FileService::new(Arc::clone(&index), storage).await.unwrap());

    TestStore {
        dir,
        index,
        service,
    }
}
