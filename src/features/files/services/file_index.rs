use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::core::error::Result;
use crate::features::files::models::{FileFilter, FileQuery, FileRecord, FileRecordPatch};
use crate::shared::types::QueryPage;

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id already exists; nothing was written
    Duplicate,
}

/// Persistent metadata index of stored files, keyed by content digest.
///
/// The `id` primary key is what enforces one row per digest: concurrent
/// inserts of the same digest race on the constraint and exactly one wins.
pub struct FileIndex {
    pool: SqlitePool,
}

impl FileIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent, runs on every start
    pub async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY NOT NULL,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                file_path TEXT NOT NULL,
                upload_time TEXT NOT NULL,
                description TEXT,
                uploader TEXT,
                download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0),
                is_deleted INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_files_active_upload_time
            ON files (is_deleted, upload_time DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("File index schema ready");
        Ok(())
    }

    pub async fn insert(&self, record: &FileRecord) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO files (
                id, filename, file_type, file_size, file_path, upload_time,
                description, uploader, download_count, is_deleted
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.file_type)
        .bind(record.file_size)
        .bind(&record.file_path)
        .bind(record.upload_time)
        .bind(&record.description)
        .bind(&record.uploader)
        .bind(record.download_count)
        .bind(record.is_deleted)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!("Insert lost the race for id={}", record.id);
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Point lookup; soft-deleted rows are returned as-is
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Apply the set fields of `patch`. Returns whether a row matched;
    /// an empty patch touches nothing and reports `false`.
    pub async fn update(&self, id: &str, patch: &FileRecordPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE files SET ");
        let mut assignments = builder.separated(", ");
        if let Some(is_deleted) = patch.is_deleted {
            assignments.push("is_deleted = ").push_bind_unseparated(is_deleted);
        }
        if let Some(description) = &patch.description {
            assignments
                .push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(uploader) = &patch.uploader {
            assignments
                .push("uploader = ")
                .push_bind_unseparated(uploader.clone());
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically add one to the download counter of a live row
    pub async fn increment_download_count(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET download_count = download_count + 1
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Equality-filtered, sorted, paginated listing. `total` is counted over
    /// the filtered set before skip/limit.
    pub async fn query(&self, query: &FileQuery) -> Result<QueryPage<FileRecord>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM files");
        push_filters(&mut count, &query.filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM files");
        push_filters(&mut select, &query.filters);
        if let Some(sort_by) = query.sort_by {
            select
                .push(" ORDER BY ")
                .push(sort_by.column())
                .push(" ")
                .push(query.sort_order.as_sql())
                .push(", id ASC");
        }
        select
            .push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.skip);

        let items = select
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(QueryPage::new(total, items, query.skip, query.limit))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &[FileFilter]) {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            FileFilter::IsDeleted(value) => {
                builder.push("is_deleted = ").push_bind(*value);
            }
            FileFilter::Uploader(value) => {
                builder.push("uploader = ").push_bind(value.clone());
            }
            FileFilter::FileType(value) => {
                builder.push("file_type = ").push_bind(value.clone());
            }
            FileFilter::Filename(value) => {
                builder.push("filename = ").push_bind(value.clone());
            }
        }
    }
}
