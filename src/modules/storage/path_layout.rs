//! Deterministic on-disk layout: `<root>/<digest>/<filename>`
//!
//! Each digest owns a directory, so two different payloads never collide
//! even when they share a filename.

use std::path::{Path, PathBuf};

/// Name used when the client-supplied filename has no usable final component
pub const FALLBACK_FILENAME: &str = "unnamed";

/// Longest single path component common filesystems accept, in bytes
pub const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Clone)]
pub struct PathLayout {
    root: PathBuf,
}

impl PathLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shard_dir(&self, digest: &str) -> PathBuf {
        self.root.join(digest)
    }

    /// Final location for `filename` under the shard of `digest`.
    /// Pure: no filesystem access.
    pub fn path_for(&self, digest: &str, filename: &str) -> PathBuf {
        self.shard_dir(digest).join(sanitize_filename(filename))
    }

    /// Same as [`path_for`](Self::path_for) but creates the shard directory.
    /// Safe to call concurrently for the same digest.
    pub async fn prepare(&self, digest: &str, filename: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(self.shard_dir(digest)).await?;
        Ok(self.path_for(digest, filename))
    }
}

/// Reduce a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators so names coming from Windows
/// clients cannot climb out of the shard directory either.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .replace('\0', "");

    match last.trim() {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        name => truncate_filename(name),
    }
}

/// Cap a name at [`MAX_FILENAME_BYTES`] on a char boundary, cutting the stem
/// so a short extension survives.
fn truncate_filename(name: &str) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name.to_string();
    }

    let ext = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 16 => &name[dot..],
        _ => "",
    };
    let mut end = MAX_FILENAME_BYTES - ext.len();
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &name[..end], ext)
}
