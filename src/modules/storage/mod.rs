//! Storage module for file management
//!
//! Single-pass hashing, deterministic path layout and staged local
//! persistence for the content-addressed file store.

pub mod hashing;
mod local_storage;
pub mod path_layout;

pub use hashing::{copy_hashed, digest_file, ContentDigest, SpoolError, SpoolWriter};
pub use local_storage::{LocalStorage, StagedBlob};
