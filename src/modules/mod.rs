//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for the local filesystem the file store writes into.

pub mod storage;
