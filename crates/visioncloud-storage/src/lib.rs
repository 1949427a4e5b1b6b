//! VisionCloud Storage Library
//!
//! This crate provides the storage abstraction used by the processing pipeline
//! and its implementations for S3 and the local filesystem.
//!
//! # Object address format
//!
//! Every object lives under a category prefix: `{category}/{key}`, e.g.
//! `upscaled/holiday.png`. Keys must not be empty, contain `..` or `\`, or
//! start with `/`. Address generation is centralized in the `keys` module so
//! all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use visioncloud_core::{Category, StorageBackend};
