//! VisionCloud Core Library
//!
//! This crate provides the domain models, storage categories, configuration and
//! error types shared by the storage, processing and CLI crates.

pub mod category;
pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use category::Category;
pub use config::{Config, EnhancerConfig, PipelineConfig, StorageConfig};
pub use error::ConfigError;
pub use models::{ProcessingResult, ProcessingStatus};
pub use storage_types::StorageBackend;
