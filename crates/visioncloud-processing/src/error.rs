//! Processing error types
//!
//! One variant per failure the pipeline distinguishes. None of these escape
//! [`crate::PipelineOrchestrator::process`]; they are rendered into
//! `ProcessingResult::error_message` instead.

use std::path::PathBuf;
use std::time::Duration;

use visioncloud_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("failed to decode image header: {0}")]
    Decode(String),

    #[error("scratch file error: {0}")]
    ScratchIo(#[source] std::io::Error),

    #[error("failed to launch enhancement process `{program}`: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("enhancement process failed ({exit}): {diagnostic}")]
    ProcessExecution { exit: String, diagnostic: String },

    #[error("enhanced image not created at {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("failed to read enhanced image {}: {source}", .path.display())]
    OutputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("enhancement timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl ProcessingError {
    /// Deadline exceeded or explicit cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProcessingError::Cancelled | ProcessingError::TimedOut(_))
    }
}
