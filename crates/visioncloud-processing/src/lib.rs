//! VisionCloud Image Processing Library
//!
//! This crate implements the quality-gated enhancement pipeline:
//!
//! 1. [`QualityAssessor`] scores an image from its header dimensions.
//! 2. Images below the threshold go through an [`Enhancer`], by default the
//!    external upscaling script driven by [`ScriptEnhancer`].
//! 3. [`PipelineOrchestrator`] stores the outcome under a [`Category`] and
//!    returns a [`ProcessingResult`] describing exactly what happened.

pub mod enhance;
pub mod error;
pub mod pipeline;
pub mod quality;

// Re-export commonly used types
pub use enhance::{Enhancer, ScratchFiles, ScriptEnhancer};
pub use error::ProcessingError;
pub use pipeline::PipelineOrchestrator;
pub use quality::{QualityAssessment, QualityAssessor, REFERENCE_AREA};
pub use tokio_util::sync::CancellationToken;
pub use visioncloud_core::{Category, ProcessingResult, ProcessingStatus};
