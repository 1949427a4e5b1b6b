//! Quality-gated enhancement pipeline.
//!
//! ```text
//! START → ASSESS ─┬─ decode error ──────────────→ store original (could_not_upscale) → ERROR
//!                 ├─ score ≥ threshold ─────────→ STORE_GOOD (good_quality) → SUCCESS | ERROR
//!                 └─ score < threshold → ENHANCE ─┬─ failure → store original (could_not_upscale) → ERROR
//!                                                 └─ success → STORE_ENHANCED (upscaled) → SUCCESS | ERROR
//! ```
//!
//! Every call ends in a fully populated [`ProcessingResult`]; errors never
//! propagate past [`PipelineOrchestrator::process`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use visioncloud_core::{Category, PipelineConfig, ProcessingResult, ProcessingStatus};
use visioncloud_storage::Storage;

use crate::enhance::{Enhancer, ScriptEnhancer};
use crate::error::ProcessingError;
use crate::quality::QualityAssessor;

/// Facts gathered while an image moves through the pipeline, turned into a
/// [`ProcessingResult`] exactly once at a terminal state.
struct Draft {
    original_key: String,
    processed_at: DateTime<Utc>,
    quality_score: f64,
    upscale_scale: Option<u32>,
}

impl Draft {
    fn new(key: &str) -> Self {
        Self {
            original_key: key.to_string(),
            processed_at: Utc::now(),
            quality_score: 0.0,
            upscale_scale: None,
        }
    }

    fn succeed(self, category: Category, locator: String) -> ProcessingResult {
        ProcessingResult {
            original_key: self.original_key,
            status: ProcessingStatus::Success,
            category,
            storage_locator: Some(locator),
            error_message: None,
            processed_at: self.processed_at,
            quality_score: self.quality_score,
            upscale_scale: self.upscale_scale,
        }
    }

    fn fail(self, category: Category, message: String, locator: Option<String>) -> ProcessingResult {
        ProcessingResult {
            original_key: self.original_key,
            status: ProcessingStatus::Error,
            category,
            storage_locator: locator,
            error_message: Some(message),
            processed_at: self.processed_at,
            quality_score: self.quality_score,
            upscale_scale: self.upscale_scale,
        }
    }
}

/// Stateless orchestrator; safe to share across concurrent callers.
pub struct PipelineOrchestrator {
    assessor: QualityAssessor,
    enhancer: Arc<dyn Enhancer>,
    storage: Arc<dyn Storage>,
    upscale_scale: u32,
    batch_concurrency: usize,
}

impl PipelineOrchestrator {
    pub fn new(
        config: &PipelineConfig,
        enhancer: Arc<dyn Enhancer>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            assessor: QualityAssessor::new(config.quality_threshold()),
            enhancer,
            storage,
            upscale_scale: config.upscale_scale(),
            batch_concurrency: config.batch_concurrency().max(1),
        }
    }

    /// Orchestrator driving the configured external upscaling script.
    pub fn with_script_enhancer(config: &PipelineConfig, storage: Arc<dyn Storage>) -> Self {
        let enhancer = Arc::new(ScriptEnhancer::new(config.enhancer.clone()));
        Self::new(config, enhancer, storage)
    }

    pub fn quality_threshold(&self) -> f64 {
        self.assessor.threshold()
    }

    pub fn upscale_scale(&self) -> u32 {
        self.upscale_scale
    }

    /// Run one image through assess → (enhance) → store.
    #[tracing::instrument(skip(self, cancel, data), fields(size_bytes = data.len()))]
    pub async fn process(
        &self,
        cancel: &CancellationToken,
        data: Bytes,
        key: &str,
    ) -> ProcessingResult {
        let mut draft = Draft::new(key);

        // ASSESS
        let assessment = match self.assessor.assess(&data) {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Quality assessment failed");
                let message = format!("Quality assessment failed: {}", e);
                return self.fail_with_fallback(cancel, draft, message, data).await;
            }
        };

        draft.quality_score = assessment.score();

        tracing::info!(
            key = %key,
            width = assessment.width(),
            height = assessment.height(),
            format = %assessment.format(),
            score = assessment.score(),
            threshold = self.assessor.threshold(),
            "Image assessed"
        );

        // DECIDE → STORE_GOOD
        if self.assessor.is_good_quality(&assessment) {
            tracing::debug!(key = %key, "Storing original as good quality");
            return match self.store(cancel, Category::GoodQuality, key, data).await {
                Ok(locator) => draft.succeed(Category::GoodQuality, locator),
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Failed to store good quality image");
                    let message = format!("Failed to upload good quality image: {}", e);
                    draft.fail(Category::GoodQuality, message, None)
                }
            };
        }

        // ENHANCE
        draft.upscale_scale = Some(self.upscale_scale);
        tracing::debug!(key = %key, scale = self.upscale_scale, "Enhancing image");

        let enhanced = match self
            .enhancer
            .enhance(cancel, data.clone(), self.upscale_scale)
            .await
        {
            Ok(enhanced) => enhanced,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    cancelled = e.is_cancellation(),
                    "Enhancement failed"
                );
                let message = format!("Upscaling failed: {}", e);
                return self.fail_with_fallback(cancel, draft, message, data).await;
            }
        };

        // STORE_ENHANCED
        match self.store(cancel, Category::Upscaled, key, enhanced).await {
            Ok(locator) => draft.succeed(Category::Upscaled, locator),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to store upscaled image");
                let message = format!("Failed to upload upscaled image: {}", e);
                draft.fail(Category::Upscaled, message, None)
            }
        }
    }

    /// Run every entry through [`Self::process`] independently.
    ///
    /// Up to the configured batch concurrency runs at once; results come back
    /// in completion order, one per input key.
    pub async fn process_batch(
        &self,
        cancel: &CancellationToken,
        images: HashMap<String, Bytes>,
    ) -> Vec<ProcessingResult> {
        let total = images.len();

        let results: Vec<ProcessingResult> = stream::iter(images)
            .map(|(key, data)| async move { self.process(cancel, data, &key).await })
            .buffer_unordered(self.batch_concurrency)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            total,
            succeeded,
            failed = total - succeeded,
            "Batch processing completed"
        );

        results
    }

    /// Best-effort placement of the original bytes into `could_not_upscale`.
    /// A failure here is appended to, never substituted for, the primary error.
    async fn fail_with_fallback(
        &self,
        cancel: &CancellationToken,
        draft: Draft,
        message: String,
        original: Bytes,
    ) -> ProcessingResult {
        let key = draft.original_key.clone();
        match self
            .store(cancel, Category::CouldNotUpscale, &key, original)
            .await
        {
            Ok(locator) => draft.fail(Category::CouldNotUpscale, message, Some(locator)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Fallback store to could_not_upscale failed");
                let message = format!(
                    "{}; fallback store to {} also failed: {}",
                    message,
                    Category::CouldNotUpscale,
                    e
                );
                draft.fail(Category::CouldNotUpscale, message, None)
            }
        }
    }

    async fn store(
        &self,
        cancel: &CancellationToken,
        category: Category,
        key: &str,
        data: Bytes,
    ) -> Result<String, ProcessingError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProcessingError::Cancelled),
            result = self.storage.put(category, key, data) => result.map_err(ProcessingError::from),
        }
    }
}
