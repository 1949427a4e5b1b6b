//! Pipeline result model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Success,
    Error,
}

/// Record of what happened to a single image.
///
/// Assembled once per pipeline invocation and handed to the caller. Holds:
///
/// - `status == Success` ⇒ `storage_locator` is `Some` and `error_message` is `None`
/// - `status == Error` ⇒ `error_message` is `Some`; `storage_locator` may be `Some`
///   when the best-effort store into `could_not_upscale` succeeded
/// - `upscale_scale` is `Some` only when the image scored below the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub original_key: String,
    pub status: ProcessingStatus,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale_scale: Option<u32>,
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}
