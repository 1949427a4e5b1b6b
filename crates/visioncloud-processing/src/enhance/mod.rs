//! Image enhancement
//!
//! The pipeline only depends on the [`Enhancer`] capability, so tests can
//! substitute canned results without spawning processes or touching disk.

pub mod scratch;
pub mod script;

pub use scratch::ScratchFiles;
pub use script::ScriptEnhancer;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessingError;

#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Return `data` enhanced by `scale`× linear dimensions.
    ///
    /// Must return promptly with [`ProcessingError::Cancelled`] once `cancel`
    /// fires, releasing any resources it acquired.
    async fn enhance(
        &self,
        cancel: &CancellationToken,
        data: Bytes,
        scale: u32,
    ) -> Result<Bytes, ProcessingError>;
}
