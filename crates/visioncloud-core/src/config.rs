//! Configuration module
//!
//! Environment variables are read exactly once, in [`Config::from_env`], and
//! turned into plain value objects. Components receive those values at
//! construction and never consult the environment themselves.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::storage_types::StorageBackend;

pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_UPSCALE_SCALE: u32 = 2;
const DEFAULT_UPSCALE_INTERPRETER: &str = "python3";
const DEFAULT_UPSCALE_SCRIPT: &str = "../python/upscaler/upscale.py";
const DEFAULT_UPSCALE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_BATCH_CONCURRENCY: usize = 4;
const DEFAULT_S3_BUCKET: &str = "visioncloud-bucket";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data";
const SCRATCH_DIR_NAME: &str = "visioncloud";

/// How the external enhancement tool is launched.
#[derive(Clone, Debug)]
pub struct EnhancerConfig {
    /// Program that runs the script (e.g. `python3`). `None` executes the script directly.
    pub interpreter: Option<String>,
    pub script_path: PathBuf,
    /// Dedicated directory for ephemeral input/output files.
    pub scratch_dir: PathBuf,
    /// Upper bound on a single invocation.
    pub timeout: Duration,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            interpreter: Some(DEFAULT_UPSCALE_INTERPRETER.to_string()),
            script_path: PathBuf::from(DEFAULT_UPSCALE_SCRIPT),
            scratch_dir: env::temp_dir().join(SCRATCH_DIR_NAME),
            timeout: Duration::from_secs(DEFAULT_UPSCALE_TIMEOUT_SECS),
        }
    }
}

/// Read-only settings for the processing pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    quality_threshold: f64,
    upscale_scale: u32,
    batch_concurrency: usize,
    pub enhancer: EnhancerConfig,
}

impl PipelineConfig {
    /// Out-of-range values are normalised rather than rejected: the threshold
    /// is clamped into `[0, 1]` and a non-positive scale falls back to 2.
    pub fn new(quality_threshold: f64, upscale_scale: i64, enhancer: EnhancerConfig) -> Self {
        Self {
            quality_threshold: clamp_threshold(quality_threshold),
            upscale_scale: normalize_scale(upscale_scale),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            enhancer,
        }
    }

    pub fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = batch_concurrency.max(1);
        self
    }

    pub fn quality_threshold(&self) -> f64 {
        self.quality_threshold
    }

    pub fn upscale_scale(&self) -> u32 {
        self.upscale_scale
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_QUALITY_THRESHOLD,
            i64::from(DEFAULT_UPSCALE_SCALE),
            EnhancerConfig::default(),
        )
    }
}

/// Storage backend selection and its settings.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: PathBuf,
    pub local_storage_base_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let quality_threshold = get("QUALITY_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_QUALITY_THRESHOLD);

        let upscale_scale = get("UPSCALE_SCALE")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(i64::from(DEFAULT_UPSCALE_SCALE));

        // An explicitly empty interpreter means "run the script directly".
        let interpreter = match lookup("UPSCALE_INTERPRETER") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_UPSCALE_INTERPRETER.to_string()),
        };

        let timeout_secs = get("UPSCALE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_UPSCALE_TIMEOUT_SECS);

        let enhancer = EnhancerConfig {
            interpreter,
            script_path: get("UPSCALE_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPSCALE_SCRIPT)),
            scratch_dir: get("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join(SCRATCH_DIR_NAME)),
            timeout: Duration::from_secs(timeout_secs),
        };

        let batch_concurrency = get("BATCH_CONCURRENCY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY);

        let pipeline = PipelineConfig::new(quality_threshold, upscale_scale, enhancer)
            .with_batch_concurrency(batch_concurrency);

        let backend = match get("STORAGE_BACKEND") {
            Some(v) => v.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: get("S3_BUCKET").unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
            s3_region: get("S3_REGION")
                .or_else(|| get("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            s3_endpoint: get("S3_ENDPOINT"),
            local_storage_path: get("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH)),
            local_storage_base_url: get("LOCAL_STORAGE_BASE_URL"),
        };

        let config = Config { pipeline, storage };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.enhancer.script_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("UPSCALE_SCRIPT"));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3_bucket.trim().is_empty() {
            return Err(ConfigError::Missing("S3_BUCKET"));
        }
        Ok(())
    }
}

fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_QUALITY_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

fn normalize_scale(scale: i64) -> u32 {
    if scale <= 0 {
        DEFAULT_UPSCALE_SCALE
    } else {
        u32::try_from(scale).unwrap_or(u32::MAX)
    }
}
