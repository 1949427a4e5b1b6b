//! External upscaler invocation.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use visioncloud_core::EnhancerConfig;

use super::scratch::ScratchFiles;
use super::Enhancer;
use crate::error::ProcessingError;

/// Keep only the tail of very chatty diagnostic output.
const MAX_DIAGNOSTIC_CHARS: usize = 4096;

/// Runs the configured upscaling script as a child process:
///
/// `[interpreter] <script> --input <in> --output <out> --scale <n>`
///
/// Exit code 0 means success and the enhanced image is read back from the
/// output path. Any other exit code is a failure whose stderr becomes the
/// diagnostic text.
pub struct ScriptEnhancer {
    config: EnhancerConfig,
}

impl ScriptEnhancer {
    pub fn new(config: EnhancerConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> String {
        match self.config.interpreter {
            Some(ref interpreter) => interpreter.clone(),
            None => self.config.script_path.display().to_string(),
        }
    }

    fn command(&self, input: &Path, output: &Path, scale: u32) -> Command {
        let mut command = match self.config.interpreter {
            Some(ref interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(&self.config.script_path);
                command
            }
            None => Command::new(&self.config.script_path),
        };

        command
            .arg("--input")
            .arg(input)
            .arg("--output")
            .arg(output)
            .arg("--scale")
            .arg(scale.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        command
    }

    async fn read_output(path: &Path) -> Result<Bytes, ProcessingError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Err(ProcessingError::OutputMissing(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProcessingError::OutputMissing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ProcessingError::OutputRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|source| ProcessingError::OutputRead {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Bytes::from(data))
    }
}

fn diagnostic_text(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= MAX_DIAGNOSTIC_CHARS {
        text.to_string()
    } else {
        let tail: String = text.chars().skip(count - MAX_DIAGNOSTIC_CHARS).collect();
        format!("...{}", tail)
    }
}

#[async_trait]
impl Enhancer for ScriptEnhancer {
    #[tracing::instrument(skip(self, cancel, data), fields(size_bytes = data.len()))]
    async fn enhance(
        &self,
        cancel: &CancellationToken,
        data: Bytes,
        scale: u32,
    ) -> Result<Bytes, ProcessingError> {
        let start = std::time::Instant::now();

        // Dropped on every return below, removing the private scratch directory.
        let scratch = ScratchFiles::allocate(&self.config.scratch_dir)
            .await
            .map_err(ProcessingError::ScratchIo)?;

        tokio::fs::write(scratch.input(), &data)
            .await
            .map_err(ProcessingError::ScratchIo)?;

        let child = self
            .command(scratch.input(), scratch.output(), scale)
            .spawn()
            .map_err(|source| ProcessingError::ProcessLaunch {
                program: self.program(),
                source,
            })?;

        tracing::debug!(
            program = %self.program(),
            input = %scratch.input().display(),
            output = %scratch.output().display(),
            "Enhancement process started"
        );

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Enhancement cancelled, process killed"
                );
                return Err(ProcessingError::Cancelled);
            }
            waited = tokio::time::timeout(self.config.timeout, child.wait_with_output()) => {
                match waited {
                    Ok(result) => result.map_err(|e| ProcessingError::ProcessExecution {
                        exit: "wait failed".to_string(),
                        diagnostic: e.to_string(),
                    })?,
                    Err(_) => {
                        tracing::warn!(
                            timeout_secs = self.config.timeout.as_secs(),
                            "Enhancement timed out, process killed"
                        );
                        return Err(ProcessingError::TimedOut(self.config.timeout));
                    }
                }
            }
        };

        if !output.status.success() {
            let diagnostic = diagnostic_text(&output.stderr);
            tracing::error!(
                status = %output.status,
                diagnostic = %diagnostic,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Enhancement process failed"
            );
            return Err(ProcessingError::ProcessExecution {
                exit: output.status.to_string(),
                diagnostic,
            });
        }

        let enhanced = Self::read_output(scratch.output()).await?;

        tracing::info!(
            scale,
            input_bytes = data.len(),
            output_bytes = enhanced.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Enhancement successful"
        );

        Ok(enhanced)
    }
}
