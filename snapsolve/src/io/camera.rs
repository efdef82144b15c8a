//! Still-frame sources for the capture component.
//!
//! The [`FrameSource`] trait hides where a frame comes from: a camera grab
//! through an external capture command, or an image file on disk. Tests use
//! in-memory sources.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use crate::core::image::{DEFAULT_MIME, encode_data_url, sniff_mime};
use crate::io::config::{CaptureConfig, Facing};
use crate::io::process::run_command_with_timeout;

/// One still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn mime(&self) -> &'static str {
        sniff_mime(&self.bytes).unwrap_or(DEFAULT_MIME)
    }

    /// Encode as a base64 `data:` URL, the payload the solve service takes.
    pub fn to_data_url(&self) -> String {
        encode_data_url(&self.bytes)
    }
}

/// Abstraction over frame acquisition.
pub trait FrameSource {
    /// Grab one frame. `Ok(None)` means no frame was available.
    fn grab(&self) -> Result<Option<Frame>>;
}

/// Grabs a frame by running the configured capture command and reading stdout.
#[derive(Debug, Clone)]
pub struct CommandFrameSource {
    argv: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
    facing: Facing,
}

impl CommandFrameSource {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            argv: config.resolved_command(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
            facing: config.facing,
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl FrameSource for CommandFrameSource {
    #[instrument(skip_all, fields(program = %self.argv.first().map(String::as_str).unwrap_or_default(), facing = ?self.facing))]
    fn grab(&self) -> Result<Option<Frame>> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| anyhow!("capture command is empty"))?;
        info!("grabbing camera frame");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run capture command {}", program))?;

        if output.timed_out {
            return Err(anyhow!("capture command timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "capture command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text()
            ));
        }
        if output.stdout_truncated > 0 {
            return Err(anyhow!(
                "captured frame exceeds {} bytes",
                self.output_limit_bytes
            ));
        }
        if output.stdout.is_empty() {
            debug!("capture command produced no frame");
            return Ok(None);
        }

        debug!(bytes = output.stdout.len(), "captured frame");
        Ok(Some(Frame::new(output.stdout)))
    }
}

/// Reads a frame from an image file.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    fn grab(&self) -> Result<Option<Frame>> {
        let bytes =
            fs::read(&self.path).with_context(|| format!("read image {}", self.path.display()))?;
        if bytes.is_empty() {
            debug!(path = %self.path.display(), "image file is empty");
            return Ok(None);
        }
        Ok(Some(Frame::new(bytes)))
    }
}
