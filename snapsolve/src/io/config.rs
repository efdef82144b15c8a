//! Service configuration stored in `snapsolve.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "snapsolve.toml";
/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "SNAPSOLVE_CONFIG";

/// Top-level configuration (TOML).
///
/// Every section is optional; missing fields fall back to defaults that work
/// against the hosted OpenAI API with a local V4L2 camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub solve: SolveConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the chat-completions compatible API.
    pub base_url: String,
    /// Vision-capable model with structured output support.
    pub name: String,
    /// Environment variable holding the API credential.
    pub api_key_env: String,
    /// Upper bound on one model request, in seconds.
    pub timeout_secs: u64,
    /// Name attached to the structured output schema in the request.
    pub schema_name: String,
    /// Image detail hint (`auto`, `low`, `high`).
    pub image_detail: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            name: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            schema_name: "event".to_string(),
            image_detail: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolveConfig {
    /// Fail with a model output error instead of returning the one-step
    /// `Execution error` result when the model output is unusable.
    pub strict_output: bool,
    /// Log the full image payload at `trace` level.
    pub log_image_payload: bool,
    /// Largest accepted image payload (data URL text), in bytes.
    pub max_image_bytes: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            strict_output: false,
            log_image_payload: false,
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Which way the camera faces; used to pick a default device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Environment,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device passed to the capture command as `{device}`.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
    /// Capture command argv. `{device}`, `{width}` and `{height}` are
    /// replaced before spawning; the frame is read from stdout.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Frames larger than this are rejected.
    pub output_limit_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 1280,
            height: 720,
            facing: Facing::Environment,
            command: [
                "ffmpeg",
                "-loglevel",
                "error",
                "-f",
                "video4linux2",
                "-video_size",
                "{width}x{height}",
                "-i",
                "{device}",
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-vcodec",
                "mjpeg",
                "-",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            timeout_secs: 10,
            output_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl CaptureConfig {
    /// Capture argv with placeholders filled in.
    pub fn resolved_command(&self) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| {
                arg.replace("{device}", &self.device)
                    .replace("{width}", &self.width.to_string())
                    .replace("{height}", &self.height.to_string())
            })
            .collect()
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.model.base_url.trim().is_empty() {
            return Err(anyhow!("model.base_url must be non-empty"));
        }
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must be non-empty"));
        }
        if self.model.api_key_env.trim().is_empty() {
            return Err(anyhow!("model.api_key_env must be non-empty"));
        }
        if self.model.timeout_secs == 0 {
            return Err(anyhow!("model.timeout_secs must be > 0"));
        }
        if !matches!(self.model.image_detail.as_str(), "auto" | "low" | "high") {
            return Err(anyhow!("model.image_detail must be one of auto, low, high"));
        }
        if self.solve.max_image_bytes == 0 {
            return Err(anyhow!("solve.max_image_bytes must be > 0"));
        }
        if self.capture.command.is_empty() || self.capture.command[0].trim().is_empty() {
            return Err(anyhow!("capture.command must be a non-empty array"));
        }
        if self.capture.timeout_secs == 0 {
            return Err(anyhow!("capture.timeout_secs must be > 0"));
        }
        if self.capture.output_limit_bytes == 0 {
            return Err(anyhow!("capture.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Resolve the config path: explicit flag, then `SNAPSOLVE_CONFIG`, then the default file.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read the API credential named by `model.api_key_env`.
pub fn read_api_key(model: &ModelConfig) -> Result<String> {
    let key = std::env::var(&model.api_key_env)
        .with_context(|| format!("read API key from ${}", model.api_key_env))?;
    if key.trim().is_empty() {
        return Err(anyhow!("${} is set but empty", model.api_key_env));
    }
    Ok(key)
}
