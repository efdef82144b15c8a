//! Solve service: one image in, rendered steps out.
//!
//! Flow per request:
//! 1. Reject empty or oversized payloads before any model call.
//! 2. Normalize the payload into a `data:` URL.
//! 3. Send the contract prompt, image and output schema to the model under a
//!    timeout.
//! 4. Validate the output; unusable output degrades to the single
//!    `Execution error` step unless strict mode is on.
//! 5. Run the step pipeline.
//!
//! The service holds no per-request state, so one instance serves concurrent
//! requests. Dropping a `solve` future abandons the outstanding model call.

use std::time::Duration;

use anyhow::anyhow;
use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use crate::core::image::normalize_image_payload;
use crate::core::pipeline::{check_placeholders, solve_steps};
use crate::core::types::{SolveOutcome, Step};
use crate::error::SolveError;
use crate::io::config::Config;
use crate::io::model::{ModelClient, ModelRequest};
use crate::io::prompt::render_solve_prompt;
use crate::io::schema::{parse_solution, solution_schema};

/// Per-service knobs, derived from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveSettings {
    pub timeout: Duration,
    pub schema_name: String,
    pub strict_output: bool,
    pub log_image_payload: bool,
    pub max_image_bytes: usize,
}

impl SolveSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.model.timeout_secs),
            schema_name: config.model.schema_name.clone(),
            strict_output: config.solve.strict_output,
            log_image_payload: config.solve.log_image_payload,
            max_image_bytes: config.solve.max_image_bytes,
        }
    }
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct SolveService<M> {
    model: M,
    settings: SolveSettings,
    prompt: String,
    schema: Value,
}

impl<M: ModelClient> SolveService<M> {
    /// Build a service; renders the prompt and loads the schema once.
    pub fn new(model: M, settings: SolveSettings) -> anyhow::Result<Self> {
        Ok(Self {
            model,
            settings,
            prompt: render_solve_prompt()?,
            schema: solution_schema()?,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn settings(&self) -> &SolveSettings {
        &self.settings
    }

    #[instrument(skip_all, fields(model = %self.model.name(), payload_bytes = image.len()))]
    pub async fn solve(&self, image: &str) -> Result<SolveOutcome, SolveError> {
        let image_url = self.check_payload(image)?;
        if self.settings.log_image_payload {
            trace!(payload = %image_url, "image payload");
        }

        let request = ModelRequest {
            system_prompt: self.prompt.clone(),
            image_url,
            schema_name: self.settings.schema_name.clone(),
            schema: self.schema.clone(),
        };

        let raw = match tokio::time::timeout(self.settings.timeout, self.model.complete(&request))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(error = %format!("{:#}", err), "model request failed");
                return Err(SolveError::ModelRequest(err));
            }
            Err(_) => {
                warn!(timeout = ?self.settings.timeout, "model request timed out");
                return Err(SolveError::ModelTimeout(self.settings.timeout));
            }
        };

        let parsed = raw
            .ok_or_else(|| anyhow!("model returned no content"))
            .and_then(|text| parse_solution(&text));
        let solution = match parsed {
            Ok(solution) => solution,
            Err(err) => {
                let reason = format!("{:#}", err);
                if self.settings.strict_output {
                    return Err(SolveError::ModelOutput(reason));
                }
                warn!(reason = %reason, "unusable model output, returning execution error");
                return Ok(SolveOutcome::Degraded {
                    result: solve_steps(&[Step::execution_error()]),
                    reason,
                });
            }
        };

        let report = check_placeholders(&solution.steps);
        if !report.is_clean() {
            debug!(
                redefined = ?report.redefined,
                undefined = ?report.undefined,
                "placeholder naming issues"
            );
        }

        let result = solve_steps(&solution.steps);
        info!(
            steps = result.steps.len(),
            failed_steps = result.step_errors().len(),
            "solved"
        );
        Ok(SolveOutcome::Solved(result))
    }

    fn check_payload(&self, image: &str) -> Result<String, SolveError> {
        let image = image.trim();
        if image.is_empty() {
            return Err(SolveError::InvalidInput("image is empty".to_string()));
        }
        if image.len() > self.settings.max_image_bytes {
            return Err(SolveError::InvalidInput(format!(
                "image payload is {} bytes, limit is {}",
                image.len(),
                self.settings.max_image_bytes
            )));
        }
        let url = normalize_image_payload(image);
        if url.starts_with("data:") && url.split_once(',').is_none_or(|(_, data)| data.is_empty()) {
            return Err(SolveError::InvalidInput("image data is empty".to_string()));
        }
        Ok(url)
    }
}
