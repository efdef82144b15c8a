//! Submission of captured images to a solve service.
//!
//! [`SubmitRequest`] and [`SubmitResponse`] are the `/api/submitImage` wire
//! shapes, shared by the HTTP server and the remote submitter.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::types::{SolveOutcome, SolveResult};

/// Path of the image submission endpoint.
pub const SUBMIT_PATH: &str = "/api/submitImage";

/// Request body: the image as a `data:` URL or bare base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub imageb64: String,
}

/// Failure of one step's assignment snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub step: usize,
    pub message: String,
}

/// Response body: one fragment list per step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub steps: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_errors: Vec<StepError>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl From<&SolveResult> for SubmitResponse {
    fn from(result: &SolveResult) -> Self {
        Self {
            steps: result.fragments(),
            step_errors: result
                .step_errors()
                .into_iter()
                .map(|(step, message)| StepError { step, message })
                .collect(),
            degraded: false,
        }
    }
}

impl From<&SolveOutcome> for SubmitResponse {
    fn from(outcome: &SolveOutcome) -> Self {
        Self {
            degraded: outcome.is_degraded(),
            ..Self::from(outcome.result())
        }
    }
}

/// Abstraction over where captured images are solved.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, image_url: &str) -> Result<SubmitResponse>;
}

/// Posts images to a running `snapsolve-server`.
pub struct RemoteSubmitter {
    client: Client,
    endpoint: String,
}

impl RemoteSubmitter {
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", server.trim_end_matches('/'), SUBMIT_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for RemoteSubmitter {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn submit(&self, image_url: &str) -> Result<SubmitResponse> {
        debug!(image_bytes = image_url.len(), "submitting image");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SubmitRequest {
                imageb64: image_url.to_string(),
            })
            .send()
            .await
            .context("submit image")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("solve service returned {}: {}", status, error_body);
        }

        response.json().await.context("parse solve response")
    }
}
