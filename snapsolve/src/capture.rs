//! Capture flow for `snapsolve capture` and `snapsolve solve`.
//!
//! Grabs one frame, submits it, and renders the returned steps. A missing
//! frame is a silent no-op; failures are reported as [`CaptureError`] so the
//! CLI can map them to exit codes.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::placeholder::MATH_DELIMITER;
use crate::io::camera::FrameSource;
use crate::io::model::ModelClient;
use crate::io::submit::{SubmitResponse, Submitter};
use crate::solve::SolveService;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture failed: {0:#}")]
    Frame(#[source] anyhow::Error),
    #[error("solve failed: {0:#}")]
    Submit(#[source] anyhow::Error),
}

/// Solves in-process instead of calling a server.
pub struct LocalSubmitter<M> {
    service: SolveService<M>,
}

impl<M: ModelClient> LocalSubmitter<M> {
    pub fn new(service: SolveService<M>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &SolveService<M> {
        &self.service
    }
}

#[async_trait]
impl<M: ModelClient> Submitter for LocalSubmitter<M> {
    async fn submit(&self, image_url: &str) -> Result<SubmitResponse> {
        let outcome = self.service.solve(image_url).await?;
        Ok(SubmitResponse::from(&outcome))
    }
}

/// Grab one frame and submit it.
///
/// Returns `Ok(None)` without contacting the submitter when the source has
/// no frame.
#[instrument(skip_all)]
pub async fn capture_and_submit<F, S>(
    source: &F,
    submitter: &S,
) -> Result<Option<SubmitResponse>, CaptureError>
where
    F: FrameSource + ?Sized,
    S: Submitter + ?Sized,
{
    let Some(frame) = source.grab().map_err(CaptureError::Frame)? else {
        debug!("no frame captured, nothing to submit");
        return Ok(None);
    };
    info!(bytes = frame.bytes.len(), mime = frame.mime(), "submitting frame");
    let response = submitter
        .submit(&frame.to_data_url())
        .await
        .map_err(CaptureError::Submit)?;
    Ok(Some(response))
}

/// Join one step's fragments back into display text, math wrapped in `$$`.
pub fn render_step(fragments: &[String]) -> String {
    fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| {
            if i % 2 == 1 {
                format!("{MATH_DELIMITER}{fragment}{MATH_DELIMITER}")
            } else {
                fragment.clone()
            }
        })
        .collect()
}

/// Numbered plain-text rendering of a response.
pub fn render_text(response: &SubmitResponse) -> String {
    let mut out = String::new();
    for (i, fragments) in response.steps.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, render_step(fragments)));
        for err in response.step_errors.iter().filter(|e| e.step == i) {
            out.push_str(&format!("   (values not updated: {})\n", err.message));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use crate::io::camera::Frame;
    use crate::io::submit::StepError;
    use crate::solve::SolveSettings;
    use crate::test_support::{JPEG_BYTES, LINEAR_SOLUTION, ScriptedModel};

    struct StaticSource(Option<Vec<u8>>);

    impl FrameSource for StaticSource {
        fn grab(&self) -> Result<Option<Frame>> {
            Ok(self.0.clone().map(Frame::new))
        }
    }

    struct BrokenSource;

    impl FrameSource for BrokenSource {
        fn grab(&self) -> Result<Option<Frame>> {
            Err(anyhow!("no camera"))
        }
    }

    #[derive(Default)]
    struct CountingSubmitter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Submitter for CountingSubmitter {
        async fn submit(&self, image_url: &str) -> Result<SubmitResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(image_url.starts_with("data:image/jpeg;base64,"));
            Ok(SubmitResponse {
                steps: vec![vec!["ok".to_string()]],
                ..SubmitResponse::default()
            })
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_frame_submits_nothing() {
        let submitter = CountingSubmitter::default();
        let response = capture_and_submit(&StaticSource(None), &submitter)
            .await
            .expect("capture");
        assert_eq!(response, None);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn frame_is_submitted_as_data_url() {
        let submitter = CountingSubmitter::default();
        let response = capture_and_submit(&StaticSource(Some(JPEG_BYTES.to_vec())), &submitter)
            .await
            .expect("capture")
            .expect("response");
        assert_eq!(response.steps, vec![strings(&["ok"])]);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn frame_errors_are_distinguished_from_submit_errors() {
        let submitter = CountingSubmitter::default();
        let err = capture_and_submit(&BrokenSource, &submitter).await.unwrap_err();
        assert!(matches!(err, CaptureError::Frame(_)));

        let local = LocalSubmitter::new(
            SolveService::new(ScriptedModel::new().fail("boom"), SolveSettings::default())
                .expect("service"),
        );
        let err = capture_and_submit(&StaticSource(Some(JPEG_BYTES.to_vec())), &local)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Submit(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn local_submitter_runs_the_service() {
        let local = LocalSubmitter::new(
            SolveService::new(ScriptedModel::new().reply(LINEAR_SOLUTION), SolveSettings::default())
                .expect("service"),
        );
        let response = capture_and_submit(&StaticSource(Some(JPEG_BYTES.to_vec())), &local)
            .await
            .expect("capture")
            .expect("response");
        assert_eq!(response.steps[2], strings(&["Divide by 4: ", "x = 1", ""]));
        assert!(!response.degraded);
        assert_eq!(local.service().model().calls(), 1);
    }

    #[test]
    fn math_fragments_are_wrapped() {
        assert_eq!(
            render_step(&strings(&["Solve ", "4x = 4", " now"])),
            "Solve $$4x = 4$$ now"
        );
        assert_eq!(render_step(&strings(&["Execution error"])), "Execution error");
    }

    #[test]
    fn text_rendering_numbers_steps_and_notes_failures() {
        let response = SubmitResponse {
            steps: vec![strings(&["a ", "1", ""]), strings(&["b"])],
            step_errors: vec![StepError {
                step: 1,
                message: "statement 1: division by zero".to_string(),
            }],
            degraded: false,
        };
        assert_eq!(
            render_text(&response),
            "1. a $$1$$\n2. b\n   (values not updated: statement 1: division by zero)\n"
        );
    }
}
