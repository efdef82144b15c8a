//! Shared deterministic types for the solve pipeline.
//!
//! These types define the contract between the model output, the pure
//! pipeline and the transport layers. They carry no I/O.

use serde::{Deserialize, Serialize};

/// Description used for the synthetic step when model output is unusable.
pub const EXECUTION_ERROR_DESC: &str = "Execution error";
/// Description the model returns when no math problem is visible.
pub const NO_PROBLEM_DESC: &str = "Um, that's not a math problem";

/// One solution step as produced by the model.
///
/// Field names follow the structured-output schema (`desc`, `code`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Human-readable text with `~~name~~` placeholders and `$$` markers.
    pub desc: String,
    /// Assignment snippet recording values this step's description needs.
    pub code: String,
}

impl Step {
    pub fn new(desc: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            code: code.into(),
        }
    }

    /// The single step substituted when model output fails validation.
    pub fn execution_error() -> Self {
        Self::new(EXECUTION_ERROR_DESC, "")
    }
}

/// Structured output document requested from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub steps: Vec<Step>,
}

/// A step after value substitution, split into display fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvedStep {
    /// Even indices are plain text, odd indices are math content.
    pub fragments: Vec<String>,
    /// Set when this step's assignment snippet failed; its description was
    /// rendered with the values recorded before the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered solved steps, one per model step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolveResult {
    pub steps: Vec<SolvedStep>,
}

impl SolveResult {
    /// Fragment lists only, in step order (the RPC `steps` shape).
    pub fn fragments(&self) -> Vec<Vec<String>> {
        self.steps.iter().map(|s| s.fragments.clone()).collect()
    }

    /// `(step index, message)` for every step whose snippet failed.
    pub fn step_errors(&self) -> Vec<(usize, String)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.error.clone().map(|e| (i, e)))
            .collect()
    }
}

/// Outcome of a solve that reached the pipeline.
///
/// `Degraded` carries the one-step error result used when the model output
/// was absent or malformed, together with the reason, so callers can decide
/// whether degraded output is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(SolveResult),
    Degraded { result: SolveResult, reason: String },
}

impl SolveOutcome {
    pub fn result(&self) -> &SolveResult {
        match self {
            SolveOutcome::Solved(result) => result,
            SolveOutcome::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> SolveResult {
        match self {
            SolveOutcome::Solved(result) => result,
            SolveOutcome::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SolveOutcome::Degraded { .. })
    }
}
