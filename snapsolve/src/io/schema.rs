//! Structured-output schema shared by the model request and output validation.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::core::types::Solution;

/// JSON Schema for `{ steps: [{ desc, code }] }`.
pub const SOLUTION_SCHEMA: &str = include_str!("../../schemas/solution.schema.json");

/// Parsed schema document, as embedded in model requests.
pub fn solution_schema() -> Result<Value> {
    serde_json::from_str(SOLUTION_SCHEMA).context("parse solution schema")
}

/// Validate JSON instance against a JSON Schema (Draft 2020-12).
pub fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| anyhow!("compile json schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

/// Parse raw model output text into a validated [`Solution`].
pub fn parse_solution(raw: &str) -> Result<Solution> {
    let instance: Value = serde_json::from_str(raw.trim()).context("parse model output json")?;
    validate_schema(&instance, &solution_schema()?)?;
    let solution: Solution =
        serde_json::from_value(instance).context("deserialize model output")?;
    debug!(steps = solution.steps.len(), "parsed model solution");
    Ok(solution)
}
