//! Offline replay of a saved model response for `snapsolve replay`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::pipeline::{PlaceholderReport, check_placeholders, solve_steps};
use crate::core::types::SolveResult;
use crate::io::schema::parse_solution;

/// Result of replaying one saved response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub result: SolveResult,
    pub placeholders: PlaceholderReport,
}

/// Validate raw model output and run it through the step pipeline.
///
/// Unlike the service, schema failures are returned as errors.
pub fn replay_output(raw: &str) -> Result<Replay> {
    let solution = parse_solution(raw)?;
    let placeholders = check_placeholders(&solution.steps);
    let result = solve_steps(&solution.steps);
    debug!(steps = result.steps.len(), "replayed solution");
    Ok(Replay {
        result,
        placeholders,
    })
}

pub fn replay_file(path: &Path) -> Result<Replay> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    replay_output(&raw).with_context(|| format!("replay {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LINEAR_SOLUTION;

    #[test]
    fn replays_saved_output() {
        let replay = replay_output(LINEAR_SOLUTION).expect("replay");
        assert_eq!(replay.result.steps.len(), 3);
        assert!(replay.placeholders.is_clean());
    }

    #[test]
    fn reports_placeholder_issues() {
        let raw = r#"{"steps":[
            {"desc":"$$~~a~~$$","code":"d['a'] = 1"},
            {"desc":"$$~~a~~ ~~z~~$$","code":"d['a'] = 2"}
        ]}"#;
        let replay = replay_output(raw).expect("replay");
        assert_eq!(replay.placeholders.redefined, vec!["a".to_string()]);
        assert_eq!(replay.placeholders.undefined, vec!["z".to_string()]);
        assert_eq!(replay.result.steps[1].fragments[1], "2 ~~z~~");
    }

    #[test]
    fn schema_failures_are_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("response.json");
        fs::write(&path, r#"{"steps":[{"desc":"x"}]}"#).expect("write");
        let err = replay_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }
}
