//! Deterministic step pipeline: run snippets in order, substitute, split.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::core::assignment::{parse_snippet, run_snippet};
use crate::core::placeholder::{placeholder_names, split_math, substitute};
use crate::core::types::{SolveResult, SolvedStep, Step};
use crate::core::variables::VariableMap;

/// Render one step against the values recorded so far.
///
/// Returns the solved step and the map to hand to the next step. A failing
/// snippet leaves the map as it was and marks the step with the error.
pub fn solve_step(step: &Step, vars: VariableMap) -> (SolvedStep, VariableMap) {
    let (vars, error) = match run_snippet(&step.code, vars.clone()) {
        Ok(next) => (next, None),
        Err(err) => {
            warn!(error = %err, "assignment snippet failed");
            (vars, Some(err.to_string()))
        }
    };
    let fragments = split_math(&substitute(&step.desc, &vars));
    (SolvedStep { fragments, error }, vars)
}

/// Solve all steps in order, threading the value map through each.
///
/// One solved step per input step, same order.
pub fn solve_steps(steps: &[Step]) -> SolveResult {
    let (solved, vars) = steps.iter().fold(
        (Vec::with_capacity(steps.len()), VariableMap::new()),
        |(mut solved, vars), step| {
            let (step, next) = solve_step(step, vars);
            solved.push(step);
            (solved, next)
        },
    );
    debug!(steps = solved.len(), values = vars.len(), "solved steps");
    SolveResult { steps: solved }
}

/// Advisory findings about placeholder usage in a model solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderReport {
    /// Names assigned by more than one snippet.
    pub redefined: Vec<String>,
    /// Names referenced in a description but never assigned by any snippet.
    pub undefined: Vec<String>,
}

impl PlaceholderReport {
    pub fn is_clean(&self) -> bool {
        self.redefined.is_empty() && self.undefined.is_empty()
    }
}

/// Check the naming conventions the prompt asks for without enforcing them.
pub fn check_placeholders(steps: &[Step]) -> PlaceholderReport {
    let mut assigned = BTreeSet::new();
    let mut redefined = BTreeSet::new();
    for step in steps {
        // Snippets that fail to parse are reported by the pipeline itself.
        let Ok(statements) = parse_snippet(&step.code) else {
            continue;
        };
        let mut in_step = BTreeSet::new();
        for statement in statements {
            if !in_step.insert(statement.target.clone()) {
                continue;
            }
            if !assigned.insert(statement.target.clone()) {
                redefined.insert(statement.target);
            }
        }
    }

    let undefined = steps
        .iter()
        .flat_map(|step| placeholder_names(&step.desc))
        .filter(|name| !assigned.contains(name))
        .collect::<BTreeSet<_>>();

    PlaceholderReport {
        redefined: redefined.into_iter().collect(),
        undefined: undefined.into_iter().collect(),
    }
}
