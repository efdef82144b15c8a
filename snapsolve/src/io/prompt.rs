//! Contract prompt rendering for the solve request.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::expr::FUNCTION_NAMES;
use crate::core::placeholder::{MATH_DELIMITER, PLACEHOLDER_DELIMITER};
use crate::core::types::{NO_PROBLEM_DESC, Step};

const SOLVE_TEMPLATE: &str = include_str!("prompts/solve.md");

/// Worked example embedded in the prompt.
#[derive(Debug, Clone, Serialize)]
struct ExampleContext {
    problem: &'static str,
    steps: String,
}

fn worked_example() -> Result<ExampleContext> {
    let steps = vec![
        Step::new(
            "Solve for x when $$~~a~~x - ~~b~~ = ~~c~~$$",
            "d['a'] = 4; d['b'] = 2; d['c'] = 2;",
        ),
        Step::new(
            "Add ~~b~~ to both sides: $$~~a~~x - ~~b~~ + ~~b~~ = ~~c~~ + ~~b~~$$ $$~~a~~x = ~~e~~$$",
            "d['e'] = d['c'] + d['b'];",
        ),
    ];
    let mut rendered = serde_json::to_string(&steps).context("serialize prompt example")?;
    // Partial example: the model continues the list.
    rendered.truncate(rendered.len() - 1);
    rendered.push_str(", ...]");
    Ok(ExampleContext {
        problem: "4x - 2 = 2",
        steps: rendered,
    })
}

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("solve", SOLVE_TEMPLATE)
            .context("load solve template")?;
        Ok(Self { env })
    }

    fn render_solve(&self) -> Result<String> {
        let template = self.env.get_template("solve")?;
        let rendered = template.render(context! {
            math => MATH_DELIMITER,
            open => PLACEHOLDER_DELIMITER,
            close => PLACEHOLDER_DELIMITER,
            functions => FUNCTION_NAMES.join(", "),
            no_problem => NO_PROBLEM_DESC,
            example => worked_example()?,
        })?;
        Ok(rendered)
    }
}

/// Render the fixed system instruction sent with every image.
pub fn render_solve_prompt() -> Result<String> {
    let rendered = PromptEngine::new()?
        .render_solve()
        .context("render solve prompt")?;
    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_the_contract() {
        let prompt = render_solve_prompt().expect("render");
        assert!(prompt.contains("<contract>"));
        assert!(prompt.contains("</contract>"));
        assert!(prompt.contains("delimited with $$ on both sides"));
        assert!(prompt.contains("placeholder ~~name~~"));
        assert!(prompt.contains("\"Um, that's not a math problem\""));
        assert!(prompt.contains("sqrt, cbrt"));
    }

    #[test]
    fn example_is_a_truncated_step_list() {
        let prompt = render_solve_prompt().expect("render");
        assert!(prompt.contains("Problem: 4x - 2 = 2"));
        assert!(prompt.contains(r#"{"desc":"Solve for x when $$~~a~~x - ~~b~~ = ~~c~~$$","code":"d['a'] = 4; d['b'] = 2; d['c'] = 2;"}"#));
        assert!(prompt.contains("}, ...]"));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(
            render_solve_prompt().expect("first"),
            render_solve_prompt().expect("second")
        );
    }
}
