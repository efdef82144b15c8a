//! Assignment snippets: the per-step code that records new placeholder values.
//!
//! A snippet is a list of statements separated by `;` or line breaks:
//!
//! ```text
//! d['a'] = 4; d['b'] = 2
//! d['e'] = d['c'] + d['b']
//! let f = sqrt(e)
//! ```
//!
//! Execution is a fold step: the map goes in by value and comes back updated,
//! or the snippet fails as a whole and the caller keeps its previous map.

use thiserror::Error;

use crate::core::expr::{Expr, ExprError, Parser, Token, TokenKind, tokenize};
use crate::core::variables::VariableMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

/// One `target <op>= value` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub op: AssignOp,
    pub value: Expr,
}

/// Failure while parsing or executing a snippet.
///
/// `statement` is 1-based over non-empty statements; `0` means the snippet
/// could not be tokenized at all.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("statement {statement}: {source}")]
pub struct AssignmentError {
    pub statement: usize,
    #[source]
    pub source: ExprError,
}

impl AssignmentError {
    fn at(statement: usize, source: ExprError) -> Self {
        Self { statement, source }
    }
}

/// Declaration keywords that are accepted and ignored in front of a target.
const DECLARATION_KEYWORDS: [&str; 3] = ["let", "const", "var"];

/// Parse a snippet into its statements without evaluating anything.
pub fn parse_snippet(code: &str) -> Result<Vec<Assignment>, AssignmentError> {
    let tokens = tokenize(code).map_err(|err| AssignmentError::at(0, err))?;
    tokens
        .split(|token| token.kind == TokenKind::Separator)
        .filter(|group| !group.is_empty())
        .enumerate()
        .map(|(index, group)| {
            parse_statement(group).map_err(|err| AssignmentError::at(index + 1, err))
        })
        .collect()
}

fn parse_statement(tokens: &[Token]) -> Result<Assignment, ExprError> {
    let mut parser = Parser::new(tokens);
    if let Some(TokenKind::Ident(keyword)) = parser.peek() {
        let declares = DECLARATION_KEYWORDS.contains(&keyword.as_str());
        if declares && matches!(tokens.get(1).map(|t| &t.kind), Some(TokenKind::Ident(_))) {
            parser.eat(&TokenKind::Ident(keyword.clone()));
        }
    }

    let target = parser.parse_target()?;
    let op = match parser.peek() {
        Some(TokenKind::Assign) => AssignOp::Set,
        Some(TokenKind::PlusAssign) => AssignOp::Add,
        Some(TokenKind::MinusAssign) => AssignOp::Sub,
        Some(TokenKind::StarAssign) => AssignOp::Mul,
        Some(TokenKind::SlashAssign) => AssignOp::Div,
        _ => return Err(parser.unexpected("assignment operator")),
    };
    if let Some(kind) = parser.peek() {
        parser.eat(kind);
    }

    let value = parser.parse_expr()?;
    if !parser.is_done() {
        return Err(parser.unexpected("end of statement"));
    }
    Ok(Assignment { target, op, value })
}

impl Assignment {
    /// Apply this statement to `vars` in place.
    pub fn apply(&self, vars: &mut VariableMap) -> Result<(), ExprError> {
        let rhs = self.value.eval(vars)?;
        let value = match self.op {
            AssignOp::Set => rhs,
            op => {
                let current = vars
                    .get(&self.target)
                    .ok_or_else(|| ExprError::UndefinedValue(self.target.clone()))?;
                match op {
                    AssignOp::Add => current + rhs,
                    AssignOp::Sub => current - rhs,
                    AssignOp::Mul => current * rhs,
                    AssignOp::Div if rhs == 0.0 => return Err(ExprError::DivisionByZero),
                    AssignOp::Div => current / rhs,
                    AssignOp::Set => rhs,
                }
            }
        };
        if !value.is_finite() {
            return Err(ExprError::NonFinite);
        }
        vars.insert(self.target.clone(), value);
        Ok(())
    }
}

/// Run a snippet against `vars`, returning the updated map.
///
/// Either every statement applies or the error is returned and the input map
/// is dropped unchanged from the caller's point of view (it keeps its copy).
pub fn run_snippet(code: &str, vars: VariableMap) -> Result<VariableMap, AssignmentError> {
    let statements = parse_snippet(code)?;
    let mut next = vars;
    for (index, statement) in statements.iter().enumerate() {
        statement
            .apply(&mut next)
            .map_err(|err| AssignmentError::at(index + 1, err))?;
    }
    Ok(next)
}
