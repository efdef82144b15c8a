//! Restricted arithmetic expressions over recorded placeholder values.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := NUMBER | '(' expr ')' | ref | call | constant
//! ref     := IDENT | 'd' '[' STRING ']' | 'd' '.' IDENT
//! call    := ['Math' '.'] IDENT '(' [expr (',' expr)*] ')'
//! ```
//!
//! Nothing here can reach outside the value map: the only effects are reads
//! of named values and pure floating point math.

use thiserror::Error;

use crate::core::variables::VariableMap;

/// Name of the map object the model addresses values through (`d['a']`).
pub const MAP_IDENT: &str = "d";

/// Deepest allowed nesting of parentheses, unary signs, exponents and calls.
pub const MAX_DEPTH: usize = 64;
/// Longest allowed expression, in tokens.
pub const MAX_EXPR_TOKENS: usize = 512;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("`{func}` takes {expected} argument(s), got {got}")]
    Arity {
        func: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("undefined value `{0}`")]
    UndefinedValue(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("expression has {tokens} tokens, limit is {limit}")]
    TooLong { tokens: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    StarStar,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    /// Statement separator: `;` or a line break.
    Separator,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number `{}`", n),
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Str(s) => format!("string '{}'", s),
            TokenKind::Separator => "statement separator".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::StarStar => "**",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::Separator => ";",
            TokenKind::Number(_) | TokenKind::Ident(_) | TokenKind::Str(_) => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split source text into tokens. Whitespace other than line breaks is skipped.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let push = |tokens: &mut Vec<Token>, kind| tokens.push(Token { kind, offset });

        match ch {
            '\n' | ';' => {
                push(&mut tokens, TokenKind::Separator);
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].1.is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].1.is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber { text, offset })?;
                push(&mut tokens, TokenKind::Number(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].1.is_alphanumeric() || chars[i].1 == '_' || chars[i].1 == '$')
                {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                push(&mut tokens, TokenKind::Ident(name));
            }
            '\'' | '"' | '`' => {
                let quote = ch;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j].1 != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ExprError::UnterminatedString { offset });
                }
                let text: String = chars[start..j].iter().map(|&(_, c)| c).collect();
                push(&mut tokens, TokenKind::Str(text));
                i = j + 1;
            }
            _ => {
                let (kind, width) = match (ch, next) {
                    ('*', Some('*')) => (TokenKind::StarStar, 2),
                    ('+', Some('=')) => (TokenKind::PlusAssign, 2),
                    ('-', Some('=')) => (TokenKind::MinusAssign, 2),
                    ('*', Some('=')) => (TokenKind::StarAssign, 2),
                    ('/', Some('=')) => (TokenKind::SlashAssign, 2),
                    ('+', _) => (TokenKind::Plus, 1),
                    ('-', _) => (TokenKind::Minus, 1),
                    ('*', _) => (TokenKind::Star, 1),
                    ('/', _) => (TokenKind::Slash, 1),
                    ('%', _) => (TokenKind::Percent, 1),
                    ('^', _) => (TokenKind::Caret, 1),
                    ('(', _) => (TokenKind::LParen, 1),
                    (')', _) => (TokenKind::RParen, 1),
                    ('[', _) => (TokenKind::LBracket, 1),
                    (']', _) => (TokenKind::RBracket, 1),
                    (',', _) => (TokenKind::Comma, 1),
                    ('.', _) => (TokenKind::Dot, 1),
                    ('=', _) => (TokenKind::Assign, 1),
                    _ => return Err(ExprError::UnexpectedChar { ch, offset }),
                };
                push(&mut tokens, kind);
                i += width;
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Cbrt,
    Abs,
    Sign,
    Pow,
    Min,
    Max,
    Hypot,
    Floor,
    Ceil,
    Round,
    Trunc,
    Exp,
    Ln,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
}

/// Function names accepted in expressions, as advertised to the model.
pub const FUNCTION_NAMES: &[&str] = &[
    "sqrt", "cbrt", "abs", "sign", "pow", "min", "max", "hypot", "floor", "ceil", "round",
    "trunc", "exp", "log", "log10", "log2", "sin", "cos", "tan", "asin", "acos", "atan", "atan2",
];

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        let func = match name {
            "sqrt" => Func::Sqrt,
            "cbrt" => Func::Cbrt,
            "abs" => Func::Abs,
            "sign" => Func::Sign,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            "hypot" => Func::Hypot,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "trunc" => Func::Trunc,
            "exp" => Func::Exp,
            // `log` follows the `Math.log` convention: natural logarithm.
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "log2" => Func::Log2,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "atan2" => Func::Atan2,
            _ => return None,
        };
        Some(func)
    }

    fn name(self) -> &'static str {
        match self {
            Func::Sqrt => "sqrt",
            Func::Cbrt => "cbrt",
            Func::Abs => "abs",
            Func::Sign => "sign",
            Func::Pow => "pow",
            Func::Min => "min",
            Func::Max => "max",
            Func::Hypot => "hypot",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Trunc => "trunc",
            Func::Exp => "exp",
            Func::Ln => "log",
            Func::Log10 => "log10",
            Func::Log2 => "log2",
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Atan2 => "atan2",
        }
    }

    fn check_arity(self, got: usize) -> Result<(), ExprError> {
        let (ok, expected) = match self {
            Func::Pow | Func::Atan2 => (got == 2, "2"),
            Func::Min | Func::Max | Func::Hypot => (got >= 1, "at least 1"),
            _ => (got == 1, "1"),
        };
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                func: self.name(),
                expected,
                got,
            })
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let x = args[0];
        match self {
            Func::Sqrt => x.sqrt(),
            Func::Cbrt => x.cbrt(),
            Func::Abs => x.abs(),
            Func::Sign => {
                if x == 0.0 {
                    0.0
                } else {
                    x.signum()
                }
            }
            Func::Pow => x.powf(args[1]),
            Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Func::Hypot => args.iter().map(|v| v * v).sum::<f64>().sqrt(),
            Func::Floor => x.floor(),
            Func::Ceil => x.ceil(),
            // Halves round towards positive infinity (`Math.round`).
            Func::Round => {
                let r = x.round();
                if x - r == 0.5 { r + 1.0 } else { r }
            }
            Func::Trunc => x.trunc(),
            Func::Exp => x.exp(),
            Func::Ln => x.ln(),
            Func::Log10 => x.log10(),
            Func::Log2 => x.log2(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Asin => x.asin(),
            Func::Acos => x.acos(),
            Func::Atan => x.atan(),
            Func::Atan2 => x.atan2(args[1]),
        }
    }
}

fn lookup_constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(std::f64::consts::PI),
        "e" | "E" => Some(std::f64::consts::E),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    /// Explicit map reference (`d['a']`, `d.a`).
    Var(String),
    /// Bare identifier: a recorded value if present, else a constant (`e`, `pi`).
    Name(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

/// Recursive-descent parser over a token slice.
pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub(crate) fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn unexpected(&self, expected: &'static str) -> ExprError {
        match self.tokens.get(self.pos) {
            Some(token) => ExprError::UnexpectedToken {
                found: token.kind.describe(),
                expected,
                offset: token.offset,
            },
            None => ExprError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), ExprError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parse a map reference target: `name`, `d['name']` or `d.name`.
    pub(crate) fn parse_target(&mut self) -> Result<String, ExprError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                self.pos += 1;
                if name == MAP_IDENT {
                    if let Some(key) = self.parse_map_key()? {
                        return Ok(key);
                    }
                }
                Ok(name.clone())
            }
            _ => Err(self.unexpected("assignment target")),
        }
    }

    /// After consuming the map identifier, read `['key']` or `.key` if present.
    fn parse_map_key(&mut self) -> Result<Option<String>, ExprError> {
        match self.peek() {
            Some(TokenKind::LBracket) => {
                self.pos += 1;
                let key = match self.peek() {
                    Some(TokenKind::Str(key) | TokenKind::Ident(key)) => key.clone(),
                    _ => return Err(self.unexpected("quoted value name")),
                };
                self.pos += 1;
                self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(Some(key))
            }
            Some(TokenKind::Dot) => {
                self.pos += 1;
                match self.peek() {
                    Some(TokenKind::Ident(key)) => {
                        self.pos += 1;
                        Ok(Some(key.clone()))
                    }
                    _ => Err(self.unexpected("value name")),
                }
            }
            _ => Ok(None),
        }
    }

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let remaining = self.tokens.len().saturating_sub(self.pos);
        if self.depth == 0 && remaining > MAX_EXPR_TOKENS {
            return Err(ExprError::TooLong {
                tokens: remaining,
                limit: MAX_EXPR_TOKENS,
            });
        }
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// Every recursive path passes through here, so the depth guard lives here.
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat(&TokenKind::Plus) {
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_primary()?;
        if self.eat(&TokenKind::Caret) || self.eat(&TokenKind::StarStar) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let Some(token) = self.tokens.get(self.pos) else {
            return Err(self.unexpected("expression"));
        };
        match &token.kind {
            TokenKind::Number(value) => {
                self.pos += 1;
                Ok(Expr::Num(*value))
            }
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.pos += 1;
                self.parse_ident(name)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<Expr, ExprError> {
        if name == "Math" && self.eat(&TokenKind::Dot) {
            let member = match self.peek() {
                Some(TokenKind::Ident(member)) => member.clone(),
                _ => return Err(self.unexpected("`Math` member")),
            };
            self.pos += 1;
            if self.peek() == Some(&TokenKind::LParen) {
                return self.parse_call(&member);
            }
            return lookup_constant(&member)
                .map(Expr::Num)
                .ok_or(ExprError::UnknownFunction(format!("Math.{}", member)));
        }
        if name == MAP_IDENT {
            if let Some(key) = self.parse_map_key()? {
                return Ok(Expr::Var(key));
            }
        }
        if self.peek() == Some(&TokenKind::LParen) {
            return self.parse_call(name);
        }
        Ok(Expr::Name(name.to_string()))
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, ExprError> {
        let func = Func::lookup(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RParen, "`,` or `)`")?;
                break;
            }
        }
        func.check_arity(args.len())?;
        Ok(Expr::Call(func, args))
    }
}

impl Expr {
    /// Evaluate against the recorded values. Every intermediate must be finite.
    pub fn eval(&self, vars: &VariableMap) -> Result<f64, ExprError> {
        let value = match self {
            Expr::Num(value) => *value,
            Expr::Var(name) => vars
                .get(name)
                .ok_or_else(|| ExprError::UndefinedValue(name.clone()))?,
            Expr::Name(name) => vars
                .get(name)
                .or_else(|| lookup_constant(name))
                .ok_or_else(|| ExprError::UndefinedValue(name.clone()))?,
            Expr::Neg(inner) => -inner.eval(vars)?,
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(vars)?;
                let b = rhs.eval(vars)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div | BinOp::Rem if b == 0.0 => {
                        return Err(ExprError::DivisionByZero);
                    }
                    BinOp::Div => a / b,
                    BinOp::Rem => a % b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(vars))
                    .collect::<Result<Vec<_>, _>>()?;
                func.apply(&values)
            }
        };
        if !value.is_finite() {
            return Err(ExprError::NonFinite);
        }
        Ok(value)
    }
}

/// Parse a standalone expression (no trailing tokens allowed).
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;
    if !parser.is_done() {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

/// Parse and evaluate a standalone expression.
pub fn evaluate(src: &str, vars: &VariableMap) -> Result<f64, ExprError> {
    parse(src)?.eval(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> f64 {
        evaluate(src, &VariableMap::new()).expect("evaluate")
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("2 ** 10"), 1024.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("2 ^ -1"), 0.5);
        assert_eq!(eval("7 % 3"), 1.0);
    }

    #[test]
    fn number_literal_forms() {
        assert_eq!(eval(".5 + 1.25"), 1.75);
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5E-1"), 0.25);
    }

    #[test]
    fn map_references_in_all_spellings() {
        let vars: VariableMap = [("a", 4.0), ("b", 2.0), ("c", 3.0)].into_iter().collect();
        assert_eq!(evaluate("d['a'] + d[\"b\"] * d.c", &vars), Ok(10.0));
        assert_eq!(evaluate("a - b", &vars), Ok(2.0));
    }

    #[test]
    fn recorded_values_shadow_constants_and_function_names() {
        let vars: VariableMap = [("e", 16.0), ("pi", 2.0), ("log", 5.0)]
            .into_iter()
            .collect();
        assert_eq!(evaluate("sqrt(e)", &vars), Ok(4.0));
        assert_eq!(evaluate("e + 1", &vars), Ok(17.0));
        assert_eq!(evaluate("pi * 3", &vars), Ok(6.0));
        assert_eq!(evaluate("log + log(1)", &vars), Ok(5.0));
        assert_eq!(evaluate("Math.E", &vars), Ok(std::f64::consts::E));
        assert_eq!(evaluate("E", &vars), Ok(std::f64::consts::E));

        let empty = VariableMap::new();
        assert_eq!(evaluate("e", &empty), Ok(std::f64::consts::E));
        assert_eq!(evaluate("pi", &empty), Ok(std::f64::consts::PI));
        assert_eq!(
            evaluate("d['e']", &empty),
            Err(ExprError::UndefinedValue("e".to_string()))
        );
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(
            parse(&nested),
            Err(ExprError::TooDeep { limit: MAX_DEPTH })
        );
        assert_eq!(
            parse(&format!("{}1", "-".repeat(100))),
            Err(ExprError::TooDeep { limit: MAX_DEPTH })
        );
        let within = format!("{}1{}", "(".repeat(32), ")".repeat(32));
        assert_eq!(evaluate(&within, &VariableMap::new()), Ok(1.0));
    }

    #[test]
    fn very_long_expressions_are_an_error() {
        let nested = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&nested), Err(ExprError::TooLong { .. })));
        let chain = format!("1{}", " + 1".repeat(10_000));
        assert!(matches!(parse(&chain), Err(ExprError::TooLong { .. })));
        let fits = format!("1{}", " + 1".repeat(200));
        assert_eq!(evaluate(&fits, &VariableMap::new()), Ok(201.0));
    }

    #[test]
    fn math_functions_and_constants() {
        assert_eq!(eval("Math.sqrt(16)"), 4.0);
        assert_eq!(eval("sqrt(9) + abs(-1)"), 4.0);
        assert_eq!(eval("Math.pow(2, 5)"), 32.0);
        assert_eq!(eval("max(1, 7, 3) - min(4, 2)"), 5.0);
        assert_eq!(eval("Math.round(2.5)"), 3.0);
        assert_eq!(eval("round(-2.5)"), -2.0);
        assert_eq!(eval("round(0.49999999999999994)"), 0.0);
        assert_eq!(eval("round(-0.4)"), 0.0);
        assert!((eval("Math.log(Math.E)") - 1.0).abs() < 1e-12);
        assert!((eval("log10(1000)") - 3.0).abs() < 1e-12);
        assert!((eval("Math.PI") - std::f64::consts::PI).abs() < f64::EPSILON);
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let err = evaluate("1 / (2 - 2)", &VariableMap::new()).unwrap_err();
        assert_eq!(err, ExprError::DivisionByZero);
        let err = evaluate("5 % 0", &VariableMap::new()).unwrap_err();
        assert_eq!(err, ExprError::DivisionByZero);
    }

    #[test]
    fn non_finite_results_are_rejected() {
        let err = evaluate("sqrt(-1)", &VariableMap::new()).unwrap_err();
        assert_eq!(err, ExprError::NonFinite);
    }

    #[test]
    fn undefined_values_are_reported_by_name() {
        let err = evaluate("d['zz'] + 1", &VariableMap::new()).unwrap_err();
        assert_eq!(err, ExprError::UndefinedValue("zz".to_string()));
    }

    #[test]
    fn rejects_anything_outside_the_grammar() {
        assert!(matches!(
            parse("process.exit(1)"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("Math.random()"),
            Err(ExprError::UnknownFunction(_))
        ));
        assert!(matches!(
            parse("fetch('http://x')"),
            Err(ExprError::UnknownFunction(_))
        ));
        assert!(matches!(
            parse("1 + {}"),
            Err(ExprError::UnexpectedChar { ch: '{', .. })
        ));
        assert!(matches!(
            parse("1 +"),
            Err(ExprError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("(1 + 2"),
            Err(ExprError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("1 2"),
            Err(ExprError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn advertised_functions_all_resolve() {
        for name in FUNCTION_NAMES {
            assert!(Func::lookup(name).is_some(), "{name} should resolve");
        }
    }

    #[test]
    fn arity_is_checked_at_parse_time() {
        let err = parse("pow(2)").unwrap_err();
        assert!(err.to_string().contains("`pow` takes 2 argument(s), got 1"));
    }
}
