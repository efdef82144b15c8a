//! Placeholder substitution and math-segment splitting for step descriptions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::variables::VariableMap;

/// Delimiter wrapped around placeholder names (`~~name~~`).
pub const PLACEHOLDER_DELIMITER: &str = "~~";
/// Literal marker bounding math-typeset segments.
pub const MATH_DELIMITER: &str = "$$";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(\w+)~~").expect("placeholder pattern should compile"));

/// Replace every `~~name~~` whose name is recorded in `vars`.
///
/// Unknown names are left exactly as written. A recorded value of zero is
/// still substituted.
pub fn substitute(desc: &str, vars: &VariableMap) -> String {
    PLACEHOLDER_RE
        .replace_all(desc, |caps: &Captures<'_>| match vars.formatted(&caps[1]) {
            Some(value) => value,
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Split on the math delimiter.
///
/// Even-indexed fragments are plain text and odd-indexed fragments are math
/// content; a text without markers yields a single fragment.
pub fn split_math(text: &str) -> Vec<String> {
    text.split(MATH_DELIMITER).map(str::to_string).collect()
}

/// Placeholder names referenced in a description, in first-seen order.
pub fn placeholder_names(desc: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    PLACEHOLDER_RE
        .captures_iter(desc)
        .filter_map(|caps| {
            let name = caps[1].to_string();
            seen.insert(name.clone()).then_some(name)
        })
        .collect()
}
