//! Photo-to-steps math solver.
//!
//! An image of a math problem goes to a vision model that answers with a list
//! of `{desc, code}` steps. Each `code` snippet records numeric values in a
//! map; each `desc` references them as `~~name~~` placeholders and marks math
//! with `$$`. The crate is split into:
//!
//! - **[`core`]**: Pure, deterministic logic (expression evaluation,
//!   assignment snippets, placeholder substitution, the step pipeline).
//! - **[`io`]**: Side-effecting operations (config, model HTTP client,
//!   camera capture, submission).
//!
//! [`solve`] ties the two together into the solve service; [`capture`] and
//! [`replay`] implement CLI commands on top of it.

pub mod capture;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod replay;
pub mod solve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
