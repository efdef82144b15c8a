//! Deterministic, pure logic for turning model steps into display fragments.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod assignment;
pub mod expr;
pub mod image;
pub mod pipeline;
pub mod placeholder;
pub mod types;
pub mod variables;
