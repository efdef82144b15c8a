//! I/O helpers: configuration, model access, capture and submission.

pub mod camera;
pub mod config;
pub mod model;
pub mod process;
pub mod prompt;
pub mod schema;
pub mod submit;
