//! Stable exit codes for snapsolve CLI commands.

/// Command succeeded, or there was no frame to submit.
pub const OK: i32 = 0;
/// Invalid arguments, config, or input files.
pub const INVALID: i32 = 1;
/// The frame could not be captured.
pub const CAPTURE_FAILED: i32 = 2;
/// The solve service (local or remote) failed to answer.
pub const SERVICE_FAILED: i32 = 3;
