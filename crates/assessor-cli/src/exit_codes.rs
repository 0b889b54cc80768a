//! Process exit codes. Part of the CLI contract.

pub const COMPLETED: i32 = 0;
/// The engine returned a result carrying a failure marker.
pub const DEGRADED: i32 = 1;
/// Bad configuration or job file, or the request was not admitted.
pub const CONFIG_ERROR: i32 = 2;
