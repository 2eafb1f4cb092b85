//! Script execution.
//!
//! [`ScriptRunner`] turns an [`Invocation`] into exactly one
//! [`JobOutcome`](crate::scheduler::JobOutcome):
//!
//! 1. Resolves the script path (a missing script is a launch failure)
//! 2. Spawns `<interpreter...> <script> <args...>` in the script's directory
//! 3. Waits for exit and captures stdout/stderr in full
//!
//! # Limitations
//!
//! There is no timeout or cancellation. A script that never exits keeps its
//! job `running` for the lifetime of the server.

pub mod executor;

pub use executor::{Invocation, ScriptRunner};
