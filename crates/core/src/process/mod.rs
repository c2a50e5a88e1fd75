//! Process execution shim.
//!
//! Runs a single external tool invocation under a wall-clock limit and
//! reports what happened as a [`ProcessResult`]. A non-zero exit is a
//! normal result, not an error; only spawn and I/O faults surface as
//! [`ProcessError`].

mod error;
mod runner;
mod traits;
mod types;

pub use error::ProcessError;
pub use runner::TokioProcessRunner;
pub use traits::ProcessRunner;
pub use types::{Invocation, ProcessResult};
