//! Testing utilities and mock implementations.
//!
//! Mocks for the two seams the broker has: the process runner beneath the
//! adapters, and the job executor beneath the queue.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileforge_core::testing::MockProcessRunner;
//!
//! let runner = Arc::new(MockProcessRunner::new());
//! runner.set_create_last_argument(true).await;
//!
//! let service = ConversionService::with_runner(&config, runner.clone());
//! ```

mod mock_executor;
mod mock_process_runner;

pub use mock_executor::{MockExecutor, ScriptedOutcome};
pub use mock_process_runner::MockProcessRunner;
