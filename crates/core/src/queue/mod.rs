//! Task queue.
//!
//! A FIFO queue with a hard ceiling on how many conversions run at once.
//! Each job moves `pending → processing → completed | failed`, or
//! `pending → cancelled` while it still waits. Submitting returns a
//! [`JobHandle`] that resolves once the job settles.
//!
//! The queue does not know how to convert anything; it drives a
//! [`JobExecutor`]. [`DispatchExecutor`] is the production one.

mod config;
mod error;
mod events;
mod executor;
mod handle;
mod scheduler;
mod traits;
mod types;

pub use config::QueueConfig;
pub use error::{JobError, QueueError};
pub use events::{QueueEvent, QueueListener};
pub use executor::DispatchExecutor;
pub use handle::JobHandle;
pub use scheduler::TaskQueue;
pub use traits::JobExecutor;
pub use types::{Job, JobSpec, JobStatus, QueueStatus};
