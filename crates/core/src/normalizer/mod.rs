//! Error normalization.
//!
//! Every external tool reports failure differently. This module folds their
//! stderr into one [`ErrorKind`] taxonomy shared by all domains, so callers
//! never match on tool-specific text.

mod classify;
mod kind;

pub use classify::{classify, ToolFamily};
pub use kind::{ErrorKind, ToolFailure};
