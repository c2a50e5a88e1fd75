//! Error types for the dispatcher module.

use serde::Serialize;
use thiserror::Error;

use crate::adapter::{Domain, Operation};

/// No adapter handles the request. Produced before any filesystem or
/// process access.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Unsupported conversion in {domain}: {input_ext} -> {target_format}")]
pub struct RoutingError {
    pub domain: String,
    pub input_ext: String,
    pub target_format: String,
}

/// A malformed routing table. Only reachable with hand-built tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Duplicate route {domain}: {input_ext} -> {target_format}")]
    Duplicate {
        domain: Domain,
        input_ext: String,
        target_format: String,
    },

    #[error("Route {domain} -> {target_format} has no input extensions")]
    EmptyInputSet {
        domain: Domain,
        target_format: String,
    },

    #[error("Operation {operation:?} cannot serve domain {domain}")]
    DomainMismatch { domain: Domain, operation: Operation },
}
