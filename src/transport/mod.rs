//! HTTP transport for signed requests
//!
//! This module provides:
//! - The `HttpExecutor` seam the storage client sends through
//! - A hyper-based default executor with timeouts and redirect handling
//! - The normalized `RequestOutcome` every call returns

pub mod executor;
pub mod outcome;

pub use executor::{HttpExecutor, HttpRequest, HyperExecutor};
pub use outcome::{is_success_status, RequestOutcome, TransferMetadata};
