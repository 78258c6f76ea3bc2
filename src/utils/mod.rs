//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Diagnostics reporting
//! - Retry policy and key rotation values for generation-facing callers

pub mod error;
pub mod keys;
pub mod retry;

// Re-export commonly used items
pub use error::{
    ContentError, ContentResult, DiagnosticSeverity, PayloadError, PipelineDiagnostic,
};
pub use keys::KeyPool;
pub use retry::{run_with_retry, RetryPolicy};

#[cfg(not(target_arch = "wasm32"))]
pub use retry::run_with_retry_blocking;
