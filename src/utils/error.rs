//! Error handling for texmark pipelines
//!
//! This module provides the typed error and diagnostic types shared by the
//! normalization, repair, and validation passes.

use std::fmt;

/// Pipeline error type
#[derive(Debug, Clone)]
pub enum ContentError {
    /// Content was classified as unsalvageable; the caller must discard it
    /// and regenerate rather than persist.
    Rejected { errors: Vec<String> },
    /// A model payload could not be parsed by any strategy
    Payload(PayloadError),
    /// Invalid input
    InvalidInput { message: String },
    /// Internal error
    InternalError { message: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Rejected { errors } => {
                if errors.is_empty() {
                    write!(f, "Content rejected: regenerate")
                } else {
                    write!(f, "Content rejected: {}", errors.join("; "))
                }
            }
            ContentError::Payload(err) => write!(f, "{}", err),
            ContentError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            ContentError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ContentError {}

impl From<PayloadError> for ContentError {
    fn from(err: PayloadError) -> Self {
        ContentError::Payload(err)
    }
}

/// Result type for pipeline operations
pub type ContentResult<T> = Result<T, ContentError>;

/// Failure to parse a model-generated JSON payload.
///
/// Carries the ordered trail of strategies that were attempted so callers
/// can log why every fallback failed.
#[derive(Debug, Clone)]
pub struct PayloadError {
    /// One entry per attempted strategy, e.g. "direct: expected `,` at line 3"
    pub attempts: Vec<String>,
}

impl PayloadError {
    pub fn new(attempts: Vec<String>) -> Self {
        Self { attempts }
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Model payload unparseable after {} strategies",
            self.attempts.len()
        )?;
        if !self.attempts.is_empty() {
            write!(f, " ({})", self.attempts.join(" | "))?;
        }
        Ok(())
    }
}

impl std::error::Error for PayloadError {}

// =============================================================================
// Unified Diagnostic System
// =============================================================================

/// Severity level for pipeline diagnostics (determines coloring and behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Critical issues - e.g., rejected content, unparseable payloads
    Error,
    /// Warnings - e.g., unmatched delimiters, ragged table rows
    Warning,
    /// Informational - e.g., applied soft fixes, stripped wrappers
    Info,
}

/// Unified diagnostic type for pipeline output.
///
/// This provides a common interface for warnings from the normalization
/// passes and the validator, enabling unified handling in the embedding
/// application.
#[derive(Debug, Clone)]
pub struct PipelineDiagnostic {
    /// Severity level (for coloring and strict mode)
    pub severity: DiagnosticSeverity,
    /// Warning kind as string (e.g., "unmatched delimiter", "ragged row")
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Location context (e.g., "\\includegraphics", "line 10")
    pub location: Option<String>,
}

impl PipelineDiagnostic {
    /// Create a new diagnostic.
    pub fn new(
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Add location context.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Get ANSI color code for this diagnostic's severity.
    pub fn color_code(&self) -> &'static str {
        match self.severity {
            DiagnosticSeverity::Error => "\x1b[31m",   // red
            DiagnosticSeverity::Warning => "\x1b[33m", // yellow
            DiagnosticSeverity::Info => "\x1b[36m",    // cyan
        }
    }
}

impl fmt::Display for PipelineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

// Convenience constructors for errors
impl ContentError {
    pub fn rejected(errors: Vec<String>) -> Self {
        ContentError::Rejected { errors }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ContentError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ContentError::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = ContentError::rejected(vec!["placeholder content".to_string()]);
        assert!(err.to_string().contains("rejected"));
        assert!(err.to_string().contains("placeholder content"));
    }

    #[test]
    fn test_payload_error_display() {
        let err = PayloadError::new(vec![
            "direct: EOF".to_string(),
            "fenced: EOF".to_string(),
            "extracted: no object found".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("3 strategies"));
        assert!(msg.contains("no object found"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = PipelineDiagnostic::new(
            DiagnosticSeverity::Warning,
            "unmatched delimiter",
            "no closing $ before block boundary",
        )
        .with_location("line 4");
        let msg = diag.to_string();
        assert!(msg.contains("[unmatched delimiter]"));
        assert!(msg.contains("line 4"));
    }
}
