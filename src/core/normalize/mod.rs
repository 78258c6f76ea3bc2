//! Content normalization pipeline
//!
//! This module implements the passes that turn mixed LaTeX/Markdown content
//! into the canonical Markdown form the platform persists: legacy document
//! commands are rewritten first, then math delimiters are canonicalized.

pub mod commands;
pub mod context;
pub mod delimiters;
pub(crate) mod table;

pub use commands::{convert_commands, convert_commands_with_warnings};
pub use context::{ContentNormalizer, NormalizeOptions};
pub use delimiters::{normalize_delimiters, normalize_delimiters_with_warnings};

// =============================================================================
// Warning System
// =============================================================================

/// Kind of warning generated during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A math delimiter had no matching partner and was left as literal text
    UnmatchedDelimiter,
    /// An environment was malformed (mismatched `\begin`/`\end`) and was
    /// converted best-effort
    MalformedEnvironment,
    /// A command was missing its argument and was dropped
    MalformedCommand,
    /// A math wrapper around a table environment was stripped
    StrippedWrapper,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::UnmatchedDelimiter => write!(f, "unmatched delimiter"),
            WarningKind::MalformedEnvironment => write!(f, "malformed environment"),
            WarningKind::MalformedCommand => write!(f, "malformed command"),
            WarningKind::StrippedWrapper => write!(f, "stripped wrapper"),
        }
    }
}

/// A warning generated during normalization
#[derive(Debug, Clone)]
pub struct NormalizeWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Human-readable message
    pub message: String,
    /// Location context (e.g., "offset 42")
    pub location: Option<String>,
}

impl NormalizeWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        NormalizeWarning {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Add location context to the warning
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

impl From<NormalizeWarning> for crate::utils::error::PipelineDiagnostic {
    fn from(warning: NormalizeWarning) -> Self {
        use crate::utils::error::{DiagnosticSeverity, PipelineDiagnostic};

        let severity = match warning.kind {
            WarningKind::MalformedEnvironment | WarningKind::MalformedCommand => {
                DiagnosticSeverity::Warning
            }
            WarningKind::UnmatchedDelimiter => DiagnosticSeverity::Warning,
            WarningKind::StrippedWrapper => DiagnosticSeverity::Info,
        };

        let mut diag = PipelineDiagnostic::new(severity, warning.kind.to_string(), warning.message);
        if let Some(loc) = warning.location {
            diag = diag.with_location(loc);
        }
        diag
    }
}

/// Result of normalization with diagnostics
#[derive(Debug, Clone)]
pub struct NormalizeResult {
    /// The normalized output
    pub output: String,
    /// Warnings generated during normalization
    pub warnings: Vec<NormalizeWarning>,
}

impl NormalizeResult {
    /// Create a new result with no warnings
    pub fn ok(output: String) -> Self {
        NormalizeResult {
            output,
            warnings: Vec::new(),
        }
    }

    /// Create a result with warnings
    pub fn with_warnings(output: String, warnings: Vec<NormalizeWarning>) -> Self {
        NormalizeResult { output, warnings }
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get warnings as formatted strings
    pub fn format_warnings(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Normalize content: command conversion followed by delimiter
/// canonicalization.
pub fn normalize_content(input: &str) -> String {
    let mut normalizer = ContentNormalizer::new();
    normalizer.normalize(input)
}

/// Normalize content with full diagnostics.
///
/// Returns both the normalized output and any warnings generated along the
/// way. This is the recommended entry point for applications that need to
/// report normalization issues.
pub fn normalize_content_with_diagnostics(input: &str) -> NormalizeResult {
    let mut normalizer = ContentNormalizer::new();
    normalizer.normalize_with_diagnostics(input)
}
