//! # texmark
//!
//! Normalization and rendering pipeline for math-education content.
//!
//! Lesson, exercise, and exam bodies arrive as an inconsistent mix of LaTeX
//! and Markdown, hand-authored or model-generated. This crate turns them
//! into one canonical Markdown form before persistence, and renders that
//! form as classified, sectioned HTML at display time:
//!
//! 1. [`fix_latex_json_escapes`] / [`parse_model_payload`] repair and parse
//!    model-generated JSON payloads (generated content only);
//! 2. [`convert_commands`] rewrites legacy document commands (sections,
//!    `array`/`tabular`, `\includegraphics`) into Markdown/HTML;
//! 3. [`normalize_delimiters`] canonicalizes math delimiters to
//!    `$...$` / `$$...$$`;
//! 4. [`validate_content`] / [`sanitize_content`] reject unsalvageable
//!    content and repair fixable defects;
//! 5. [`render_html`](render_pipeline::render_html) parses the stored
//!    Markdown into section IR and renders it with KaTeX.
//!
//! ```
//! let normalized = texmark::normalize_content(r"La somme \( a+b \) vaut \[ c \]");
//! assert_eq!(normalized, "La somme $ a+b $ vaut $$ c $$");
//! ```

pub mod core;
pub mod data;
pub mod render_pipeline;
pub mod utils;
pub mod wasm;

pub use crate::core::normalize::{
    convert_commands, convert_commands_with_warnings, normalize_content,
    normalize_content_with_diagnostics, normalize_delimiters, normalize_delimiters_with_warnings,
    ContentNormalizer, NormalizeOptions, NormalizeResult, NormalizeWarning, WarningKind,
};
pub use crate::core::repair::{extract_string_field, fix_latex_json_escapes, parse_model_payload};
pub use crate::core::validate::{
    sanitize_content, validate_content, validate_content_with, Sanitized, ValidationPolicy,
    ValidationReport,
};
pub use crate::render_pipeline::{render_html, render_html_default};
pub use crate::utils::error::{
    ContentError, ContentResult, DiagnosticSeverity, PayloadError, PipelineDiagnostic,
};
pub use crate::utils::keys::KeyPool;
pub use crate::utils::retry::{run_with_retry, RetryPolicy};

pub use texmark_html_backend::HtmlRenderOptions;
pub use texmark_ir::{classify, Document, Section, SectionType};

use log::debug;

// =============================================================================
// Persistence Pipeline
// =============================================================================

/// Options for the full persistence pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Normalization passes to run
    pub normalize: NormalizeOptions,
    /// Reject policy for validation
    pub policy: ValidationPolicy,
}

/// Content that passed the pipeline and may be persisted.
#[derive(Debug, Clone)]
pub struct ProcessedContent {
    /// The normalized (and possibly sanitized) content
    pub content: String,
    /// Whether the sanitizer had to modify the normalized content
    pub was_sanitized: bool,
    /// Diagnostics collected across the passes
    pub warnings: Vec<PipelineDiagnostic>,
}

/// Run the persistence pipeline over raw content: command conversion,
/// delimiter normalization, validation, sanitization.
///
/// Rejectable content surfaces as [`ContentError::Rejected`]; the caller
/// must discard it and regenerate rather than persist.
pub fn process_content(raw: &str, options: &PipelineOptions) -> ContentResult<ProcessedContent> {
    let mut normalizer = ContentNormalizer::with_options(options.normalize.clone());
    let normalized = normalizer.normalize(raw);
    let mut warnings: Vec<PipelineDiagnostic> = normalizer
        .take_warnings()
        .into_iter()
        .map(PipelineDiagnostic::from)
        .collect();

    let report = validate_content_with(&normalized, &options.policy);
    if report.should_reject {
        return Err(ContentError::rejected(report.errors));
    }

    let mut content = normalized;
    let mut was_sanitized = false;
    if !report.is_valid {
        let sanitized = sanitize_content(&content);
        was_sanitized = sanitized.was_modified;
        content = sanitized.content;
        for error in &report.errors {
            warnings.push(PipelineDiagnostic::new(
                DiagnosticSeverity::Info,
                "sanitized",
                error.clone(),
            ));
        }
    }

    debug!(
        "processed content: {} bytes, sanitized: {}, warnings: {}",
        content.len(),
        was_sanitized,
        warnings.len()
    );

    Ok(ProcessedContent {
        content,
        was_sanitized,
        warnings,
    })
}

/// Repair and parse a model payload, then run the named string field
/// through the persistence pipeline.
pub fn process_model_field(
    raw_json: &str,
    field: &str,
    options: &PipelineOptions,
) -> ContentResult<ProcessedContent> {
    let payload = parse_model_payload(raw_json)?;
    let value = extract_string_field(&payload, field).ok_or_else(|| {
        ContentError::invalid(format!("payload has no string field '{}'", field))
    })?;
    process_content(value, options)
}
