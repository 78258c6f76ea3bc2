//! Content validation and sanitization
//!
//! `validate_content` classifies content into three outcomes: valid,
//! fixable (soft defects the sanitizer repairs), or rejectable (the caller
//! must discard and regenerate). `sanitize_content` applies only the soft
//! fixes; it never silently removes rejectable content.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::maps::{
    INJECTION_MARKERS, PLACEHOLDER_MARKERS, UNICODE_MATH_REPLACEMENTS, ZERO_WIDTH_CHARS,
};

lazy_static! {
    static ref EXCESS_BLANK_LINES: Regex = Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap();
}

/// Outcome of content validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when the content needs no fix at all
    pub is_valid: bool,
    /// True when the content is unsalvageable and must be regenerated
    pub should_reject: bool,
    /// Human-readable findings, in detection order
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            should_reject: false,
            errors: Vec::new(),
        }
    }
}

/// Reject conditions are policy, not hardcoded heuristics: callers may
/// extend the marker lists for their content type.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    /// Phrases marking stand-in content (matched on lowercased text)
    pub placeholder_markers: Vec<String>,
    /// Markers of injected directives (matched on lowercased text)
    pub injection_markers: Vec<String>,
    /// Minimum count of alphanumeric characters, markers excluded, for
    /// content containing a placeholder marker to escape rejection
    pub min_substance_chars: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            placeholder_markers: PLACEHOLDER_MARKERS.iter().map(|s| s.to_string()).collect(),
            injection_markers: INJECTION_MARKERS.iter().map(|s| s.to_string()).collect(),
            min_substance_chars: 40,
        }
    }
}

/// Result of sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub content: String,
    pub was_modified: bool,
}

/// Validate content against the default policy.
pub fn validate_content(text: &str) -> ValidationReport {
    validate_content_with(text, &ValidationPolicy::default())
}

/// Validate content against an explicit policy.
pub fn validate_content_with(text: &str, policy: &ValidationPolicy) -> ValidationReport {
    let mut errors: IndexSet<String> = IndexSet::new();
    let mut should_reject = false;

    if text.trim().is_empty() {
        return ValidationReport {
            is_valid: false,
            should_reject: true,
            errors: vec!["empty content".to_string()],
        };
    }

    let lowered = text.to_lowercase();

    for marker in &policy.injection_markers {
        if lowered.contains(marker.as_str()) {
            should_reject = true;
            errors.insert(format!("injected directive: '{}'", marker));
        }
    }

    let has_placeholder = policy
        .placeholder_markers
        .iter()
        .any(|m| lowered.contains(m.as_str()));
    if has_placeholder && substance_chars(&lowered, &policy.placeholder_markers) < policy.min_substance_chars
    {
        should_reject = true;
        errors.insert("placeholder-only content".to_string());
    }

    for (description, fix) in SOFT_FIXES {
        if fix(text) != text {
            errors.insert(format!("fixable: {}", description));
        }
    }

    let errors: Vec<String> = errors.into_iter().collect();
    ValidationReport {
        is_valid: errors.is_empty(),
        should_reject,
        errors,
    }
}

/// Apply the soft fixes, reporting whether anything changed. Idempotent on
/// already-sanitized input; rejectable content passes through untouched.
pub fn sanitize_content(text: &str) -> Sanitized {
    let mut current = text.to_string();
    for (_, fix) in SOFT_FIXES {
        current = fix(&current);
    }
    Sanitized {
        was_modified: current != text,
        content: current,
    }
}

/// Alphanumeric character count once the given markers are removed.
fn substance_chars(lowered: &str, markers: &[String]) -> usize {
    let mut stripped = lowered.to_string();
    for marker in markers {
        stripped = stripped.replace(marker.as_str(), "");
    }
    stripped.chars().filter(|c| c.is_alphanumeric()).count()
}

type SoftFix = fn(&str) -> String;

/// The closed list of soft fixes, applied in order.
const SOFT_FIXES: &[(&str, SoftFix)] = &[
    ("carriage return", fix_carriage_returns),
    ("literal escaped newline", fix_literal_newlines),
    ("zero-width character", fix_zero_width),
    ("non-breaking space", fix_nbsp),
    ("unicode math symbol", fix_unicode_math),
    ("excess blank lines", fix_blank_lines),
];

fn fix_carriage_returns(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace the two-character sequence `\n` with a real newline, outside
/// math spans only, and only when no lowercase letter follows (so `\neq`,
/// `\nu`, `\nabla` survive even when a math span went undelimited).
fn fix_literal_newlines(text: &str) -> String {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut in_math = false;
    let mut i = 0usize;

    while i < len {
        match bytes[i] {
            b'\\' if i + 1 < len => {
                if bytes[i + 1] == b'n'
                    && !in_math
                    && !bytes
                        .get(i + 2)
                        .is_some_and(|c| c.is_ascii_lowercase())
                {
                    out.push('\n');
                    i += 2;
                } else {
                    out.push('\\');
                    let ch = text[i + 1..].chars().next().unwrap_or('\\');
                    out.push(ch);
                    i += 1 + ch.len_utf8();
                }
            }
            b'$' => {
                out.push('$');
                if i + 1 < len && bytes[i + 1] == b'$' {
                    out.push('$');
                    i += 2;
                } else {
                    i += 1;
                }
                in_math = !in_math;
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    out
}

fn fix_zero_width(text: &str) -> String {
    if !text.chars().any(|c| ZERO_WIDTH_CHARS.contains(&c)) {
        return text.to_string();
    }
    text.chars()
        .filter(|c| !ZERO_WIDTH_CHARS.contains(c))
        .collect()
}

fn fix_nbsp(text: &str) -> String {
    if !text.contains('\u{00A0}') {
        return text.to_string();
    }
    text.replace('\u{00A0}', " ")
}

/// Rewrite Unicode math symbols to their LaTeX commands, inside math spans
/// only (prose arrows are left alone).
fn fix_unicode_math(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_math = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '$' => {
                out.push('$');
                if chars.peek() == Some(&'$') {
                    out.push('$');
                    chars.next();
                }
                in_math = !in_math;
            }
            _ if in_math => match UNICODE_MATH_REPLACEMENTS.get(&ch) {
                Some(replacement) => {
                    out.push_str(replacement);
                    // Keep the command separated from a following letter
                    if chars.peek().is_some_and(|c| c.is_alphanumeric()) {
                        out.push(' ');
                    }
                }
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

fn fix_blank_lines(text: &str) -> String {
    EXCESS_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}
