//! Escape repair for model-generated JSON payloads
//!
//! Generation models asked for JSON frequently emit string values full of
//! LaTeX (`\beta`, `\frac{a}{b}`) without escaping the backslashes, and
//! sometimes real newlines inside string literals. This module repairs
//! those payloads so `serde_json` can parse them, and provides the ordered
//! fallback strategies callers run before giving up.

use log::warn;
use serde_json::Value;

use crate::utils::error::PayloadError;

/// Re-escape LaTeX control sequences inside JSON string literals.
///
/// Input that already parses as JSON is returned unchanged. Otherwise the
/// text is walked character by character, tracking string-literal state:
///
/// - a backslash followed by a JSON-legal escape (`"`, `\`, `/`, `b`, `f`,
///   `n`, `r`, `t`, `u` + 4 hex digits) is kept as-is, except that `\b` /
///   `\f` heads continuing with further alphabetic characters are clearly
///   LaTeX commands (`\beta`, `\frac`) and get their backslash doubled;
/// - any other backslash gets doubled;
/// - literal newlines and carriage returns inside a literal become `\n`.
///
/// Nothing outside string literals is modified.
pub fn fix_latex_json_escapes(raw: &str) -> String {
    if serde_json::from_str::<Value>(raw).is_ok() {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 16);
    let mut in_string = false;
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            i += 1;
            continue;
        }
        match ch {
            '"' => {
                in_string = false;
                out.push(ch);
                i += 1;
            }
            '\\' => {
                let next = chars.get(i + 1).copied();
                match next {
                    Some('u') => {
                        let hex_ok = (2..6)
                            .all(|k| chars.get(i + k).is_some_and(|d| d.is_ascii_hexdigit()));
                        if hex_ok {
                            out.push_str("\\u");
                            i += 2;
                        } else {
                            // \underline, \upsilon, ... not a unicode escape
                            out.push_str("\\\\");
                            i += 1;
                        }
                    }
                    Some('b' | 'f')
                        if chars.get(i + 2).is_some_and(|d| d.is_ascii_alphabetic()) =>
                    {
                        // \beta, \frac: collides with JSON's \b / \f but the
                        // trailing letters mark it as a LaTeX command
                        out.push_str("\\\\");
                        i += 1;
                    }
                    Some(c) if matches!(c, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                        out.push('\\');
                        out.push(c);
                        i += 2;
                    }
                    Some(_) | None => {
                        out.push_str("\\\\");
                        i += 1;
                    }
                }
            }
            '\n' => {
                out.push_str("\\n");
                i += 1;
            }
            '\r' => {
                out.push_str("\\n");
                i += 1;
                if chars.get(i) == Some(&'\n') {
                    i += 1;
                }
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

/// Parse a model payload, falling through the ordered strategy list:
/// direct repair+parse, code-fence stripping, first-object extraction.
///
/// Returns the typed [`PayloadError`] with the full strategy trail when
/// every strategy fails; never panics.
pub fn parse_model_payload(raw: &str) -> Result<Value, PayloadError> {
    let mut attempts = Vec::new();

    match serde_json::from_str::<Value>(&fix_latex_json_escapes(raw)) {
        Ok(value) => return Ok(value),
        Err(err) => attempts.push(format!("direct: {}", err)),
    }

    match strip_code_fences(raw) {
        Some(stripped) => match serde_json::from_str::<Value>(&fix_latex_json_escapes(stripped)) {
            Ok(value) => return Ok(value),
            Err(err) => attempts.push(format!("fenced: {}", err)),
        },
        None => attempts.push("fenced: no code fence found".to_string()),
    }

    match extract_first_object(raw) {
        Some(extracted) => {
            match serde_json::from_str::<Value>(&fix_latex_json_escapes(extracted)) {
                Ok(value) => return Ok(value),
                Err(err) => attempts.push(format!("extracted: {}", err)),
            }
        }
        None => attempts.push("extracted: no top-level object found".to_string()),
    }

    warn!("model payload unparseable after {} strategies", attempts.len());
    Err(PayloadError::new(attempts))
}

/// Fetch a string field from a parsed payload.
pub fn extract_string_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

/// Strip a surrounding Markdown code fence (```/```json) if the payload is
/// wrapped in one.
fn strip_code_fences(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let rest = trimmed.strip_prefix("```")?;
    // Skip an info string like "json" on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    let inner = rest.strip_suffix("```").unwrap_or(rest);
    Some(inner.trim())
}

/// Extract the first balanced top-level `{...}` span, string-aware.
fn extract_first_object(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let start = raw.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string && i + 1 < bytes.len() => {
                i += 2;
                continue;
            }
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
