//! Math delimiter normalization
//!
//! Rewrites the ad-hoc delimiter mix found in authored and generated content
//! (`\(...\)`, `\[...\]`, bare `$`) into the canonical `$...$` / `$$...$$`
//! convention. The pass is idempotent: running it on its own output is a
//! no-op.

use super::{NormalizeWarning, WarningKind};

/// Normalize math delimiters to `$...$` / `$$...$$`.
///
/// Fenced code blocks are copied verbatim. Unmatched delimiters are left as
/// literal text and reported through the diagnostics variant.
pub fn normalize_delimiters(text: &str) -> String {
    let mut warnings = Vec::new();
    normalize_delimiters_impl(text, &mut warnings)
}

/// Normalize math delimiters, collecting warnings for unmatched spans.
pub fn normalize_delimiters_with_warnings(text: &str) -> (String, Vec<NormalizeWarning>) {
    let mut warnings = Vec::new();
    let output = normalize_delimiters_impl(text, &mut warnings);
    (output, warnings)
}

pub(crate) fn normalize_delimiters_impl(
    text: &str,
    warnings: &mut Vec<NormalizeWarning>,
) -> String {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len + 16);
    let mut i = 0usize;
    let mut at_line_start = true;

    while i < len {
        if at_line_start && is_fence_line(text, i) {
            // Copy the whole fenced block verbatim, closing fence included.
            let end = fence_block_end(text, i);
            out.push_str(&text[i..end]);
            i = end;
            at_line_start = true;
            continue;
        }

        match bytes[i] {
            b'\\' if i + 1 < len => {
                let next = bytes[i + 1];
                if next == b'(' {
                    match find_paren_close(text, i + 2, b')') {
                        Some(j) => {
                            emit_span(&mut out, &text[i + 2..j], false);
                            i = j + 2;
                        }
                        None => {
                            warnings.push(unmatched(r"\(", i));
                            out.push_str("\\(");
                            i += 2;
                        }
                    }
                } else if next == b'[' {
                    match find_paren_close(text, i + 2, b']') {
                        Some(j) => {
                            emit_span(&mut out, &text[i + 2..j], true);
                            i = j + 2;
                        }
                        None => {
                            warnings.push(unmatched(r"\[", i));
                            out.push_str("\\[");
                            i += 2;
                        }
                    }
                } else {
                    // Copy the backslash and the escaped character, so an
                    // escaped dollar never opens a span.
                    out.push('\\');
                    let ch = text[i + 1..].chars().next().unwrap_or('\\');
                    out.push(ch);
                    i += 1 + ch.len_utf8();
                }
                at_line_start = false;
            }
            b'$' => {
                let double = i + 1 < len && bytes[i + 1] == b'$';
                if double {
                    match find_dollar_close(text, i + 2, true) {
                        Some(j) => {
                            emit_span(&mut out, &text[i + 2..j], true);
                            i = j + 2;
                        }
                        None => {
                            warnings.push(unmatched("$$", i));
                            out.push_str("$$");
                            i += 2;
                        }
                    }
                } else {
                    match find_dollar_close(text, i + 1, false) {
                        Some(j) => {
                            let body = &text[i + 1..j];
                            if looks_like_currency(body) {
                                // Best-effort currency heuristic: a span whose
                                // body has no letter and no control sequence,
                                // with both delimiters on one line, is treated
                                // as literal text ("$5 $10" stays untouched).
                                out.push_str(&text[i..j + 1]);
                                i = j + 1;
                            } else {
                                emit_span(&mut out, body, false);
                                i = j + 1;
                            }
                        }
                        None => {
                            warnings.push(unmatched("$", i));
                            out.push('$');
                            i += 1;
                        }
                    }
                }
                at_line_start = false;
            }
            b'\n' => {
                out.push('\n');
                i += 1;
                at_line_start = true;
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
                out.push(ch);
                i += ch.len_utf8();
                at_line_start = false;
            }
        }
    }

    out
}

fn unmatched(token: &str, offset: usize) -> NormalizeWarning {
    NormalizeWarning::new(
        WarningKind::UnmatchedDelimiter,
        format!("'{}' has no matching close before a block boundary", token),
    )
    .with_location(format!("offset {}", offset))
}

/// Emit a canonical math span, collapsing whitespace runs at the two
/// delimiter boundaries (a run containing a newline collapses to one
/// newline, any other run to one space). The collapse is a fixed point,
/// which keeps the whole pass idempotent.
fn emit_span(out: &mut String, body: &str, display: bool) {
    let open = if display { "$$" } else { "$" };
    out.push_str(open);

    let trimmed_start = body.trim_start();
    let lead = &body[..body.len() - trimmed_start.len()];
    let trimmed = trimmed_start.trim_end();
    let tail = &trimmed_start[trimmed.len()..];

    push_boundary(out, lead);
    out.push_str(trimmed);
    // An all-whitespace body contributes a single boundary only.
    if !trimmed.is_empty() {
        push_boundary(out, tail);
    }
    out.push_str(open);
}

fn push_boundary(out: &mut String, run: &str) {
    if run.is_empty() {
        return;
    }
    if run.contains('\n') {
        out.push('\n');
    } else {
        out.push(' ');
    }
}

/// Find the closing `\)` / `\]` for a span opened at `start`, respecting
/// brace depth. Returns the byte offset of the backslash of the close token.
fn find_paren_close(text: &str, start: usize, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut depth = 0i32;
    let mut i = start;
    while i < len {
        match bytes[i] {
            b'\\' if i + 1 < len => {
                let next = bytes[i + 1];
                if next == close && depth == 0 {
                    return Some(i);
                }
                // Escaped braces do not affect depth; any other escape is
                // skipped as a unit.
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            b'\n' => {
                if at_blank_line_boundary(bytes, i) {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the closing `$` (or `$$`) for a span opened at `start`, respecting
/// brace depth and stopping at a blank-line block boundary.
fn find_dollar_close(text: &str, start: usize, double: bool) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut depth = 0i32;
    let mut i = start;
    while i < len {
        match bytes[i] {
            b'\\' if i + 1 < len => {
                // Skip escape pairs, so `\$` and `\{` are inert.
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            b'$' if depth == 0 => {
                if double {
                    if i + 1 < len && bytes[i + 1] == b'$' {
                        return Some(i);
                    }
                } else {
                    return Some(i);
                }
            }
            b'\n' => {
                if at_blank_line_boundary(bytes, i) {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// True when the newline at `i` is followed (modulo spaces/tabs) by another
/// newline, i.e. the span would cross a paragraph break.
fn at_blank_line_boundary(bytes: &[u8], i: usize) -> bool {
    let mut j = i + 1;
    while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
        j += 1;
    }
    j < bytes.len() && bytes[j] == b'\n'
}

/// Currency heuristic: reject candidate inline spans whose body contains no
/// alphabetic character and no backslash command, when the whole span sits
/// on one line. False positives/negatives are accepted ("$5$" stays literal,
/// "$x$" is math).
fn looks_like_currency(body: &str) -> bool {
    if body.contains('\n') {
        return false;
    }
    !body.chars().any(|c| c.is_alphabetic() || c == '\\')
}

/// True when the line starting at `i` opens or closes a code fence.
fn is_fence_line(text: &str, i: usize) -> bool {
    let line_end = text[i..].find('\n').map(|p| i + p).unwrap_or(text.len());
    let line = &text[i..line_end];
    let trimmed = line.trim_start_matches(' ');
    line.len() - trimmed.len() <= 3 && trimmed.starts_with("```")
}

/// Byte offset just past the fenced block opened at `i` (or end of input if
/// the fence is never closed).
fn fence_block_end(text: &str, i: usize) -> usize {
    let open_line_end = match text[i..].find('\n') {
        Some(p) => i + p + 1,
        None => return text.len(),
    };
    let mut pos = open_line_end;
    while pos < text.len() {
        let line_end = text[pos..]
            .find('\n')
            .map(|p| pos + p + 1)
            .unwrap_or(text.len());
        if is_fence_line(text, pos) {
            return line_end;
        }
        pos = line_end;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paren_delimiters_convert() {
        assert_eq!(
            normalize_delimiters(r"La somme \( a+b \) vaut \[ c \]"),
            "La somme $ a+b $ vaut $$ c $$"
        );
    }

    #[test]
    fn test_tight_paren_delimiters() {
        assert_eq!(normalize_delimiters(r"\(x\)"), "$x$");
        assert_eq!(normalize_delimiters(r"\[y\]"), "$$y$$");
    }

    #[test]
    fn test_canonical_spans_kept() {
        assert_eq!(normalize_delimiters("$x+1$"), "$x+1$");
        assert_eq!(normalize_delimiters("$$\\frac{a}{b}$$"), "$$\\frac{a}{b}$$");
    }

    #[test]
    fn test_boundary_whitespace_collapsed() {
        assert_eq!(normalize_delimiters("$   x   $"), "$ x $");
        assert_eq!(normalize_delimiters("$$  y $$"), "$$ y $$");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r"La somme \( a+b \) vaut \[ c \]",
            "$  x $ et $$y$$",
            "prix: $5 $10",
            "un $ tout seul",
            "```\n$code \\( brut \\)$\n```\ntexte \\(a\\)",
            r"\(\text{si } x > 0\)",
        ];
        for input in inputs {
            let once = normalize_delimiters(input);
            let twice = normalize_delimiters(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_braces_protect_inner_dollars() {
        let input = r"\(\text{prix en $}\)";
        let out = normalize_delimiters(input);
        assert_eq!(out, "$\\text{prix en $}$");
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        let out = normalize_delimiters(r"montant \$5 et $x$");
        assert_eq!(out, r"montant \$5 et $x$");
    }

    #[test]
    fn test_currency_not_coalesced() {
        assert_eq!(normalize_delimiters("$5 $10"), "$5 $10");
        assert_eq!(normalize_delimiters("entre $5$ et plus"), "entre $5$ et plus");
    }

    #[test]
    fn test_math_with_letters_still_math() {
        assert_eq!(normalize_delimiters("$ 2x $"), "$ 2x $");
    }

    #[test]
    fn test_unmatched_dollar_is_literal_and_reported() {
        let (out, warnings) = normalize_delimiters_with_warnings("un $ tout seul");
        assert_eq!(out, "un $ tout seul");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnmatchedDelimiter);
    }

    #[test]
    fn test_unmatched_stops_at_blank_line() {
        let input = "avant $ coupe\n\napres x fin";
        let (out, warnings) = normalize_delimiters_with_warnings(input);
        assert_eq!(out, input);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_display_span_may_cross_single_newline() {
        let input = "$$\n\\frac{a}{b}\n$$";
        assert_eq!(normalize_delimiters(input), "$$\n\\frac{a}{b}\n$$");
    }

    #[test]
    fn test_code_fence_untouched() {
        let input = "```\nlet x = \\( 1 \\);\n```\nhors bloc \\( y \\)";
        let out = normalize_delimiters(input);
        assert!(out.contains("let x = \\( 1 \\);"));
        assert!(out.ends_with("hors bloc $ y $"));
    }

    #[test]
    fn test_unclosed_fence_copies_rest() {
        let input = "```\n\\( jamais converti \\)";
        assert_eq!(normalize_delimiters(input), input);
    }

    #[test]
    fn test_unmatched_paren_open() {
        let (out, warnings) = normalize_delimiters_with_warnings(r"reste \( ouvert");
        assert_eq!(out, r"reste \( ouvert");
        assert_eq!(warnings.len(), 1);
    }
}
