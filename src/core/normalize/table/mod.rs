//! Conversion of LaTeX table environments to HTML tables
//!
//! `array` and `tabular` environments are block-level structure, not math
//! primitives: an enclosing `$$...$$` / `\[...\]` wrapper is stripped before
//! conversion so tables are never left double-wrapped in a math block.

mod parser;


use super::{NormalizeWarning, WarningKind};
use parser::{count_spec_columns, EnvKind, TableGridParser};

/// Convert every `array` / `tabular` environment in `text` to an HTML
/// table. Nested environments resolve over successive rounds; the round cap
/// only guards against pathological self-referential input.
pub(crate) fn convert_environments(text: &str, warnings: &mut Vec<NormalizeWarning>) -> String {
    let mut current = text.to_string();
    for _ in 0..4 {
        let (next, changed) = convert_once(&current, warnings);
        current = next;
        if !changed {
            break;
        }
    }
    current
}

fn convert_once(text: &str, warnings: &mut Vec<NormalizeWarning>) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    let mut changed = false;

    while i < text.len() {
        let rest = &text[i..];
        let next_env = find_next_env(rest);
        let Some((offset, kind)) = next_env else {
            out.push_str(rest);
            break;
        };

        let env_start = i + offset;
        out.push_str(&text[i..env_start]);

        let begin_token = format!("\\begin{{{}}}", kind.name());
        let end_token = format!("\\end{{{}}}", kind.name());
        let after_begin = env_start + begin_token.len();

        // Optional column spec
        let (spec, body_start) = match extract_colspec(&text[after_begin..]) {
            Some((spec, used)) => (spec, after_begin + used),
            None => (String::new(), after_begin),
        };

        let (body, env_end) = match find_matching_end(&text[body_start..], &begin_token, &end_token)
        {
            Some((body_len, total_len)) => (
                &text[body_start..body_start + body_len],
                body_start + total_len,
            ),
            None => {
                // Runaway environment: convert the remainder best-effort.
                warnings.push(
                    NormalizeWarning::new(
                        WarningKind::MalformedEnvironment,
                        format!("'{}' has no matching '{}'", begin_token, end_token),
                    )
                    .with_location(format!("offset {}", env_start)),
                );
                (&text[body_start..], text.len())
            }
        };

        // Strip a directly-enclosing math wrapper: `$$`/`\[` just before the
        // environment and `$$`/`\]` just after it (whitespace permitted).
        let mut resume = env_end;
        let trimmed_out_len = out.trim_end().len();
        let open_wrapper = wrapper_before(&out[..trimmed_out_len]);
        if let Some(open_len) = open_wrapper {
            if let Some(close_len) = wrapper_after(&text[env_end..]) {
                out.truncate(trimmed_out_len - open_len);
                resume = env_end + close_len;
                warnings.push(NormalizeWarning::new(
                    WarningKind::StrippedWrapper,
                    format!("math wrapper stripped around '{}'", begin_token),
                ));
            }
        }

        let mut grid = TableGridParser::new(kind, count_spec_columns(&spec));
        grid.parse_body(body);

        if !out.ends_with('\n') && !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&grid.generate_html());
        out.push('\n');

        changed = true;
        i = resume;
    }

    (out, changed)
}

fn find_next_env(text: &str) -> Option<(usize, EnvKind)> {
    let array = text.find("\\begin{array}").map(|p| (p, EnvKind::Array));
    let tabular = text.find("\\begin{tabular}").map(|p| (p, EnvKind::Tabular));
    match (array, tabular) {
        (Some(a), Some(t)) => Some(if a.0 <= t.0 { a } else { t }),
        (Some(a), None) => Some(a),
        (None, Some(t)) => Some(t),
        (None, None) => None,
    }
}

/// Extract the `{|c|c|}` column spec at the start of `text`, if present.
/// Returns the spec content and the bytes consumed.
fn extract_colspec(text: &str) -> Option<(String, usize)> {
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    if !trimmed.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let spec = trimmed[1..idx].to_string();
                    return Some((spec, lead + idx + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Find the matching `\end{...}` for an environment whose body starts at the
/// beginning of `text`, counting nested same-name environments. Returns
/// (body length, length through the end token).
fn find_matching_end(text: &str, begin_token: &str, end_token: &str) -> Option<(usize, usize)> {
    let mut depth = 1i32;
    let mut pos = 0usize;
    while pos < text.len() {
        let rest = &text[pos..];
        let next_begin = rest.find(begin_token);
        let next_end = rest.find(end_token)?;
        if let Some(nb) = next_begin {
            if nb < next_end {
                depth += 1;
                pos += nb + begin_token.len();
                continue;
            }
        }
        depth -= 1;
        if depth == 0 {
            return Some((pos + next_end, pos + next_end + end_token.len()));
        }
        pos += next_end + end_token.len();
    }
    None
}

/// Length of a `$$` / `\[` wrapper token at the very end of `out`, if any.
fn wrapper_before(out: &str) -> Option<usize> {
    if out.ends_with("$$") || out.ends_with("\\[") {
        Some(2)
    } else {
        None
    }
}

/// Bytes to skip for a `$$` / `\]` wrapper token directly after the
/// environment (whitespace permitted), if any.
fn wrapper_after(text: &str) -> Option<usize> {
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    if trimmed.starts_with("$$") || trimmed.starts_with("\\]") {
        Some(lead + 2)
    } else {
        None
    }
}
