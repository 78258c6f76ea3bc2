//! Legacy document-command conversion
//!
//! Rewrites document-authoring commands (`\includegraphics`, sectioning,
//! text styles, list environments) into the Markdown/HTML the renderer
//! consumes. Table environments are handled by the `table` module, which
//! runs first so math wrappers around them are stripped before any other
//! rewrite.

use lazy_static::lazy_static;
use regex::Regex;

use super::{table, NormalizeWarning, WarningKind};
use crate::data::maps::{SECTION_COMMANDS, TEXT_STYLE_COMMANDS};

lazy_static! {
    static ref WIDTH_OPTION: Regex =
        Regex::new(r"width\s*=\s*([0-9]*\.?[0-9]+)\s*\\(?:linewidth|textwidth)").unwrap();
}

/// Convert legacy document commands to Markdown/HTML.
///
/// Guarantees: the output contains no `\begin{tabular}` and no bare
/// `\includegraphics`. Malformed input degrades best-effort, never panics.
pub fn convert_commands(text: &str) -> String {
    let mut warnings = Vec::new();
    convert_commands_impl(text, &mut warnings)
}

/// Convert legacy document commands, collecting warnings.
pub fn convert_commands_with_warnings(text: &str) -> (String, Vec<NormalizeWarning>) {
    let mut warnings = Vec::new();
    let output = convert_commands_impl(text, &mut warnings);
    (output, warnings)
}

pub(crate) fn convert_commands_impl(
    text: &str,
    warnings: &mut Vec<NormalizeWarning>,
) -> String {
    let mut out = table::convert_environments(text, warnings);
    out = convert_includegraphics(&out, warnings);
    out = convert_sections(&out);
    out = convert_text_styles(&out, 0);
    out = convert_lists(&out);
    out = out.replace("\\newline", "\n");
    out
}

/// Extract the content of a braced group starting at the first byte of `s`
/// (which must be `{`). Returns the inner content and the bytes consumed
/// including both braces.
pub(crate) fn extract_braced_content(s: &str) -> (Option<&str>, usize) {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes[0] != b'{' {
        return (None, 0);
    }
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return (Some(&s[1..i]), i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    (None, s.len())
}

/// Rewrite `\includegraphics[width=<f>\linewidth]{path}` to an HTML image
/// whose rendered width is `<f>*100`%, defaulting to full width.
fn convert_includegraphics(text: &str, warnings: &mut Vec<NormalizeWarning>) -> String {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0usize;

    while i < len {
        if bytes[i] == b'\\' && text[i..].starts_with("\\includegraphics") {
            let mut j = i + "\\includegraphics".len();
            if j < len && bytes[j] == b'*' {
                j += 1;
            }
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            // Optional [...] block, bracket depth aware
            let mut options = "";
            if j < len && bytes[j] == b'[' {
                let opt_start = j + 1;
                let mut depth = 0i32;
                while j < len {
                    match bytes[j] {
                        b'[' => depth += 1,
                        b']' => {
                            depth -= 1;
                            if depth == 0 {
                                options = &text[opt_start..j];
                                j += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
            }
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && bytes[j] == b'{' {
                let (content, used) = extract_braced_content(&text[j..]);
                if let Some(path) = content {
                    let path = path.trim();
                    out.push_str(&image_tag(path, options));
                    i = j + used;
                    continue;
                }
            }
            // No braced path: drop the command so none survives bare.
            warnings.push(
                NormalizeWarning::new(
                    WarningKind::MalformedCommand,
                    "\\includegraphics without a braced path was dropped",
                )
                .with_location(format!("offset {}", i)),
            );
            i = j;
            continue;
        }
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn image_tag(path: &str, options: &str) -> String {
    let percent = WIDTH_OPTION
        .captures(options)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|f| f * 100.0)
        .unwrap_or(100.0);
    let alt = path
        .rsplit('/')
        .next()
        .and_then(|name| name.split('.').next())
        .unwrap_or("image");
    format!(
        r#"<img src="{}" alt="{}" style="width: {}%">"#,
        path,
        alt,
        format_percent(percent)
    )
}

fn format_percent(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// Rewrite `\section{...}` style commands to Markdown headings.
fn convert_sections(text: &str) -> String {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0usize;

    while i < len {
        if bytes[i] == b'\\' {
            let word_start = i + 1;
            let mut k = word_start;
            while k < len && bytes[k].is_ascii_alphabetic() {
                k += 1;
            }
            let word = &text[word_start..k];
            if let Some(prefix) = SECTION_COMMANDS.get(word) {
                let mut j = k;
                if j < len && bytes[j] == b'*' {
                    j += 1;
                }
                while j < len && (bytes[j] == b' ' || bytes[j] == b'\t') {
                    j += 1;
                }
                if j < len && bytes[j] == b'{' {
                    let (content, used) = extract_braced_content(&text[j..]);
                    if let Some(title) = content {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str(prefix);
                        out.push(' ');
                        out.push_str(title.trim());
                        out.push('\n');
                        i = j + used;
                        continue;
                    }
                }
            }
        }
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Rewrite text-style commands (`\textbf`, `\textit`, `\emph`, ...) to
/// their Markdown/HTML wrappers, recursing into the argument.
fn convert_text_styles(text: &str, depth: usize) -> String {
    // Nesting deeper than this is not content, it is an attack.
    if depth > 8 {
        return text.to_string();
    }
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0usize;

    while i < len {
        if bytes[i] == b'\\' {
            let word_start = i + 1;
            let mut k = word_start;
            while k < len && bytes[k].is_ascii_alphabetic() {
                k += 1;
            }
            let word = &text[word_start..k];
            if let Some((open, close)) = TEXT_STYLE_COMMANDS.get(word) {
                if k < len && bytes[k] == b'{' {
                    let (content, used) = extract_braced_content(&text[k..]);
                    if let Some(inner) = content {
                        out.push_str(open);
                        out.push_str(&convert_text_styles(inner, depth + 1));
                        out.push_str(close);
                        i = k + used;
                        continue;
                    }
                }
            }
        }
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Rewrite `itemize` / `enumerate` environments to Markdown lists.
fn convert_lists(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..4 {
        let (next, changed) = convert_lists_once(&current);
        current = next;
        if !changed {
            break;
        }
    }
    current
}

fn convert_lists_once(text: &str) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    let mut changed = false;

    while i < text.len() {
        let rest = &text[i..];
        let bullet = rest.find("\\begin{itemize}").map(|p| (p, true));
        let ordered = rest.find("\\begin{enumerate}").map(|p| (p, false));
        let next = match (bullet, ordered) {
            (Some(b), Some(o)) => Some(if b.0 <= o.0 { b } else { o }),
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (None, None) => None,
        };
        let Some((offset, is_bullet)) = next else {
            out.push_str(rest);
            break;
        };

        let env = if is_bullet { "itemize" } else { "enumerate" };
        let begin_token = format!("\\begin{{{}}}", env);
        let end_token = format!("\\end{{{}}}", env);
        let body_start = i + offset + begin_token.len();

        out.push_str(&text[i..i + offset]);

        let (body, consumed) = match find_env_end(&text[body_start..], &begin_token, &end_token) {
            Some((body_len, total)) => (&text[body_start..body_start + body_len], total),
            None => (&text[body_start..], text.len() - body_start),
        };

        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for (idx, item) in split_items(body).into_iter().enumerate() {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if is_bullet {
                out.push_str("- ");
            } else {
                out.push_str(&format!("{}. ", idx + 1));
            }
            out.push_str(item);
            out.push('\n');
        }

        changed = true;
        i = body_start + consumed;
    }

    (out, changed)
}

fn find_env_end(text: &str, begin_token: &str, end_token: &str) -> Option<(usize, usize)> {
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

/// Split a list body on `\item` at environment depth zero.
fn split_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut env_depth = 0i32;
    let mut i = 0usize;
    let mut seen_item = false;

    while i < body.len() {
        let rest = &body[i..];
        if rest.starts_with("\\begin{") {
            env_depth += 1;
        } else if rest.starts_with("\\end{") {
            env_depth = (env_depth - 1).max(0);
        } else if env_depth == 0 && rest.starts_with("\\item") {
            // Only whole-word \item (not \itemsep etc.)
            let after = &rest["\\item".len()..];
            if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                if seen_item {
                    items.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                    seen_item = true;
                }
                i += "\\item".len();
                continue;
            }
        }
        let ch = rest.chars().next().unwrap_or('\u{FFFD}');
        current.push(ch);
        i += ch.len_utf8();
    }
    if seen_item {
        items.push(current);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includegraphics_with_width() {
        let out = convert_commands(r"\includegraphics[width=0.5\linewidth]{foo.png}");
        assert!(out.contains(r#"src="foo.png""#));
        assert!(out.contains("width: 50%"));
    }

    #[test]
    fn test_includegraphics_default_width() {
        let out = convert_commands(r"\includegraphics{foo.png}");
        assert!(out.contains("width: 100%"));
    }

    #[test]
    fn test_includegraphics_textwidth_and_fraction() {
        let out = convert_commands(r"\includegraphics[width=0.33\textwidth]{img/fig.jpeg}");
        assert!(out.contains("width: 33%"));
        assert!(out.contains(r#"alt="fig""#));
    }

    #[test]
    fn test_no_bare_includegraphics_survives() {
        let inputs = [
            r"\includegraphics{a.png}",
            r"\includegraphics[width=0.7\linewidth]{b.png}",
            r"\includegraphics sans accolades",
        ];
        for input in inputs {
            let out = convert_commands(input);
            assert!(
                !out.contains("\\includegraphics"),
                "bare command left for {:?}: {}",
                input,
                out
            );
        }
    }

    #[test]
    fn test_sections_to_headings() {
        let out = convert_commands(r"\section{Fonctions} texte \subsection{Limites}");
        assert!(out.contains("## Fonctions"));
        assert!(out.contains("### Limites"));
    }

    #[test]
    fn test_starred_section() {
        let out = convert_commands(r"\section*{Annexe}");
        assert!(out.contains("## Annexe"));
    }

    #[test]
    fn test_text_styles() {
        assert_eq!(convert_commands(r"\textbf{gras}"), "**gras**");
        assert_eq!(convert_commands(r"\emph{important}"), "*important*");
        assert_eq!(
            convert_commands(r"\textbf{tout \textit{ceci}}"),
            "**tout *ceci***"
        );
    }

    #[test]
    fn test_itemize_to_bullets() {
        let out = convert_commands(r"\begin{itemize}\item premier \item second\end{itemize}");
        assert!(out.contains("- premier"));
        assert!(out.contains("- second"));
        assert!(!out.contains("\\item"));
    }

    #[test]
    fn test_enumerate_numbers_items() {
        let out = convert_commands(r"\begin{enumerate}\item a \item b \item c\end{enumerate}");
        assert!(out.contains("1. a"));
        assert!(out.contains("2. b"));
        assert!(out.contains("3. c"));
    }

    #[test]
    fn test_newline_command() {
        assert_eq!(convert_commands(r"ligne\newline suite"), "ligne\n suite");
    }

    #[test]
    fn test_unknown_commands_pass_through() {
        let input = r"\frac{a}{b} et \vec{u}";
        assert_eq!(convert_commands(input), input);
    }

    #[test]
    fn test_braced_extraction_nested() {
        let (content, used) = extract_braced_content(r"{a{b}c} reste");
        assert_eq!(content, Some("a{b}c"));
        assert_eq!(used, 7);
    }

    #[test]
    fn test_braced_extraction_unclosed() {
        let (content, _) = extract_braced_content(r"{jamais ferme");
        assert_eq!(content, None);
    }
}
