//! State-aware grid parser for LaTeX table environments

/// Environment flavor being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    /// Math-mode `array`: cells are re-wrapped in `$...$`.
    Array,
    /// Text-mode `tabular`: cells are opaque text.
    Tabular,
}

impl EnvKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnvKind::Array => "array",
            EnvKind::Tabular => "tabular",
        }
    }
}

/// Grid parser for `array` / `tabular` bodies.
///
/// Maintains the maximum column count observed while parsing rows so that
/// ragged rows can be padded with empty trailing cells.
pub struct TableGridParser {
    kind: EnvKind,
    /// Column count declared by the `{|c|c|}` spec.
    spec_cols: usize,
    /// Maximum column count observed while parsing rows
    max_cols: usize,
    /// Parsed rows, one Vec of raw cell strings per row
    pub rows: Vec<Vec<String>>,
}

impl TableGridParser {
    pub fn new(kind: EnvKind, spec_cols: usize) -> Self {
        TableGridParser {
            kind,
            spec_cols,
            max_cols: 0,
            rows: Vec::new(),
        }
    }

    /// Parse the environment body: `\hline` tokens are stripped, rows split
    /// on `\\`, cells on `&`. Splitting respects brace depth and nested
    /// environments, so a `\\` inside a nested `array` never breaks a row.
    pub fn parse_body(&mut self, body: &str) {
        for raw_row in split_rows(body) {
            let cleaned = strip_rules(&raw_row);
            if cleaned.trim().is_empty() {
                continue;
            }
            let cells: Vec<String> = split_cells(&cleaned)
                .into_iter()
                .map(|c| c.trim().to_string())
                .collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            if cells.len() > self.max_cols {
                self.max_cols = cells.len();
            }
            self.rows.push(cells);
        }
    }

    /// Generate the HTML table, padding ragged rows with empty trailing
    /// cells up to the effective column count.
    pub fn generate_html(&self) -> String {
        use std::fmt::Write;
        let effective_cols = self.spec_cols.max(self.max_cols).max(1);
        let mut output = String::new();

        let _ = writeln!(output, "<table>");
        let _ = writeln!(output, "<tbody>");
        for row in &self.rows {
            output.push_str("<tr>");
            for col in 0..effective_cols {
                let raw = row.get(col).map(String::as_str).unwrap_or("");
                output.push_str("<td>");
                output.push_str(&self.render_cell(raw));
                output.push_str("</td>");
            }
            output.push_str("</tr>\n");
        }
        let _ = writeln!(output, "</tbody>");
        output.push_str("</table>");
        output
    }

    fn render_cell(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        match self.kind {
            EnvKind::Array => format!("${}$", raw),
            EnvKind::Tabular => escape_cell_text(raw),
        }
    }
}

/// Split an environment body into rows on `\\` at depth zero. A `\\[2mm]`
/// spacing argument is consumed with the separator.
fn split_rows(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let len = bytes.len();
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut brace_depth = 0i32;
    let mut env_depth = 0i32;
    let mut i = 0usize;

    while i < len {
        if bytes[i] == b'\\' && i + 1 < len {
            if bytes[i + 1] == b'\\' && brace_depth == 0 && env_depth == 0 {
                rows.push(std::mem::take(&mut current));
                i += 2;
                // Optional spacing argument
                if i < len && bytes[i] == b'[' {
                    if let Some(close) = body[i..].find(']') {
                        i += close + 1;
                    }
                }
                continue;
            }
            if body[i..].starts_with("\\begin{") {
                env_depth += 1;
            } else if body[i..].starts_with("\\end{") {
                env_depth = (env_depth - 1).max(0);
            }
            // Copy the escape pair as a unit so `\{` and `\&` stay inert
            current.push('\\');
            let ch = body[i + 1..].chars().next().unwrap_or('\\');
            current.push(ch);
            i += 1 + ch.len_utf8();
            continue;
        }
        let ch = body[i..].chars().next().unwrap_or('\u{FFFD}');
        match ch {
            '{' => brace_depth += 1,
            '}' => brace_depth = (brace_depth - 1).max(0),
            _ => {}
        }
        current.push(ch);
        i += ch.len_utf8();
    }
    rows.push(current);
    rows
}

/// Split a row into cells on `&` at depth zero.
fn split_cells(row: &str) -> Vec<String> {
    let bytes = row.as_bytes();
    let len = bytes.len();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut brace_depth = 0i32;
    let mut env_depth = 0i32;
    let mut i = 0usize;

    while i < len {
        if bytes[i] == b'\\' && i + 1 < len {
            if row[i..].starts_with("\\begin{") {
                env_depth += 1;
            } else if row[i..].starts_with("\\end{") {
                env_depth = (env_depth - 1).max(0);
            }
            current.push('\\');
            let ch = row[i + 1..].chars().next().unwrap_or('\\');
            current.push(ch);
            i += 1 + ch.len_utf8();
            continue;
        }
        let ch = row[i..].chars().next().unwrap_or('\u{FFFD}');
        match ch {
            '{' => {
                brace_depth += 1;
                current.push(ch);
            }
            '}' => {
                brace_depth = (brace_depth - 1).max(0);
                current.push(ch);
            }
            '&' if brace_depth == 0 && env_depth == 0 => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
        i += ch.len_utf8();
    }
    cells.push(current);
    cells
}

/// Remove `\hline` and `\cline{...}` tokens from a row. Borders come from
/// the table element itself, not from rule commands.
fn strip_rules(row: &str) -> String {
    let mut out = row.replace("\\hline", "");
    while let Some(pos) = out.find("\\cline") {
        let after = pos + "\\cline".len();
        let end = match out[after..].find('}') {
            Some(p) => after + p + 1,
            None => after,
        };
        out.replace_range(pos..end, "");
    }
    out
}

/// Number of columns declared by a `{|c|c|}` style column spec.
pub fn count_spec_columns(spec: &str) -> usize {
    spec.chars()
        .filter(|c| matches!(c, 'l' | 'c' | 'r' | 'p' | 'm' | 'b'))
        .count()
}

fn escape_cell_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
