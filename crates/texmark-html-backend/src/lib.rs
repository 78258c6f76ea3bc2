//! IR to HTML backend.
//!
//! Renders the section IR as HTML: typed sections become decorated
//! containers, tables keep their header/body split, and math spans are
//! typeset through KaTeX. A malformed math span degrades to an inline
//! error marker; it never aborts the rest of the document.

use fxhash::FxHashMap;
use texmark_ir::{Alignment, Block, Document, Inline, ListKind, Section, Table};

/// Tags the converter itself emits, plus the details/summary affordance
/// used for solution folds. Anything else is entity-escaped.
const SAFE_TAGS: &[&str] = &[
    "table", "thead", "tbody", "tr", "th", "td", "img", "details", "summary", "br", "u",
];

#[derive(Debug, Clone)]
pub struct HtmlRenderOptions {
    /// Typeset math through KaTeX. When false, math spans are emitted with
    /// their delimiters inside `span.math` elements for client-side
    /// typesetting.
    /// Default: true
    pub typeset: bool,

    /// Prefix section headings with the section-type icon
    /// Default: true
    pub icons: bool,
}

impl Default for HtmlRenderOptions {
    fn default() -> Self {
        Self {
            typeset: true,
            icons: true,
        }
    }
}

impl HtmlRenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for clients that typeset math in the browser
    pub fn client_side_math() -> Self {
        Self {
            typeset: false,
            icons: true,
        }
    }
}

/// Render a document to HTML.
pub fn render_document(doc: &Document, options: &HtmlRenderOptions) -> String {
    let mut renderer = HtmlRenderer::new(options.clone());
    renderer.render(doc)
}

struct HtmlRenderer {
    options: HtmlRenderOptions,
    /// Typeset output keyed on (display, source); identical formulas are
    /// common in exercise sheets.
    math_cache: FxHashMap<(bool, String), String>,
}

impl HtmlRenderer {
    fn new(options: HtmlRenderOptions) -> Self {
        Self {
            options,
            math_cache: FxHashMap::default(),
        }
    }

    fn render(&mut self, doc: &Document) -> String {
        let mut out = String::new();
        for section in &doc.sections {
            self.render_section(&mut out, section);
        }
        out
    }

    fn render_section(&mut self, out: &mut String, section: &Section) {
        if section.kind.is_decorated() {
            out.push_str(&format!(
                "<section class=\"content-box {}\">\n",
                section.kind.css_class()
            ));
            if let Some(ref heading) = section.heading {
                let level = section.level.clamp(1, 6);
                out.push_str(&format!("<h{} class=\"box-heading\">", level));
                if self.options.icons {
                    let icon = section.kind.icon();
                    if !icon.is_empty() {
                        out.push_str(&format!("<span class=\"box-icon\">{}</span> ", icon));
                    }
                }
                out.push_str(&escape_html(heading));
                out.push_str(&format!("</h{}>\n", level));
            }
            for block in &section.blocks {
                self.render_block(out, block);
            }
            out.push_str("</section>\n");
        } else {
            if let Some(ref heading) = section.heading {
                let level = section.level.clamp(1, 6);
                out.push_str(&format!(
                    "<h{}>{}</h{}>\n",
                    level,
                    escape_html(heading),
                    level
                ));
            }
            for block in &section.blocks {
                self.render_block(out, block);
            }
        }
    }

    fn render_block(&mut self, out: &mut String, block: &Block) {
        match block {
            Block::Paragraph(inlines) => {
                out.push_str("<p>");
                for inline in inlines {
                    self.render_inline(out, inline);
                }
                out.push_str("</p>\n");
            }
            Block::Heading { level, content } => {
                let level = (*level).clamp(1, 6);
                out.push_str(&format!("<h{}>", level));
                for inline in content {
                    self.render_inline(out, inline);
                }
                out.push_str(&format!("</h{}>\n", level));
            }
            Block::MathBlock(src) => {
                out.push_str("<div class=\"math-display\">");
                out.push_str(&self.render_math(src, true));
                out.push_str("</div>\n");
            }
            Block::Table(table) => self.render_table(out, table),
            Block::List { kind, items } => {
                let (open, close) = match kind {
                    ListKind::Bullet => ("<ul>".to_string(), "</ul>"),
                    ListKind::Ordered { start } => {
                        if *start == 1 {
                            ("<ol>".to_string(), "</ol>")
                        } else {
                            (format!("<ol start=\"{}\">", start), "</ol>")
                        }
                    }
                };
                out.push_str(&open);
                out.push('\n');
                for item in items {
                    out.push_str("<li>");
                    for block in item {
                        self.render_block(out, block);
                    }
                    out.push_str("</li>\n");
                }
                out.push_str(close);
                out.push('\n');
            }
            Block::CodeBlock { language, code } => {
                match language {
                    Some(lang) => out.push_str(&format!(
                        "<pre><code class=\"language-{}\">",
                        escape_attr(lang)
                    )),
                    None => out.push_str("<pre><code>"),
                }
                out.push_str(&escape_html(code));
                out.push_str("</code></pre>\n");
            }
            Block::Quote(blocks) => {
                out.push_str("<blockquote>\n");
                for block in blocks {
                    self.render_block(out, block);
                }
                out.push_str("</blockquote>\n");
            }
            Block::Html(html) => {
                if html_is_safe(html) {
                    out.push_str(html);
                } else {
                    out.push_str(&escape_html(html));
                }
                out.push('\n');
            }
            Block::Rule => out.push_str("<hr>\n"),
        }
    }

    fn render_table(&mut self, out: &mut String, table: &Table) {
        let columns = table.columns();
        out.push_str("<table>\n");
        if !table.header.is_empty() {
            out.push_str("<thead>\n<tr>");
            for col in 0..columns {
                out.push_str(&format!("<th{}>", self.align_attr(table, col)));
                if let Some(cell) = table.header.get(col) {
                    for inline in &cell.content {
                        self.render_inline(out, inline);
                    }
                }
                out.push_str("</th>");
            }
            out.push_str("</tr>\n</thead>\n");
        }
        out.push_str("<tbody>\n");
        for row in &table.rows {
            out.push_str("<tr>");
            for col in 0..columns {
                out.push_str(&format!("<td{}>", self.align_attr(table, col)));
                if let Some(cell) = row.get(col) {
                    for inline in &cell.content {
                        self.render_inline(out, inline);
                    }
                }
                out.push_str("</td>");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
    }

    fn align_attr(&self, table: &Table, col: usize) -> String {
        match table.align.get(col) {
            Some(Alignment::Left) => " style=\"text-align: left\"".to_string(),
            Some(Alignment::Center) => " style=\"text-align: center\"".to_string(),
            Some(Alignment::Right) => " style=\"text-align: right\"".to_string(),
            _ => String::new(),
        }
    }

    fn render_inline(&mut self, out: &mut String, inline: &Inline) {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Math(src) => {
                out.push_str("<span class=\"math-inline\">");
                out.push_str(&self.render_math(src, false));
                out.push_str("</span>");
            }
            Inline::Strong(inner) => {
                out.push_str("<strong>");
                for inline in inner {
                    self.render_inline(out, inline);
                }
                out.push_str("</strong>");
            }
            Inline::Emphasis(inner) => {
                out.push_str("<em>");
                for inline in inner {
                    self.render_inline(out, inline);
                }
                out.push_str("</em>");
            }
            Inline::Link { url, content } => {
                if url.trim_start().to_lowercase().starts_with("javascript:") {
                    for inline in content {
                        self.render_inline(out, inline);
                    }
                } else {
                    out.push_str(&format!("<a href=\"{}\">", escape_attr(url)));
                    for inline in content {
                        self.render_inline(out, inline);
                    }
                    out.push_str("</a>");
                }
            }
            Inline::Image { url, alt } => {
                out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\">",
                    escape_attr(url),
                    escape_attr(alt)
                ));
            }
            Inline::Html(html) => {
                if html_is_safe(html) {
                    out.push_str(html);
                } else {
                    out.push_str(&escape_html(html));
                }
            }
            Inline::LineBreak => out.push_str("<br>\n"),
        }
    }

    fn render_math(&mut self, src: &str, display: bool) -> String {
        if !self.options.typeset {
            return if display {
                format!(
                    "<span class=\"math display\">$${}$$</span>",
                    escape_html(src)
                )
            } else {
                format!("<span class=\"math inline\">${}$</span>", escape_html(src))
            };
        }

        let key = (display, src.to_string());
        if let Some(cached) = self.math_cache.get(&key) {
            return cached.clone();
        }

        let rendered = typeset(src, display).unwrap_or_else(|| error_marker(src));
        self.math_cache.insert(key, rendered.clone());
        rendered
    }
}

fn typeset(src: &str, display: bool) -> Option<String> {
    let opts = katex::Opts::builder().display_mode(display).build().ok()?;
    katex::render_with_opts(src, opts).ok()
}

/// Inline marker for a math span KaTeX refused; the rest of the document
/// still renders.
fn error_marker(src: &str) -> String {
    format!("<span class=\"math-error\">{}</span>", escape_html(src))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_html(text)
}

/// Tag-level safelist check for raw HTML chunks: every tag must be on the
/// safelist, and no chunk may carry an event handler or javascript: URL.
fn html_is_safe(html: &str) -> bool {
    let lowered = html.to_lowercase();
    if lowered.contains("javascript:") {
        return false;
    }
    let bytes = lowered.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let mut j = i + 1;
            if j < bytes.len() && bytes[j] == b'/' {
                j += 1;
            }
            let name_start = j;
            while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
                j += 1;
            }
            let name = &lowered[name_start..j];
            if name.is_empty() || !SAFE_TAGS.contains(&name) {
                return false;
            }
            // Reject inline event handlers inside the tag
            let tag_end = lowered[j..].find('>').map(|p| j + p).unwrap_or(bytes.len());
            let attrs = &lowered[j..tag_end];
            if attrs
                .split_whitespace()
                .any(|a| a.starts_with("on") && a.contains('='))
            {
                return false;
            }
            i = tag_end;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use texmark_ir::{Section, SectionType, TableCell};

    fn render(doc: &Document) -> String {
        render_document(doc, &HtmlRenderOptions::default())
    }

    fn paragraph(inlines: Vec<Inline>) -> Block {
        Block::Paragraph(inlines)
    }

    #[test]
    fn test_decorated_section_box() {
        let doc = Document::new(vec![Section::titled(
            "Théorème de Thalès".to_string(),
            2,
            vec![paragraph(vec![Inline::Text("Enoncé.".to_string())])],
        )]);
        let html = render(&doc);
        assert!(html.contains("content-box box-theorem"));
        assert!(html.contains("box-icon"));
        assert!(html.contains("Théorème de Thalès"));
        assert!(html.contains("<p>Enoncé.</p>"));
    }

    #[test]
    fn test_default_section_undecorated() {
        let doc = Document::new(vec![Section::titled(
            "Chapitre 1".to_string(),
            2,
            vec![paragraph(vec![Inline::Text("Texte.".to_string())])],
        )]);
        let html = render(&doc);
        assert!(!html.contains("content-box"));
        assert!(html.contains("<h2>Chapitre 1</h2>"));
    }

    #[test]
    fn test_icons_can_be_disabled() {
        let doc = Document::new(vec![Section::titled(
            "Exercice 1".to_string(),
            2,
            Vec::new(),
        )]);
        let options = HtmlRenderOptions {
            icons: false,
            ..Default::default()
        };
        let html = render_document(&doc, &options);
        assert!(!html.contains("box-icon"));
        assert!(html.contains("box-exercise"));
    }

    #[test]
    fn test_valid_math_renders() {
        let doc = Document::new(vec![Section::preamble(vec![paragraph(vec![
            Inline::Math("x^2".to_string()),
        ])])]);
        let html = render(&doc);
        assert!(html.contains("math-inline"));
        assert!(!html.contains("math-error"));
        assert!(html.contains("katex"));
    }

    #[test]
    fn test_malformed_math_degrades_to_marker() {
        let doc = Document::new(vec![Section::preamble(vec![
            paragraph(vec![Inline::Math("x^2".to_string())]),
            paragraph(vec![Inline::Math("\\frac{a".to_string())]),
            paragraph(vec![Inline::Math("y_1".to_string())]),
        ])]);
        let html = render(&doc);
        assert_eq!(html.matches("math-error").count(), 1);
        assert!(html.contains("\\frac{a"));
        // Surrounding valid spans still rendered
        assert!(html.matches("math-inline").count() >= 3);
    }

    #[test]
    fn test_client_side_math_keeps_delimiters() {
        let doc = Document::new(vec![Section::preamble(vec![
            paragraph(vec![Inline::Math("a+b".to_string())]),
            Block::MathBlock("c".to_string()),
        ])]);
        let html = render_document(&doc, &HtmlRenderOptions::client_side_math());
        assert!(html.contains("$a+b$"));
        assert!(html.contains("$$c$$"));
        assert!(!html.contains("katex"));
    }

    #[test]
    fn test_table_header_body_split() {
        let table = Table {
            header: vec![
                TableCell::new(vec![Inline::Text("x".to_string())]),
                TableCell::new(vec![Inline::Text("y".to_string())]),
            ],
            rows: vec![vec![
                TableCell::new(vec![Inline::Text("0".to_string())]),
                TableCell::new(vec![Inline::Text("1".to_string())]),
            ]],
            align: vec![Alignment::Center, Alignment::Auto],
        };
        let doc = Document::new(vec![Section::preamble(vec![Block::Table(table)])]);
        let html = render(&doc);
        assert!(html.contains("<thead>"));
        assert!(html.contains("<tbody>"));
        assert!(html.contains("text-align: center"));
        assert_eq!(html.matches("<th").count(), 2 + html.matches("<thead>").count());
    }

    #[test]
    fn test_safe_html_passthrough() {
        let doc = Document::new(vec![Section::preamble(vec![Block::Html(
            "<table><tbody><tr><td>a</td></tr></tbody></table>".to_string(),
        )])]);
        let html = render(&doc);
        assert!(html.contains("<td>a</td>"));
    }

    #[test]
    fn test_script_html_escaped() {
        let doc = Document::new(vec![Section::preamble(vec![Block::Html(
            "<script>alert(1)</script>".to_string(),
        )])]);
        let html = render(&doc);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_event_handler_rejected() {
        let doc = Document::new(vec![Section::preamble(vec![Block::Html(
            "<img src=\"x.png\" onerror=\"alert(1)\">".to_string(),
        )])]);
        let html = render(&doc);
        assert!(!html.contains("onerror=\"alert"));
    }

    #[test]
    fn test_javascript_link_neutralized() {
        let doc = Document::new(vec![Section::preamble(vec![paragraph(vec![
            Inline::Link {
                url: "javascript:alert(1)".to_string(),
                content: vec![Inline::Text("lien".to_string())],
            },
        ])])]);
        let html = render(&doc);
        assert!(!html.contains("javascript:"));
        assert!(html.contains("lien"));
    }

    #[test]
    fn test_lists_render() {
        let doc = Document::new(vec![Section::preamble(vec![Block::List {
            kind: ListKind::Ordered { start: 3 },
            items: vec![
                vec![paragraph(vec![Inline::Text("a".to_string())])],
                vec![paragraph(vec![Inline::Text("b".to_string())])],
            ],
        }])]);
        let html = render(&doc);
        assert!(html.contains("<ol start=\"3\">"));
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_heading_block_inside_section() {
        let doc = Document::new(vec![Section::titled(
            "Théorème".to_string(),
            2,
            vec![Block::Heading {
                level: 3,
                content: vec![Inline::Text("Démonstration".to_string())],
            }],
        )]);
        let html = render(&doc);
        assert!(html.contains("<h3>Démonstration</h3>"));
    }
}
