//! IR-based Markdown → HTML render pipeline.

use texmark_html_backend::{render_document, HtmlRenderOptions};
use texmark_ir::Document;
use texmark_md_frontend::markdown_to_ir;

/// Render normalized content as sectioned HTML.
pub fn render_html(normalized: &str, options: &HtmlRenderOptions) -> String {
    let doc: Document = markdown_to_ir(normalized);
    render_document(&doc, options)
}

/// Render with default options (server-side typesetting, icons on).
pub fn render_html_default(normalized: &str) -> String {
    render_html(normalized, &HtmlRenderOptions::default())
}
