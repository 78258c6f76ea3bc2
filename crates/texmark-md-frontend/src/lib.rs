//! Markdown to IR frontend.
//!
//! Parses normalized content (Markdown with `$`/`$$` math spans) into the
//! semantic IR, grouping blocks under their headings into classified
//! sections. The IR is rebuilt on every render; nothing here is persisted.

use pulldown_cmark::{
    Alignment as MdAlignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd,
};
use texmark_ir::{
    inlines_to_plain_text, Alignment, Block, Document, Inline, ListKind, Section, Table, TableCell,
};

/// Parse normalized Markdown into a section-grouped document.
pub fn markdown_to_ir(text: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut builder = IrBuilder::new();
    for event in parser {
        builder.handle(event);
    }
    let tops = builder.finish();
    Document::new(group_sections(tops))
}

/// A top-level node before section grouping.
enum TopBlock {
    Heading { level: u8, content: Vec<Inline> },
    Block(Block),
}

/// Group top-level blocks into sections: a heading collects everything
/// until the next heading of equal or higher level; deeper headings stay
/// inside the section as blocks.
fn group_sections(tops: Vec<TopBlock>) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut preamble: Vec<Block> = Vec::new();
    let mut current: Option<(u8, String, Vec<Block>)> = None;

    for top in tops {
        match top {
            TopBlock::Heading { level, content } => {
                let heading_text = inlines_to_plain_text(&content);
                match current.take() {
                    Some((cur_level, cur_heading, cur_blocks)) => {
                        if level <= cur_level {
                            sections.push(Section::titled(cur_heading, cur_level, cur_blocks));
                            current = Some((level, heading_text, Vec::new()));
                        } else {
                            let mut blocks = cur_blocks;
                            blocks.push(Block::Heading { level, content });
                            current = Some((cur_level, cur_heading, blocks));
                        }
                    }
                    None => {
                        current = Some((level, heading_text, Vec::new()));
                    }
                }
            }
            TopBlock::Block(block) => match current.as_mut() {
                Some((_, _, blocks)) => blocks.push(block),
                None => preamble.push(block),
            },
        }
    }

    let mut out = Vec::new();
    if !preamble.is_empty() {
        out.push(Section::preamble(preamble));
    }
    out.extend(sections);
    if let Some((level, heading, blocks)) = current {
        out.push(Section::titled(heading, level, blocks));
    }
    out
}

enum Frame {
    Paragraph(Vec<Inline>),
    /// Paragraph opened implicitly for loose text in tight list items
    ImplicitParagraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link {
        url: String,
        content: Vec<Inline>,
    },
    Image {
        url: String,
        alt: String,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Item(Vec<Block>),
    Quote(Vec<Block>),
    Table {
        align: Vec<Alignment>,
        header: Vec<TableCell>,
        rows: Vec<Vec<TableCell>>,
        row: Vec<TableCell>,
        in_head: bool,
    },
    Cell(Vec<Inline>),
}

struct IrBuilder {
    tops: Vec<TopBlock>,
    stack: Vec<Frame>,
}

impl IrBuilder {
    fn new() -> Self {
        Self {
            tops: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<TopBlock> {
        // Unterminated frames degrade to their best block form
        while let Some(frame) = self.stack.pop() {
            if let Some(block) = frame_to_block(frame) {
                self.push_block_into_stack(block);
            }
        }
        self.tops
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(end) => self.end(end),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::InlineMath(math) => self.push_inline(Inline::Math(math.into_string())),
            Event::DisplayMath(math) => self.display_math(math.into_string()),
            Event::Html(html) => {
                self.close_implicit_paragraph();
                self.push_block(Block::Html(html.into_string()));
            }
            Event::InlineHtml(html) => self.push_inline(Inline::Html(html.into_string())),
            Event::SoftBreak => self.push_inline(Inline::Text(" ".to_string())),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => {
                self.close_implicit_paragraph();
                self.push_block(Block::Rule);
            }
            // Task markers and footnotes are outside the supported grammar
            Event::TaskListMarker(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Paragraph(Vec::new()));
            }
            Tag::Heading { level, .. } => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Heading {
                    level: level as u8,
                    content: Vec::new(),
                });
            }
            Tag::Emphasis => self.stack.push(Frame::Emphasis(Vec::new())),
            Tag::Strong => self.stack.push(Frame::Strong(Vec::new())),
            Tag::Strikethrough => self.stack.push(Frame::Emphasis(Vec::new())),
            Tag::Link { dest_url, .. } => self.stack.push(Frame::Link {
                url: dest_url.into_string(),
                content: Vec::new(),
            }),
            Tag::Image { dest_url, .. } => self.stack.push(Frame::Image {
                url: dest_url.into_string(),
                alt: String::new(),
            }),
            Tag::CodeBlock(kind) => {
                self.close_implicit_paragraph();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let info = info.into_string();
                        let lang = info.split_whitespace().next().unwrap_or("").to_string();
                        if lang.is_empty() {
                            None
                        } else {
                            Some(lang)
                        }
                    }
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::CodeBlock {
                    language,
                    code: String::new(),
                });
            }
            Tag::List(start) => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::List {
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => self.stack.push(Frame::Item(Vec::new())),
            Tag::BlockQuote(_) => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Quote(Vec::new()));
            }
            Tag::Table(alignments) => {
                self.close_implicit_paragraph();
                let align = alignments.iter().map(|a| convert_alignment(*a)).collect();
                self.stack.push(Frame::Table {
                    align,
                    header: Vec::new(),
                    rows: Vec::new(),
                    row: Vec::new(),
                    in_head: false,
                });
            }
            Tag::TableHead => {
                if let Some(Frame::Table { in_head, .. }) = self.stack.last_mut() {
                    *in_head = true;
                }
            }
            Tag::TableRow => {}
            Tag::TableCell => self.stack.push(Frame::Cell(Vec::new())),
            // Footnote definitions and metadata are outside the grammar
            _ => {}
        }
    }

    fn end(&mut self, end: TagEnd) {
        match end {
            TagEnd::Paragraph => match self.stack.pop() {
                Some(Frame::Paragraph(inlines)) | Some(Frame::ImplicitParagraph(inlines)) => {
                    if !inlines.is_empty() {
                        self.push_block(Block::Paragraph(inlines));
                    }
                }
                Some(other) => self.stack.push(other),
                None => {}
            },
            TagEnd::Heading(_) => {
                if let Some(Frame::Heading { level, content }) = self.stack.pop() {
                    if self.stack.is_empty() {
                        self.tops.push(TopBlock::Heading { level, content });
                    } else {
                        self.push_block(Block::Heading { level, content });
                    }
                }
            }
            TagEnd::Emphasis | TagEnd::Strikethrough => {
                if let Some(Frame::Emphasis(inner)) = self.stack.pop() {
                    self.push_inline(Inline::Emphasis(inner));
                }
            }
            TagEnd::Strong => {
                if let Some(Frame::Strong(inner)) = self.stack.pop() {
                    self.push_inline(Inline::Strong(inner));
                }
            }
            TagEnd::Link => {
                if let Some(Frame::Link { url, content }) = self.stack.pop() {
                    self.push_inline(Inline::Link { url, content });
                }
            }
            TagEnd::Image => {
                if let Some(Frame::Image { url, alt }) = self.stack.pop() {
                    self.push_inline(Inline::Image { url, alt });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(Frame::CodeBlock { language, code }) = self.stack.pop() {
                    self.push_block(Block::CodeBlock { language, code });
                }
            }
            TagEnd::List(_) => {
                if let Some(Frame::List { start, items }) = self.stack.pop() {
                    let kind = match start {
                        Some(start) => ListKind::Ordered { start },
                        None => ListKind::Bullet,
                    };
                    self.push_block(Block::List { kind, items });
                }
            }
            TagEnd::Item => {
                self.close_implicit_paragraph();
                if let Some(Frame::Item(blocks)) = self.stack.pop() {
                    if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                        items.push(blocks);
                    }
                }
            }
            TagEnd::BlockQuote(_) => {
                if let Some(Frame::Quote(blocks)) = self.stack.pop() {
                    self.push_block(Block::Quote(blocks));
                }
            }
            TagEnd::Table => {
                if let Some(Frame::Table {
                    align,
                    header,
                    rows,
                    ..
                }) = self.stack.pop()
                {
                    self.push_block(Block::Table(Table {
                        header,
                        rows,
                        align,
                    }));
                }
            }
            TagEnd::TableHead => {
                if let Some(Frame::Table { in_head, .. }) = self.stack.last_mut() {
                    *in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(Frame::Table { rows, row, .. }) = self.stack.last_mut() {
                    rows.push(std::mem::take(row));
                }
            }
            TagEnd::TableCell => {
                if let Some(Frame::Cell(inlines)) = self.stack.pop() {
                    if let Some(Frame::Table {
                        header,
                        row,
                        in_head,
                        ..
                    }) = self.stack.last_mut()
                    {
                        if *in_head {
                            header.push(TableCell::new(inlines));
                        } else {
                            row.push(TableCell::new(inlines));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::CodeBlock { code, .. }) => code.push_str(text),
            Some(Frame::Image { alt, .. }) => alt.push_str(text),
            _ => self.push_inline(Inline::Text(text.to_string())),
        }
    }

    /// Display math splits the enclosing paragraph: text before it becomes
    /// its own paragraph, the math becomes a block, and the paragraph frame
    /// reopens for what follows.
    fn display_math(&mut self, math: String) {
        let in_paragraph = matches!(
            self.stack.last(),
            Some(Frame::Paragraph(_)) | Some(Frame::ImplicitParagraph(_))
        );
        if in_paragraph {
            let (taken, implicit) = match self.stack.pop() {
                Some(Frame::Paragraph(inlines)) => (inlines, false),
                Some(Frame::ImplicitParagraph(inlines)) => (inlines, true),
                _ => (Vec::new(), false),
            };
            if !taken.is_empty() {
                self.push_block(Block::Paragraph(taken));
            }
            self.push_block(Block::MathBlock(math));
            self.stack.push(if implicit {
                Frame::ImplicitParagraph(Vec::new())
            } else {
                Frame::Paragraph(Vec::new())
            });
            return;
        }
        if matches!(
            self.stack.last(),
            Some(Frame::Cell(_)) | Some(Frame::Heading { .. })
        ) {
            // No block context inside cells/headings; degrade to inline
            self.push_inline(Inline::Math(math));
        } else {
            self.push_block(Block::MathBlock(math));
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        match self.stack.last_mut() {
            Some(Frame::Paragraph(inlines))
            | Some(Frame::ImplicitParagraph(inlines))
            | Some(Frame::Emphasis(inlines))
            | Some(Frame::Strong(inlines))
            | Some(Frame::Cell(inlines)) => inlines.push(inline),
            Some(Frame::Heading { content, .. }) => content.push(inline),
            Some(Frame::Link { content, .. }) => content.push(inline),
            Some(Frame::Image { alt, .. }) => alt.push_str(&inline.plain_text()),
            _ => {
                self.stack.push(Frame::ImplicitParagraph(vec![inline]));
            }
        }
    }

    fn push_block(&mut self, block: Block) {
        self.push_block_into_stack(block);
    }

    fn push_block_into_stack(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Frame::Item(blocks)) | Some(Frame::Quote(blocks)) => blocks.push(block),
            Some(Frame::List { items, .. }) => {
                // A block arriving between items attaches to the last item
                match items.last_mut() {
                    Some(last) => last.push(block),
                    None => items.push(vec![block]),
                }
            }
            Some(_) => {
                // A block inside an inline context has nowhere better to go;
                // hoist it to the top level rather than dropping content.
                self.tops.push(TopBlock::Block(block));
            }
            None => self.tops.push(TopBlock::Block(block)),
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if let Some(Frame::ImplicitParagraph(_)) = self.stack.last() {
            if let Some(Frame::ImplicitParagraph(inlines)) = self.stack.pop() {
                if !inlines.is_empty() {
                    self.push_block(Block::Paragraph(inlines));
                }
            }
        }
    }
}

fn frame_to_block(frame: Frame) -> Option<Block> {
    match frame {
        Frame::Paragraph(inlines) | Frame::ImplicitParagraph(inlines) => {
            if inlines.is_empty() {
                None
            } else {
                Some(Block::Paragraph(inlines))
            }
        }
        Frame::Heading { level, content } => Some(Block::Heading { level, content }),
        Frame::CodeBlock { language, code } => Some(Block::CodeBlock { language, code }),
        Frame::List { start, items } => Some(Block::List {
            kind: match start {
                Some(start) => ListKind::Ordered { start },
                None => ListKind::Bullet,
            },
            items,
        }),
        Frame::Item(blocks) | Frame::Quote(blocks) => Some(Block::Quote(blocks)),
        Frame::Table {
            align,
            header,
            rows,
            ..
        } => Some(Block::Table(Table {
            header,
            rows,
            align,
        })),
        Frame::Emphasis(inner) | Frame::Strong(inner) => {
            if inner.is_empty() {
                None
            } else {
                Some(Block::Paragraph(inner))
            }
        }
        Frame::Link { content, .. } => {
            if content.is_empty() {
                None
            } else {
                Some(Block::Paragraph(content))
            }
        }
        Frame::Image { url, alt } => Some(Block::Paragraph(vec![Inline::Image { url, alt }])),
        Frame::Cell(inlines) => {
            if inlines.is_empty() {
                None
            } else {
                Some(Block::Paragraph(inlines))
            }
        }
    }
}

fn convert_alignment(alignment: MdAlignment) -> Alignment {
    match alignment {
        MdAlignment::None => Alignment::Auto,
        MdAlignment::Left => Alignment::Left,
        MdAlignment::Center => Alignment::Center,
        MdAlignment::Right => Alignment::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texmark_ir::SectionType;

    #[test]
    fn test_sections_classified_by_heading() {
        let doc = markdown_to_ir(
            "## Définition\n\nUne suite est une fonction de $\\mathbb{N}$.\n\n\
             ## Exemple\n\nLa suite $u_n = n^2$.",
        );
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].kind, SectionType::Definition);
        assert_eq!(doc.sections[1].kind, SectionType::Example);
    }

    #[test]
    fn test_preamble_before_first_heading() {
        let doc = markdown_to_ir("Texte libre.\n\n## Exercice\n\nCalculer.");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].heading.is_none());
        assert_eq!(doc.sections[0].kind, SectionType::Default);
        assert_eq!(doc.sections[1].kind, SectionType::Exercise);
    }

    #[test]
    fn test_deeper_heading_stays_in_section() {
        let doc = markdown_to_ir("## Théorème\n\nEnoncé.\n\n### Démonstration\n\nPreuve.");
        assert_eq!(doc.sections.len(), 1);
        let section = &doc.sections[0];
        assert_eq!(section.kind, SectionType::Theorem);
        assert!(section
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Heading { level: 3, .. })));
    }

    #[test]
    fn test_equal_level_heading_starts_new_section() {
        let doc = markdown_to_ir("## Définition\n\nA.\n\n## Théorème\n\nB.");
        assert_eq!(doc.sections.len(), 2);
    }

    #[test]
    fn test_inline_and_display_math() {
        let doc = markdown_to_ir("Soit $x$ tel que\n\n$$x^2 = 2$$");
        let blocks: Vec<&Block> = doc.sections.iter().flat_map(|s| &s.blocks).collect();
        assert!(blocks.iter().any(|b| matches!(
            b,
            Block::Paragraph(inlines) if inlines.iter().any(|i| matches!(i, Inline::Math(m) if m == "x"))
        )));
        assert!(blocks
            .iter()
            .any(|b| matches!(b, Block::MathBlock(m) if m.trim() == "x^2 = 2")));
    }

    #[test]
    fn test_display_math_splits_paragraph() {
        let doc = markdown_to_ir("avant $$ y = x $$ apres");
        let section = &doc.sections[0];
        assert!(section
            .blocks
            .iter()
            .any(|b| matches!(b, Block::MathBlock(_))));
        assert!(section.blocks.len() >= 2);
    }

    #[test]
    fn test_markdown_table_header_and_rows() {
        let doc = markdown_to_ir("| $x$ | $f(x)$ |\n|---|---|\n| 0 | 1 |\n| 1 | 2 |");
        let section = &doc.sections[0];
        let table = section
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .expect("table parsed");
        assert_eq!(table.header.len(), 2);
        assert_eq!(table.rows.len(), 2);
        assert!(matches!(table.header[0].content[0], Inline::Math(_)));
    }

    #[test]
    fn test_lists() {
        let doc = markdown_to_ir("- un\n- deux\n\n1. premier\n2. second");
        let section = &doc.sections[0];
        let lists: Vec<&Block> = section
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::List { .. }))
            .collect();
        assert_eq!(lists.len(), 2);
        assert!(matches!(
            lists[0],
            Block::List {
                kind: ListKind::Bullet,
                items
            } if items.len() == 2
        ));
        assert!(matches!(
            lists[1],
            Block::List {
                kind: ListKind::Ordered { start: 1 },
                items
            } if items.len() == 2
        ));
    }

    #[test]
    fn test_html_block_preserved() {
        let doc = markdown_to_ir("avant\n\n<table><tbody><tr><td>$x$</td></tr></tbody></table>\n\napres");
        let section = &doc.sections[0];
        assert!(section
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Html(h) if h.contains("<table>"))));
    }

    #[test]
    fn test_image_alt_collected() {
        let doc = markdown_to_ir("![figure une](img/fig.png)");
        let section = &doc.sections[0];
        assert!(section.blocks.iter().any(|b| matches!(
            b,
            Block::Paragraph(inlines) if inlines.iter().any(|i| matches!(
                i,
                Inline::Image { url, alt } if url == "img/fig.png" && alt == "figure une"
            ))
        )));
    }

    #[test]
    fn test_empty_input() {
        let doc = markdown_to_ir("");
        assert!(doc.sections.is_empty());
    }
}
