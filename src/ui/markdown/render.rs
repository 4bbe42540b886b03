use super::code::{detab, language_hint_from_codeblock_kind, push_codeblock_text, take_code_block};
use crate::core::markup::{MarkupBlock, RenderedMarkup, RichTextRenderer};
use crate::ui::theme::Theme;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const RULE_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

/// Markdown renderer for assistant content, built on pulldown-cmark.
///
/// Fenced and indented code blocks come out as separate
/// [`MarkupBlock::Code`] entries carrying their source, so a highlighter can
/// restyle them without re-parsing the document.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    theme: Theme,
}

impl MarkdownRenderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl RichTextRenderer for MarkdownRenderer {
    fn render(&self, text: &str) -> RenderedMarkup {
        RenderState::new(&self.theme).render(text)
    }
}

struct RenderState<'a> {
    theme: &'a Theme,
    blocks: Vec<MarkupBlock>,
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    /// Marker widths of the enclosing list items.
    list_indent_stack: Vec<usize>,
    pending_list_indent: Option<usize>,
    link_stack: Vec<String>,
    in_code_block: Option<Option<String>>,
    code_block_lines: Vec<String>,
}

impl<'a> RenderState<'a> {
    fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            blocks: Vec::new(),
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![theme.assistant_text_style],
            list_stack: Vec::new(),
            list_indent_stack: Vec::new(),
            pending_list_indent: None,
            link_stack: Vec::new(),
            in_code_block: None,
            code_block_lines: Vec::new(),
        }
    }

    fn render(mut self, content: &str) -> RenderedMarkup {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        let parser = Parser::new_ext(content, options);

        for event in parser {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => {
                    if self.in_code_block.is_some() {
                        push_codeblock_text(&mut self.code_block_lines, &text);
                    } else {
                        let span = Span::styled(detab(&text), self.current_style());
                        self.push_span(span);
                    }
                }
                Event::Code(code) => {
                    let span = Span::styled(detab(&code), self.theme.md_inline_code);
                    self.push_span(span);
                }
                Event::SoftBreak | Event::HardBreak => {
                    self.flush_current_spans();
                    if !self.list_stack.is_empty() {
                        self.pending_list_indent = Some(self.current_list_indent_width());
                    }
                }
                Event::Rule => {
                    self.flush_current_spans();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(RULE_WIDTH),
                        self.theme.md_rule,
                    )));
                    self.push_empty_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_span(Span::styled(marker, self.theme.md_list_marker));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    // Raw HTML is shown as typed.
                    let span = Span::styled(html.trim_end().to_string(), self.current_style());
                    self.push_span(span);
                    if html.ends_with('\n') {
                        self.flush_current_spans();
                    }
                }
                _ => {}
            }
        }

        // An unterminated fence still yields its code block.
        if let Some(language) = self.in_code_block.take() {
            self.finalize_code_block(language);
        }
        self.flush_current_spans();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.flush_text_block();

        RenderedMarkup {
            blocks: self.blocks,
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.pending_list_indent.is_none() && !self.list_stack.is_empty() {
                    self.pending_list_indent = Some(self.current_list_indent_width());
                }
            }
            Tag::Heading { level, .. } => {
                self.flush_current_spans();
                let style = self.theme.md_heading_style(level as u8);
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush_current_spans();
                self.style_stack.push(self.theme.md_blockquote);
            }
            Tag::List(start) => {
                self.flush_current_spans();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
                self.list_indent_stack.push(0);
                self.pending_list_indent = None;
            }
            Tag::Item => {
                self.flush_current_spans();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(next)) => {
                        let current = *next;
                        *next += 1;
                        format!("{current}. ")
                    }
                    _ => "- ".to_string(),
                };
                let parent_indent: usize = self
                    .list_indent_stack
                    .iter()
                    .take(self.list_indent_stack.len().saturating_sub(1))
                    .sum();
                if let Some(indent) = self.list_indent_stack.last_mut() {
                    *indent = marker.width();
                }
                self.pending_list_indent = Some(parent_indent);
                self.push_span(Span::styled(marker, self.theme.md_list_marker));
            }
            Tag::CodeBlock(kind) => {
                self.flush_current_spans();
                self.in_code_block = Some(language_hint_from_codeblock_kind(kind));
                self.code_block_lines.clear();
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.style_stack.push(self.theme.md_link);
                self.link_stack.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_current_spans();
                if self.list_stack.is_empty() {
                    self.push_empty_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_current_spans();
                self.push_empty_line();
                self.style_stack.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_current_spans();
                self.style_stack.pop();
            }
            TagEnd::List(_) => {
                self.flush_current_spans();
                if self.list_stack.len() == 1 {
                    self.push_empty_line();
                }
                self.list_stack.pop();
                self.list_indent_stack.pop();
                self.pending_list_indent = None;
            }
            TagEnd::Item => {
                self.flush_current_spans();
                self.pending_list_indent = None;
            }
            TagEnd::CodeBlock => {
                if let Some(language) = self.in_code_block.take() {
                    self.finalize_code_block(language);
                }
                self.push_empty_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.style_stack.pop();
                if let Some(dest) = self.link_stack.pop() {
                    let shown = self
                        .current_spans
                        .last()
                        .is_some_and(|span| span.content.as_ref() == dest);
                    if !shown && !dest.is_empty() {
                        let style = self.current_style().add_modifier(Modifier::DIM);
                        self.push_span(Span::styled(format!(" <{dest}>"), style));
                    }
                }
            }
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or(self.theme.assistant_text_style)
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn current_list_indent_width(&self) -> usize {
        self.list_indent_stack.iter().sum()
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current_spans.is_empty() {
            if let Some(indent) = self.pending_list_indent.take() {
                if indent > 0 {
                    self.current_spans.push(Span::raw(" ".repeat(indent)));
                }
            }
        }
        self.current_spans.push(span);
    }

    fn flush_current_spans(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        self.lines.push(Line::from(spans));
    }

    fn push_empty_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() == 0) {
            return;
        }
        self.lines.push(Line::default());
    }

    fn flush_text_block(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.lines);
        self.blocks.push(MarkupBlock::Text(lines));
    }

    fn finalize_code_block(&mut self, language: Option<String>) {
        self.flush_current_spans();
        self.flush_text_block();
        let block = take_code_block(&mut self.code_block_lines, language, self.theme);
        self.blocks.push(MarkupBlock::Code(block));
    }
}
