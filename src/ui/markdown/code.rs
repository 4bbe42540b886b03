use crate::core::markup::CodeBlock;
use crate::ui::theme::Theme;
use pulldown_cmark::CodeBlockKind;
use ratatui::text::{Line, Span};

pub(super) fn language_hint_from_codeblock_kind(kind: CodeBlockKind) -> Option<String> {
    match kind {
        CodeBlockKind::Indented => None,
        CodeBlockKind::Fenced(info) => info
            .split_ascii_whitespace()
            .next()
            .filter(|lang| !lang.is_empty())
            .map(str::to_string),
    }
}

pub(super) fn push_codeblock_text(code_block_lines: &mut Vec<String>, text: &str) {
    for l in text.lines() {
        code_block_lines.push(detab(l));
    }
}

/// Unhighlighted lines for a code block; a highlighter may replace them.
fn plain_codeblock_lines(
    code_block_lines: &[String],
    theme: &Theme,
) -> Vec<Line<'static>> {
    let style = theme.md_codeblock_style();
    code_block_lines
        .iter()
        .map(|line| Line::from(vec![Span::styled(line.clone(), style)]))
        .collect()
}

pub(super) fn take_code_block(
    code_block_lines: &mut Vec<String>,
    language: Option<String>,
    theme: &Theme,
) -> CodeBlock {
    let lines = plain_codeblock_lines(code_block_lines, theme);
    let source = code_block_lines.join("\n");
    code_block_lines.clear();
    CodeBlock::new(language, source, lines)
}

pub(super) fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}
