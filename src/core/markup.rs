//! Seams for the external rich-text capabilities.
//!
//! A [`RichTextRenderer`] turns raw markup into [`RenderedMarkup`], and a
//! [`Highlighter`] rewrites one [`CodeBlock`] in place. [`RenderPipeline`]
//! glues the two together so every caller highlights the same way.

use ratatui::text::Line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub source: String,
    pub lines: Vec<Line<'static>>,
    pub highlighted: bool,
}

impl CodeBlock {
    pub fn new(language: Option<String>, source: String, lines: Vec<Line<'static>>) -> Self {
        Self {
            language,
            source,
            lines,
            highlighted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupBlock {
    Text(Vec<Line<'static>>),
    Code(CodeBlock),
}

/// Formatted output of one renderer pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkup {
    pub blocks: Vec<MarkupBlock>,
}

impl RenderedMarkup {
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.blocks.iter().filter_map(|block| match block {
            MarkupBlock::Code(code) => Some(code),
            MarkupBlock::Text(_) => None,
        })
    }

    pub fn code_blocks_mut(&mut self) -> impl Iterator<Item = &mut CodeBlock> {
        self.blocks.iter_mut().filter_map(|block| match block {
            MarkupBlock::Code(code) => Some(code),
            MarkupBlock::Text(_) => None,
        })
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                MarkupBlock::Text(lines) => out.extend(lines.iter().cloned()),
                MarkupBlock::Code(code) => out.extend(code.lines.iter().cloned()),
            }
        }
        out
    }

    /// Plain text of every rendered line, joined with newlines.
    pub fn plain_text(&self) -> String {
        self.lines()
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub trait RichTextRenderer: Send {
    fn render(&self, text: &str) -> RenderedMarkup;
}

pub trait Highlighter: Send {
    fn highlight(&self, block: &mut CodeBlock);
}

/// Renderer used when markdown is disabled: one text block, one line per
/// source line, no markup interpretation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl RichTextRenderer for PlainTextRenderer {
    fn render(&self, text: &str) -> RenderedMarkup {
        let lines = text.lines().map(|l| Line::from(l.to_string())).collect();
        RenderedMarkup {
            blocks: vec![MarkupBlock::Text(lines)],
        }
    }
}

/// Highlighter that only marks blocks as visited.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHighlighter;

impl Highlighter for NoopHighlighter {
    fn highlight(&self, block: &mut CodeBlock) {
        block.highlighted = true;
    }
}

pub struct RenderPipeline {
    renderer: Box<dyn RichTextRenderer>,
    highlighter: Box<dyn Highlighter>,
}

impl RenderPipeline {
    pub fn new(renderer: Box<dyn RichTextRenderer>, highlighter: Box<dyn Highlighter>) -> Self {
        Self {
            renderer,
            highlighter,
        }
    }

    pub fn plain() -> Self {
        Self::new(Box::new(PlainTextRenderer), Box::new(NoopHighlighter))
    }

    /// Renders `text` and passes each resulting code block to the
    /// highlighter exactly once.
    pub fn render_rich(&self, text: &str) -> RenderedMarkup {
        let mut markup = self.renderer.render(text);
        for block in markup.code_blocks_mut() {
            self.highlighter.highlight(block);
        }
        markup
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes that record how the pipeline drives its collaborators.

    use super::*;
    use std::sync::{Arc, Mutex};

    /// Treats every line that starts with "```" as a fence and records inputs.
    #[derive(Clone, Default)]
    pub struct FenceRenderer {
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl RichTextRenderer for FenceRenderer {
        fn render(&self, text: &str) -> RenderedMarkup {
            self.calls.lock().unwrap().push(text.to_string());
            let mut blocks = Vec::new();
            let mut code: Option<Vec<String>> = None;
            let mut prose = Vec::new();
            for line in text.lines() {
                if line.starts_with("```") {
                    match code.take() {
                        Some(body) => {
                            let source = body.join("\n");
                            let lines = body.into_iter().map(Line::from).collect();
                            blocks.push(MarkupBlock::Code(CodeBlock::new(None, source, lines)));
                        }
                        None => {
                            if !prose.is_empty() {
                                blocks.push(MarkupBlock::Text(std::mem::take(&mut prose)));
                            }
                            code = Some(Vec::new());
                        }
                    }
                } else if let Some(body) = code.as_mut() {
                    body.push(line.to_string());
                } else {
                    prose.push(Line::from(format!("<p>{line}</p>")));
                }
            }
            if !prose.is_empty() {
                blocks.push(MarkupBlock::Text(prose));
            }
            RenderedMarkup { blocks }
        }
    }

    /// Counts highlight calls and tags the block so tests can tell it was seen.
    #[derive(Clone, Default)]
    pub struct CountingHighlighter {
        pub calls: Arc<Mutex<usize>>,
    }

    impl Highlighter for CountingHighlighter {
        fn highlight(&self, block: &mut CodeBlock) {
            *self.calls.lock().unwrap() += 1;
            assert!(!block.highlighted, "code block highlighted twice");
            block.highlighted = true;
        }
    }

    pub fn recording_pipeline() -> (RenderPipeline, FenceRenderer, CountingHighlighter) {
        let renderer = FenceRenderer::default();
        let highlighter = CountingHighlighter::default();
        let pipeline =
            RenderPipeline::new(Box::new(renderer.clone()), Box::new(highlighter.clone()));
        (pipeline, renderer, highlighter)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::recording_pipeline;
    use super::*;

    #[test]
    fn pipeline_highlights_each_code_block_once() {
        let (pipeline, renderer, highlighter) = recording_pipeline();
        let markup = pipeline.render_rich("intro\n```\nfn a() {}\n```\nmid\n```\nb\n```\n");

        assert_eq!(markup.code_blocks().count(), 2);
        assert!(markup.code_blocks().all(|b| b.highlighted));
        assert_eq!(*highlighter.calls.lock().unwrap(), 2);
        assert_eq!(renderer.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn plain_renderer_keeps_text_verbatim() {
        let markup = RenderPipeline::plain().render_rich("**bold**\n# heading");
        assert_eq!(markup.plain_text(), "**bold**\n# heading");
        assert_eq!(markup.code_blocks().count(), 0);
    }
}
