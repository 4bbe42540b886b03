use url::Url;

use crate::core::config::Config;
use crate::core::markup::{NoopHighlighter, RenderPipeline};
use crate::ui::markdown::MarkdownRenderer;
use crate::ui::theme::Theme;
use crate::utils::syntax::SyntectHighlighter;

/// Resolved settings for one interactive session.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub endpoint: Url,
    pub markdown: bool,
    pub syntax: bool,
    pub theme: Theme,
}

impl ChatOptions {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            endpoint: config.endpoint()?,
            markdown: config.markdown_enabled(),
            syntax: config.syntax_enabled(),
            theme: config
                .theme
                .as_deref()
                .map(Theme::from_name)
                .unwrap_or_else(Theme::dark_default),
        })
    }

    /// Markdown off shows assistant text verbatim; syntax off keeps code
    /// blocks in the renderer's plain code style.
    pub fn pipeline(&self) -> RenderPipeline {
        if !self.markdown {
            return RenderPipeline::plain();
        }
        let renderer = Box::new(MarkdownRenderer::new(self.theme.clone()));
        if self.syntax {
            RenderPipeline::new(renderer, Box::new(SyntectHighlighter::new(self.theme.clone())))
        } else {
            RenderPipeline::new(renderer, Box::new(NoopHighlighter))
        }
    }
}
