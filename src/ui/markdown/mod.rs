mod code;
mod render;

pub use render::MarkdownRenderer;
