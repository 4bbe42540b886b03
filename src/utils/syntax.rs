use crate::core::markup::{CodeBlock, Highlighter};
use crate::ui::theme::Theme;
use ratatui::style::{Color as TuiColor, Style};
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tracing::debug;

const CACHE_CAPACITY: usize = 64;

// Simple FIFO cache (bounded) for highlighted blocks
// key = (lang_norm, hash)

fn hash_code(lang: &str, code: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<(String, u64), Vec<Line<'static>>>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }
    fn get(&self, k: &(String, u64)) -> Option<Vec<Line<'static>>> {
        self.map.get(k).cloned()
    }
    fn put(&mut self, k: (String, u64), v: Vec<Line<'static>>) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k.clone());
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
    #[cfg(test)]
    fn len(&self) -> usize {
        self.map.len()
    }
}

fn is_dark_background(c: &TuiColor) -> bool {
    match c {
        TuiColor::Rgb(r, g, b) => {
            let br = 0.2126 * (*r as f32) + 0.7152 * (*g as f32) + 0.0722 * (*b as f32);
            br < 128.0
        }
        TuiColor::Black => true,
        TuiColor::White => false,
        TuiColor::Gray | TuiColor::DarkGray => true,
        _ => true,
    }
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

/// Choose a syntect theme name based on background brightness.
pub(crate) fn pick_syntect_theme_name_for_theme(theme: &Theme) -> &'static str {
    if is_dark_background(&theme.background_color) {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Syntect-backed [`Highlighter`] with a bounded per-instance cache.
///
/// A block whose language is unknown is highlighted as plain text; a block
/// syntect fails on keeps the lines the renderer produced.
pub struct SyntectHighlighter {
    theme: Theme,
    syntect_theme: &'static str,
    cache: Mutex<SimpleCache>,
}

impl SyntectHighlighter {
    pub fn new(theme: Theme) -> Self {
        let syntect_theme = pick_syntect_theme_name_for_theme(&theme);
        Self {
            theme,
            syntect_theme,
            cache: Mutex::new(SimpleCache::new(CACHE_CAPACITY)),
        }
    }

    fn highlight_source(&self, lang_norm: &str, code: &str) -> Option<Vec<Line<'static>>> {
        let ps = syntax_set();
        let ts = theme_set();
        let fallback_names = ["base16-ocean.light", "Solarized (light)", "base16-ocean.dark"];
        let syn_theme = ts.themes.get(self.syntect_theme).or_else(|| {
            fallback_names
                .iter()
                .find_map(|name| ts.themes.get(*name))
        })?;

        let syntax = ps
            .find_syntax_by_token(lang_norm)
            .unwrap_or_else(|| ps.find_syntax_plain_text());

        let mut h = HighlightLines::new(syntax, syn_theme);
        let bg = self.theme.md_codeblock_bg_color();

        let mut out: Vec<Line<'static>> = Vec::new();
        for line in syntect::util::LinesWithEndings::from(code) {
            let ranges = h.highlight_line(line, ps).ok()?;
            let mut spans: Vec<Span<'static>> = Vec::new();
            for (style, text) in ranges {
                // strip trailing newline from the fragment before rendering in a Line
                let frag = text.strip_suffix('\n').unwrap_or(text);
                let fg = style.foreground;
                let mut st = Style::default().fg(TuiColor::Rgb(fg.r, fg.g, fg.b));
                if let Some(bgcol) = bg {
                    st = st.bg(bgcol);
                }
                spans.push(Span::styled(frag.to_string(), st));
            }
            out.push(Line::from(spans));
        }
        Some(out)
    }

    #[cfg(test)]
    fn cached_blocks(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, block: &mut CodeBlock) {
        let lang_norm = normalize_lang_hint(block.language.as_deref().unwrap_or(""));
        let key = (lang_norm.clone(), hash_code(&lang_norm, &block.source));

        let cached = match self.cache.lock() {
            Ok(cache) => cache.get(&key),
            Err(_) => None,
        };
        let lines = match cached {
            Some(lines) => Some(lines),
            None => {
                let produced = self.highlight_source(&lang_norm, &block.source);
                if let (Some(lines), Ok(mut cache)) = (produced.as_ref(), self.cache.lock()) {
                    cache.put(key, lines.clone());
                }
                produced
            }
        };

        match lines {
            Some(lines) => block.lines = lines,
            None => debug!(language = %lang_norm, "Highlighting failed; keeping plain lines"),
        }
        block.highlighted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn block(lang: Option<&str>, source: &str) -> CodeBlock {
        CodeBlock::new(lang.map(str::to_string), source.to_string(), Vec::new())
    }

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("JS"), "javascript");
        assert_eq!(normalize_lang_hint("TsX"), "typescript");
        assert_eq!(normalize_lang_hint("yml"), "yaml");
        assert_eq!(normalize_lang_hint("hpp"), "cpp");
        assert_eq!(normalize_lang_hint("rs"), "rust");
    }

    #[test]
    fn dark_background_heuristic_basic() {
        assert!(is_dark_background(&Color::Black));
        assert!(!is_dark_background(&Color::White));
        assert!(is_dark_background(&Color::Rgb(10, 10, 10)));
        assert!(!is_dark_background(&Color::Rgb(240, 240, 240)));
    }

    #[test]
    fn theme_selection_matches_brightness() {
        assert_eq!(
            pick_syntect_theme_name_for_theme(&Theme::dark_default()),
            "base16-ocean.dark"
        );
        assert_eq!(
            pick_syntect_theme_name_for_theme(&Theme::light()),
            "InspiredGitHub"
        );
    }

    #[test]
    fn highlight_replaces_lines_one_per_source_line() {
        let highlighter = SyntectHighlighter::new(Theme::dark_default());
        let mut code = block(Some("rs"), "fn main() {\n    println!(\"hi\");\n}");
        highlighter.highlight(&mut code);

        assert!(code.highlighted);
        assert_eq!(code.lines.len(), 3);
        let text: Vec<String> = code.lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text, ["fn main() {", "    println!(\"hi\");", "}"]);
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let highlighter = SyntectHighlighter::new(Theme::light());
        let mut code = block(Some("no-such-lang"), "just text");
        highlighter.highlight(&mut code);
        assert_eq!(code.lines.len(), 1);
        assert_eq!(code.lines[0].to_string(), "just text");
    }

    #[test]
    fn repeated_blocks_hit_the_cache() {
        let highlighter = SyntectHighlighter::new(Theme::dark_default());
        for _ in 0..3 {
            let mut code = block(Some("python"), "print(1)");
            highlighter.highlight(&mut code);
        }
        assert_eq!(highlighter.cached_blocks(), 1);
    }

    #[test]
    fn cache_is_bounded() {
        let mut cache = SimpleCache::new(2);
        for i in 0..5u64 {
            cache.put(("x".into(), i), Vec::new());
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&("x".into(), 4)).is_some());
        assert!(cache.get(&("x".into(), 0)).is_none());
    }
}
