use crate::core::message::{AppMessageKind, TranscriptRole};
use ratatui::style::{Color, Modifier, Style};

/// Prefix and styles for one kind of locally generated notice.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMessageStyle {
    pub prefix: String,
    pub prefix_style: Style,
    pub text_style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub attachment_style: Style,
    pub app_info: AppMessageStyle,
    pub app_warning: AppMessageStyle,
    pub app_error: AppMessageStyle,

    // Chrome
    pub title_style: Style,
    pub streaming_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,

    // Markdown
    pub md_h1: Style,
    pub md_h2: Style,
    pub md_h3: Style,
    pub md_inline_code: Style,
    pub md_codeblock_text: Style,
    pub md_codeblock_bg: Option<Color>,
    pub md_link: Style,
    pub md_blockquote: Style,
    pub md_list_marker: Style,
    pub md_rule: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            name: "dark",
            background_color: Color::Rgb(20, 22, 28),
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            system_text_style: Style::default().fg(Color::DarkGray),
            attachment_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            app_info: AppMessageStyle {
                prefix: "· ".into(),
                prefix_style: Style::default().fg(Color::Green),
                text_style: Style::default().fg(Color::Gray),
            },
            app_warning: AppMessageStyle {
                prefix: "! ".into(),
                prefix_style: Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                text_style: Style::default().fg(Color::Yellow),
            },
            app_error: AppMessageStyle {
                prefix: "✗ ".into(),
                prefix_style: Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
                text_style: Style::default().fg(Color::LightRed),
            },

            title_style: Style::default().fg(Color::Gray),
            streaming_indicator_style: Style::default().fg(Color::White),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            md_h1: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            md_h2: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            md_h3: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code: Style::default().fg(Color::LightYellow),
            md_codeblock_text: Style::default().fg(Color::Gray),
            md_codeblock_bg: Some(Color::Rgb(34, 37, 46)),
            md_link: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            md_blockquote: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker: Style::default().fg(Color::LightCyan),
            md_rule: Style::default().fg(Color::DarkGray),
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            background_color: Color::Rgb(250, 250, 247),
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_text_style: Style::default().fg(Color::Black),
            system_text_style: Style::default().fg(Color::Gray),
            attachment_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            app_info: AppMessageStyle {
                prefix: "· ".into(),
                prefix_style: Style::default().fg(Color::Green),
                text_style: Style::default().fg(Color::DarkGray),
            },
            app_warning: AppMessageStyle {
                prefix: "! ".into(),
                prefix_style: Style::default()
                    .fg(Color::Rgb(160, 100, 0))
                    .add_modifier(Modifier::BOLD),
                text_style: Style::default().fg(Color::Rgb(160, 100, 0)),
            },
            app_error: AppMessageStyle {
                prefix: "✗ ".into(),
                prefix_style: Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
                text_style: Style::default().fg(Color::Red),
            },

            title_style: Style::default().fg(Color::DarkGray),
            streaming_indicator_style: Style::default().fg(Color::Black),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            md_h1: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            md_h2: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            md_h3: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code: Style::default().fg(Color::Rgb(150, 60, 20)),
            md_codeblock_text: Style::default().fg(Color::Black),
            md_codeblock_bg: Some(Color::Rgb(236, 236, 232)),
            md_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            md_blockquote: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker: Style::default().fg(Color::Blue),
            md_rule: Style::default().fg(Color::Gray),
        }
    }

    /// Built-in theme by name, if one exists.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" | "default" | "default-dark" => Some(Self::dark_default()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::by_name(name).unwrap_or_else(Self::dark_default)
    }

    pub fn app_message_style(&self, kind: AppMessageKind) -> &AppMessageStyle {
        match kind {
            AppMessageKind::Info => &self.app_info,
            AppMessageKind::Warning => &self.app_warning,
            AppMessageKind::Error => &self.app_error,
        }
    }

    pub fn role_text_style(&self, role: TranscriptRole) -> Style {
        match role {
            TranscriptRole::User => self.user_text_style,
            TranscriptRole::Assistant => self.assistant_text_style,
            TranscriptRole::System => self.system_text_style,
            _ => role
                .app_kind()
                .map(|kind| self.app_message_style(kind).text_style)
                .unwrap_or(self.system_text_style),
        }
    }

    pub fn md_heading_style(&self, level: u8) -> Style {
        match level {
            1 => self.md_h1,
            2 => self.md_h2,
            _ => self.md_h3,
        }
    }

    pub fn md_codeblock_bg_color(&self) -> Option<Color> {
        self.md_codeblock_bg
    }

    pub fn md_codeblock_style(&self) -> Style {
        match self.md_codeblock_bg {
            Some(bg) => self.md_codeblock_text.bg(bg),
            None => self.md_codeblock_text,
        }
    }
}
