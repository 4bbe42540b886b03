use crate::core::attachments::AttachmentMeta;
use crate::core::constants::INDICATOR_SPACE;
use crate::core::message::TranscriptRole;
use crate::core::session::Session;
use crate::core::transcript::{DisplayContent, EntryBody, Transcript, TranscriptEntry};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;
use unicode_width::UnicodeWidthChar;

const USER_PREFIX: &str = "You: ";
const USER_CONTINUATION_INDENT: &str = "     ";
const MAX_INPUT_LINES: u16 = 6;

/// Scroll position of the transcript pane, measured from the bottom so that
/// `0` means following the tail.
#[derive(Debug, Default, Clone)]
pub struct ScrollState {
    offset_from_bottom: u16,
    seen_scroll_requests: u64,
}

impl ScrollState {
    pub fn offset_from_bottom(&self) -> u16 {
        self.offset_from_bottom
    }

    pub fn is_following(&self) -> bool {
        self.offset_from_bottom == 0
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    /// Jumps back to the tail if the transcript asked for it since the last
    /// sync.
    pub fn sync(&mut self, transcript: &Transcript) {
        let requests = transcript.scroll_requests();
        if requests != self.seen_scroll_requests {
            self.seen_scroll_requests = requests;
            self.offset_from_bottom = 0;
        }
    }

    /// Top line to show for `total` lines in a pane `height` lines tall.
    /// Clamps the stored offset so scrolling past the top sticks there.
    pub fn top_line(&mut self, total: usize, height: u16) -> u16 {
        let max_offset = total.saturating_sub(height as usize).min(u16::MAX as usize) as u16;
        self.offset_from_bottom = self.offset_from_bottom.min(max_offset);
        max_offset - self.offset_from_bottom
    }
}

fn prefixed_lines(
    text: &str,
    prefix: Span<'static>,
    continuation: &str,
    text_style: Style,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        let lead = if i == 0 {
            prefix.clone()
        } else {
            Span::raw(continuation.to_string())
        };
        out.push(Line::from(vec![
            lead,
            Span::styled(line.trim_end_matches('\r').to_string(), text_style),
        ]));
    }
    out
}

fn attachment_line(meta: &AttachmentMeta, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(USER_PREFIX, theme.user_prefix_style),
        Span::styled(format!("[file] {}", meta.name), theme.attachment_style),
        Span::styled(
            format!(" ({}) {}", meta.size_label(), meta.reference),
            theme.system_text_style,
        ),
    ])
}

fn plain_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.trim_end_matches('\r').to_string(), style)))
        .collect()
}

pub fn entry_lines(entry: &TranscriptEntry, theme: &Theme) -> Vec<Line<'static>> {
    let content = match &entry.body {
        EntryBody::Attachment(meta) => return vec![attachment_line(meta, theme)],
        EntryBody::Message(content) => content,
    };

    match (entry.role, content) {
        (_, DisplayContent::Rich(markup)) => markup.lines(),
        (TranscriptRole::User, DisplayContent::Plain(text)) => prefixed_lines(
            text,
            Span::styled(USER_PREFIX, theme.user_prefix_style),
            USER_CONTINUATION_INDENT,
            theme.user_text_style,
        ),
        (role, DisplayContent::Plain(text)) => match role.app_kind() {
            Some(kind) => {
                let style = theme.app_message_style(kind);
                let indent = " ".repeat(style.prefix.chars().count());
                prefixed_lines(
                    text,
                    Span::styled(style.prefix.clone(), style.prefix_style),
                    &indent,
                    style.text_style,
                )
            }
            None => plain_lines(text, theme.role_text_style(role)),
        },
    }
}

/// Every transcript entry, separated by blank lines.
pub fn transcript_lines(transcript: &Transcript, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in transcript.entries() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.extend(entry_lines(entry, theme));
    }
    lines
}

/// Hard-wraps lines to `width` display columns, keeping span styles.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: u16) -> Vec<Line<'static>> {
    let width = width.max(1) as usize;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let mut current: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;
        for span in line.spans {
            let mut chunk = String::new();
            for ch in span.content.chars() {
                let w = ch.width().unwrap_or(0);
                if used + w > width && used > 0 {
                    if !chunk.is_empty() {
                        current.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    }
                    out.push(Line::from(std::mem::take(&mut current)).style(line.style));
                    used = 0;
                }
                chunk.push(ch);
                used += w;
            }
            if !chunk.is_empty() {
                current.push(Span::styled(chunk, span.style));
            }
        }
        out.push(Line::from(current).style(line.style));
    }
    out
}

/// Title text: endpoint, connection status and a streaming marker.
pub fn title_text(session: &Session) -> String {
    let status = session
        .connection
        .status()
        .map(|status| status.label())
        .unwrap_or("not connected");
    let mut title = format!(
        "tether v{} • {} • {}",
        env!("CARGO_PKG_VERSION"),
        session.connection.endpoint(),
        status
    );
    if session.connection.reconnect_pending() {
        title.push_str(" (reconnecting)");
    }
    title
}

fn input_height(textarea: &TextArea<'_>) -> u16 {
    (textarea.lines().len() as u16).clamp(1, MAX_INPUT_LINES)
}

pub fn ui(
    f: &mut Frame,
    session: &Session,
    theme: &Theme,
    textarea: &mut TextArea<'static>,
    scroll: &mut ScrollState,
) {
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_height(textarea) + 2),
        ])
        .split(f.area());

    draw_title(f, chunks[0], session, theme);
    draw_transcript(f, chunks[1], session, theme, scroll);
    draw_input(f, chunks[2], session, theme, textarea);
}

fn draw_title(f: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let mut spans = vec![Span::styled(title_text(session), theme.title_style)];
    if session.stream.is_active() {
        spans.push(Span::styled(" ●", theme.streaming_indicator_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_transcript(
    f: &mut Frame,
    area: Rect,
    session: &Session,
    theme: &Theme,
    scroll: &mut ScrollState,
) {
    scroll.sync(&session.transcript);
    let lines = wrap_lines(transcript_lines(&session.transcript, theme), area.width);
    let top = scroll.top_line(lines.len(), area.height);
    f.render_widget(Paragraph::new(lines).scroll((top, 0)), area);
}

fn draw_input(
    f: &mut Frame,
    area: Rect,
    session: &Session,
    theme: &Theme,
    textarea: &mut TextArea<'static>,
) {
    let title = if session.stream.is_active() {
        "Receiving reply… (Alt+Enter for new line, Ctrl+C to quit)"
    } else {
        "Type your message (Alt+Enter for new line, /help for help, Ctrl+C to quit)"
    };
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.input_border_style)
            .title(Span::styled(title, theme.input_title_style)),
    );
    textarea.set_style(theme.input_text_style);
    textarea.set_cursor_style(theme.input_cursor_style);
    textarea.set_cursor_line_style(Style::default());

    let inner = Rect {
        width: area.width.saturating_sub(INDICATOR_SPACE.min(area.width)),
        ..area
    };
    f.render_widget(&*textarea, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::AppMessageKind;
    use url::Url;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn entries_are_prefixed_by_role() {
        let theme = Theme::dark_default();
        let mut transcript = Transcript::new();
        transcript.push_plain(TranscriptRole::User, "hi\nthere");
        transcript.push_notice(AppMessageKind::Error, "Not connected to server");
        transcript.push_plain(TranscriptRole::Assistant, "**raw**");

        assert_eq!(
            text_of(&transcript_lines(&transcript, &theme)),
            [
                "You: hi",
                "     there",
                "",
                "✗ Not connected to server",
                "",
                "**raw**",
            ]
        );
    }

    #[test]
    fn attachments_show_name_size_and_reference() {
        let theme = Theme::light();
        let meta = AttachmentMeta {
            name: "a.txt".into(),
            size: 2048,
            mime_type: "text/plain".into(),
            reference: Url::parse("file:///tmp/a.txt").unwrap(),
        };
        assert_eq!(
            attachment_line(&meta, &theme).to_string(),
            "You: [file] a.txt (2 KB) file:///tmp/a.txt"
        );
    }

    #[test]
    fn wrapping_splits_on_display_width() {
        let wrapped = wrap_lines(vec![Line::from("abcdefg"), Line::default()], 3);
        assert_eq!(text_of(&wrapped), ["abc", "def", "g", ""]);

        let wide = wrap_lines(vec![Line::from("日本語")], 4);
        assert_eq!(text_of(&wide), ["日本", "語"]);
    }

    #[test]
    fn scroll_follows_tail_until_user_scrolls() {
        let mut transcript = Transcript::new();
        let mut scroll = ScrollState::default();
        assert_eq!(scroll.top_line(30, 10), 20);

        scroll.scroll_up(5);
        assert_eq!(scroll.top_line(30, 10), 15);
        scroll.scroll_up(100);
        assert_eq!(scroll.top_line(30, 10), 0);

        transcript.scroll_to_end();
        scroll.sync(&transcript);
        assert!(scroll.is_following());
        assert_eq!(scroll.top_line(30, 10), 20);
    }
}
