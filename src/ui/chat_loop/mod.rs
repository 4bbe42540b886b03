//! Main chat event loop
//!
//! One task owns the [`Session`] and the view state. It reacts to terminal
//! input and to [`SessionEvent`]s from connection tasks, in arrival order.

mod lifecycle;
mod setup;

pub use self::setup::ChatOptions;

use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

use crate::commands::{process_input, CommandResult};
use crate::core::connection::SessionEvent;
use crate::core::constants::RECONNECT_DELAY;
use crate::core::input::SendOutcome;
use crate::core::session::Session;
use crate::core::transport::WsConnector;
use crate::ui::renderer::{ui, ScrollState};
use crate::ui::theme::Theme;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use std::{error::Error, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tui_textarea::TextArea;

const MOUSE_SCROLL_LINES: u16 = 3;
const INDICATOR_TICK: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Exit,
}

fn new_textarea() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text("Message");
    textarea
}

/// View state that lives beside the session: input box, theme and scroll.
struct ChatView {
    theme: Theme,
    textarea: TextArea<'static>,
    scroll: ScrollState,
    page_lines: u16,
    request_redraw: bool,
}

impl ChatView {
    fn new(theme: Theme) -> Self {
        Self {
            theme,
            textarea: new_textarea(),
            scroll: ScrollState::default(),
            page_lines: 10,
            request_redraw: true,
        }
    }

    fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn clear_input(&mut self) {
        self.textarea = new_textarea();
    }
}

fn submit(view: &mut ChatView, session: &mut Session) -> LoopControl {
    let text = view.input_text();
    match process_input(session, &text) {
        CommandResult::Quit => return LoopControl::Exit,
        CommandResult::Continue => view.clear_input(),
        CommandResult::ProcessAsMessage(message) => match session.submit_input(&message) {
            SendOutcome::Sent(_) => view.clear_input(),
            outcome => debug!(?outcome, "Message not sent; keeping input"),
        },
    }
    LoopControl::Continue
}

fn handle_key(view: &mut ChatView, session: &mut Session, key: KeyEvent) -> LoopControl {
    if key.kind != KeyEventKind::Press {
        return LoopControl::Continue;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => LoopControl::Exit,
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            view.textarea.insert_newline();
            LoopControl::Continue
        }
        KeyCode::Enter => submit(view, session),
        KeyCode::PageUp => {
            view.scroll.scroll_up(view.page_lines);
            LoopControl::Continue
        }
        KeyCode::PageDown => {
            view.scroll.scroll_down(view.page_lines);
            LoopControl::Continue
        }
        _ => {
            view.textarea.input(tui_textarea::Input::from(key));
            LoopControl::Continue
        }
    }
}

fn handle_paste(view: &mut ChatView, text: &str) {
    let sanitized_text = text
        .replace('\t', "    ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect::<String>();
    view.textarea.insert_str(&sanitized_text);
}

fn handle_ui_event(view: &mut ChatView, session: &mut Session, event: UiEvent) -> LoopControl {
    let UiEvent::Crossterm(event) = event;
    view.request_redraw = true;
    match event {
        Event::Key(key) => handle_key(view, session, key),
        Event::Paste(text) => {
            handle_paste(view, &text);
            LoopControl::Continue
        }
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => view.scroll.scroll_up(MOUSE_SCROLL_LINES),
                MouseEventKind::ScrollDown => view.scroll.scroll_down(MOUSE_SCROLL_LINES),
                _ => view.request_redraw = false,
            }
            LoopControl::Continue
        }
        _ => LoopControl::Continue,
    }
}

/// Reads terminal events on a blocking thread until the receiver goes away.
fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !event_tx.is_closed() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(error = %err, "Failed to read terminal event"),
                },
                Ok(false) => {}
                Err(err) => {
                    debug!(error = %err, "Terminal event polling stopped");
                    break;
                }
            }
        }
    })
}

fn draw(
    terminal: &mut ChatTerminal,
    view: &mut ChatView,
    session: &Session,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| {
        view.page_lines = f.area().height.saturating_sub(6).max(1);
        ui(f, session, &view.theme, &mut view.textarea, &mut view.scroll);
    })?;
    view.request_redraw = false;
    Ok(())
}

async fn event_loop(
    terminal: &mut ChatTerminal,
    view: &mut ChatView,
    session: &mut Session,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    session_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<(), Box<dyn Error>> {
    let mut indicator = tokio::time::interval(INDICATOR_TICK);
    loop {
        if view.request_redraw {
            draw(terminal, view, session)?;
        }

        tokio::select! {
            Some(event) = event_rx.recv() => {
                if handle_ui_event(view, session, event) == LoopControl::Exit {
                    return Ok(());
                }
            }
            Some(event) = session_rx.recv() => {
                let update = session.handle_event(event);
                debug!(?update, "Session event handled");
                view.request_redraw = true;
            }
            _ = indicator.tick(), if session.stream.is_active() => {
                view.request_redraw = true;
            }
            else => return Ok(()),
        }
    }
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let (mut session, mut session_rx) = Session::with_connector(
        options.endpoint.clone(),
        RECONNECT_DELAY,
        Arc::new(WsConnector),
        options.pipeline(),
    );
    let mut view = ChatView::new(options.theme.clone());

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader = spawn_event_reader(event_tx);

    info!(endpoint = %options.endpoint, "Starting chat session");
    session.start();

    let result = event_loop(
        &mut terminal,
        &mut view,
        &mut session,
        &mut event_rx,
        &mut session_rx,
    )
    .await;

    session.shutdown();
    drop(event_rx);
    restore_terminal(&mut terminal)?;
    let _ = event_reader.await;
    info!("Chat session closed");

    result
}
