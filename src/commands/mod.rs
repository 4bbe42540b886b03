//! Slash commands typed into the input box.

mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::message::AppMessageKind;
use crate::core::session::Session;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(session: &mut Session, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = body.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name) {
        Some(command) => {
            (command.handler)(session, CommandInvocation { args })
        }
        None => CommandResult::ProcessAsMessage(input.to_string()),
    }
}

pub(super) fn handle_help(
    session: &mut Session,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let mut help = String::from("Commands:");
    for command in all_commands() {
        help.push_str(&format!("\n  {:<28} {}", command.usage, command.help));
    }
    help.push_str(
        "\nKeys:\n  Enter send, Alt+Enter newline, PageUp/PageDown scroll, Ctrl+C quit",
    );
    session.transcript.push_notice(AppMessageKind::Info, help);
    CommandResult::Continue
}

pub(super) fn handle_attach(
    session: &mut Session,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let paths = match split_args(invocation.args) {
        Ok(paths) if !paths.is_empty() => paths,
        Ok(_) => {
            session
                .transcript
                .push_notice(AppMessageKind::Warning, "Usage: /attach <path> [<path>...]");
            return CommandResult::Continue;
        }
        Err(err) => {
            session.transcript.push_notice(AppMessageKind::Error, err);
            return CommandResult::Continue;
        }
    };

    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    session.attach_paths(&paths);
    CommandResult::Continue
}

pub(super) fn handle_quit(
    _session: &mut Session,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Quit
}

/// Splits on whitespace, honouring single and double quotes and
/// backslash escapes outside single quotes.
pub fn split_args(input: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_arg = true;
                }
                None => return Err("Trailing backslash in arguments".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote in arguments".to_string());
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}
