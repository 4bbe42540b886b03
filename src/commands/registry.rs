use super::CommandResult;
use crate::core::session::Session;

pub type CommandHandler = fn(&mut Session, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands and key bindings.",
        handler: super::handle_help,
    },
    Command {
        name: "attach",
        usage: "/attach <path> [<path>...]",
        help: "Attach up to 5 local files (quote paths containing spaces).",
        handler: super::handle_attach,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Close the connection and exit.",
        handler: super::handle_quit,
    },
];
