//! The console turn loop.
//!
//! [`run_console`] greets, then reads one line at a time until the user
//! quits or input ends.  Lines come from a [`LineSource`], normally a
//! rustyline editor; output goes through a [`Renderer`].

use std::sync::{Arc, Mutex, PoisonError};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::history::TurnRole;
use crate::chat::session::{ChatModel, ChatSession, turn_error_message};
use crate::render::Renderer;
use crate::{Error, Result};

/// Prompt shown before each line of user input.
pub const PROMPT: &str = "You: ";

/// One read from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// A line of text, without its newline.
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// Ctrl+D or the end of input.
    Eof,
}

/// Where the console loop reads lines from.
pub trait LineSource {
    /// Show `prompt` and read the next line.
    fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.trim());
                }
                Ok(ConsoleInput::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ConsoleInput::Interrupted),
            Err(ReadlineError::Eof) => Ok(ConsoleInput::Eof),
            Err(ReadlineError::Io(err)) => Err(Error::io("cannot read from the terminal", err)),
            Err(err) => Err(Error::validation(format!("Input error: {err}"))),
        }
    }
}

/// Lets Ctrl+C reach the turn in flight.
///
/// The loop registers a fresh token for each turn; [`Interrupter::interrupt`]
/// cancels it.  Outside a turn interrupting does nothing.
#[derive(Clone, Default)]
pub struct Interrupter {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupter {
    /// An interrupter with no turn in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the turn in flight, if any.
    pub fn interrupt(&self) {
        if let Some(token) = self.slot().as_ref() {
            token.cancel();
        }
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    fn end(&self) {
        *self.slot() = None;
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run the console conversation until the user leaves.
///
/// Failed turns are reported and the loop continues; only reading input
/// can end it early.
pub async fn run_console<M: ChatModel>(
    session: &mut ChatSession<M>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
    interrupter: &Interrupter,
) {
    let farewell = session.persona().farewell();
    renderer.print_info(session.persona().greeting());
    renderer.print_info("Type /help for commands, 'quit' or 'exit' to leave.");

    loop {
        let line = match input.read_line(PROMPT) {
            Ok(ConsoleInput::Line(line)) => line,
            // Ctrl+C at the prompt only clears the line
            Ok(ConsoleInput::Interrupted) => continue,
            Ok(ConsoleInput::Eof) => {
                renderer.print_info(farewell);
                break;
            }
            Err(err) => {
                renderer.print_error(&err.to_string());
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(cmd) = parse_command(line) {
            match cmd {
                ChatCommand::Quit => {
                    renderer.print_info(farewell);
                    break;
                }
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        renderer.print_info(&format!("    {line}"));
                    }
                }
                ChatCommand::History => print_history(session, renderer),
                ChatCommand::Stats => print_stats(session, renderer),
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        let token = interrupter.begin();
        let result = session.send_streaming(line, renderer, &token).await;
        interrupter.end();
        match result {
            Ok(_) => {}
            Err(err) if err.is_cancelled() => renderer.print_interrupted(),
            Err(err) => renderer.print_error(&turn_error_message(&err)),
        }
    }
}

fn print_history<M: ChatModel>(session: &ChatSession<M>, renderer: &mut dyn Renderer) {
    let history = session.history();
    if history.is_empty() {
        renderer.print_info("    (no messages yet)");
        return;
    }
    for turn in history.turns() {
        let speaker = match turn.role {
            TurnRole::User => "You",
            TurnRole::Assistant => session.persona().name(),
        };
        renderer.print_info(&format!("    {speaker}: {}", turn.text));
    }
}

fn print_stats<M: ChatModel>(session: &ChatSession<M>, renderer: &mut dyn Renderer) {
    let stats = session.stats();
    renderer.print_info("    Session Statistics:");
    renderer.print_info(&format!("      Model: {}", stats.model));
    renderer.print_info(&format!("      Turns in history: {}", stats.turn_count));
    renderer.print_info(&format!("      Replies completed: {}", stats.turns_completed));
    renderer.print_info(&format!("      Replies failed: {}", stats.turns_failed));
    renderer.print_info(&format!(
        "      Fragments received: {}",
        stats.fragments_received
    ));
}
