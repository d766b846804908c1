//! Persona-seeded chat sessions.
//!
//! This module provides the pieces both surfaces share:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`history`]: alternating user/assistant turns
//! - [`session`]: the turn loop body and API interaction
//! - [`commands`]: console command parsing
//! - [`console`]: the console turn loop

mod commands;
mod config;
mod console;
mod history;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, is_exit_keyword, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use console::{ConsoleInput, Interrupter, LineSource, PROMPT, run_console};
pub use history::{History, Turn, TurnRole};
pub use session::{
    ChatModel, ChatSession, GenerativeModel, SessionStats, TurnOutcome, init_session,
    turn_error_message,
};
