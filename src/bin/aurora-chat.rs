//! Console chat with Aurora.
//!
//! The API key is read from `GOOGLE_API_KEY` (a `.env` file in the working
//! directory is honored) and otherwise prompted for without echo.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! aurora-chat
//!
//! # Specify a model
//! aurora-chat --model gemini-2.5-flash
//!
//! # Cooler, more focused replies
//! aurora-chat --temperature 0.4 --top-k 20
//!
//! # Disable colors (useful for piping output)
//! aurora-chat --no-color
//! ```
//!
//! Type `quit` or `exit` to leave.  Ctrl+C while Aurora is replying
//! interrupts the reply; the interrupted exchange is forgotten.
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/history` - Show the conversation so far
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::process::ExitCode;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use aurora::chat::{
    ChatArgs, ChatConfig, Interrupter, PlainTextRenderer, Renderer, init_session, run_console,
};
use aurora::credential::{CredentialResolver, EnvironmentVariable, InteractivePrompt};
use aurora::persona::configuration_failure;

/// Main entry point for the aurora-chat application.
#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_env("AURORA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("aurora-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let credential = match CredentialResolver::new()
        .with_provider(EnvironmentVariable::default())
        .with_provider(InteractivePrompt::masked("Enter your Google API Key: "))
        .resolve()
    {
        Ok(credential) => credential,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };
    let mut session = match init_session(&credential, &config) {
        Ok(session) => session,
        Err(err) => {
            renderer.print_error(&configuration_failure(&err));
            return Ok(ExitCode::FAILURE);
        }
    };

    let interrupter = Interrupter::new();
    let handler = interrupter.clone();
    ctrlc::set_handler(move || handler.interrupt())?;

    let mut editor = DefaultEditor::new()?;
    run_console(&mut session, &mut editor, &mut renderer, &interrupter).await;

    Ok(ExitCode::SUCCESS)
}
