//! Output rendering for the console surface.
//!
//! A [`Renderer`] receives a turn as it happens: the speaker, each streamed
//! fragment, and how the turn ended.  The web surface has its own renderer
//! that forwards the same calls as server-sent events.

use std::io::{self, Stdout, Write};

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the speaker label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for magenta text (used for the assistant's name).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Called once before the first fragment of a reply.
    fn start_response(&mut self, speaker: &str);

    /// Print a chunk of reply text.
    ///
    /// This is called incrementally as fragments are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a reply is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    in_response: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            in_response: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// Terminate a partially printed reply so the next line starts clean.
    fn end_line(&mut self) {
        if self.in_response {
            println!();
            self.in_response = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self, speaker: &str) {
        self.end_line();
        if self.use_color {
            print!("{ANSI_BOLD}{ANSI_MAGENTA}{speaker}:{ANSI_RESET} ");
        } else {
            print!("{speaker}: ");
        }
        self.in_response = true;
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.end_line();
        if self.use_color {
            eprintln!("{ANSI_RED}{error}{ANSI_RESET}");
        } else {
            eprintln!("{error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.end_line();
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
    }

    fn finish_response(&mut self) {
        self.end_line();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.end_line();
        println!("[interrupted]");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
        assert!(!renderer.in_response);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn finishing_closes_the_response() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.start_response("Aurora");
        assert!(renderer.in_response);
        renderer.finish_response();
        assert!(!renderer.in_response);
    }
}
