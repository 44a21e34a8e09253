//! Output rendering for the chat controller.
//!
//! The controller reports every state change to a [`Renderer`]. The terminal
//! implementation sanitizes assistant content before display and holds back
//! text inside a math span until the span closes.

use std::io::{self, Stdout, Write};

use crate::sanitize::{sanitize, settled_len};
use crate::types::{Message, MessageRole, Phase, Status};

/// ANSI escape code for dim text (used for the writing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Return to column zero and clear the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Shown while a reply is pending and nothing has been displayed yet.
const WRITING_INDICATOR: &str = "Agent writing...";

/// Receives every transcript and status change a [`ChatController`] makes.
///
/// [`PlainTextRenderer`] draws them on the terminal. The unit tests use a
/// recorder that keeps the calls in order and asserts on them.
///
/// [`ChatController`]: crate::ChatController
pub trait Renderer: Send {
    /// Called when a message is appended to the transcript.
    ///
    /// For the assistant this is the empty placeholder.
    fn push_message(&mut self, message: &Message) {
        _ = message;
    }

    /// Called with the full, unsanitized content of the open assistant
    /// message after every chunk.
    fn update_assistant(&mut self, content: &str);

    /// Called when the phase or the loading/streaming flags change.
    fn status_changed(&mut self, status: &Status) {
        _ = status;
    }

    /// Called once when a send finishes, whatever the outcome.
    fn finish_response(&mut self) {}

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    indicator: bool,
    open: bool,
    diverged: bool,
    raw: String,
    printed: String,
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
            indicator: false,
            open: false,
            diverged: false,
            raw: String::new(),
            printed: String::new(),
        }
    }

    /// Prints a whole transcript, sanitizing assistant messages.
    pub fn print_transcript(&mut self, messages: &[Message]) {
        for message in messages {
            let body = match message.role {
                MessageRole::User => message.content.clone(),
                MessageRole::Assistant => sanitize(&message.content),
            };
            self.print_label(message.role);
            println!("{body}\n");
        }
        self.flush();
    }

    /// Prints the speaker label that precedes a message.
    pub fn print_label(&mut self, role: MessageRole) {
        let label = match role {
            MessageRole::User => "You:",
            MessageRole::Assistant => "Assistant:",
        };
        if self.use_color {
            println!("{ANSI_BOLD}{label}{ANSI_RESET}");
        } else {
            println!("{label}");
        }
        self.flush();
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn clear_indicator(&mut self) {
        if self.indicator {
            if self.use_color {
                print!("{ANSI_CLEAR_LINE}");
            } else {
                println!();
            }
            self.indicator = false;
            self.flush();
        }
    }

    /// Prints whatever `candidate` adds to what is already on screen.
    ///
    /// Returns false if `candidate` no longer extends the printed text.
    fn emit(&mut self, candidate: &str) -> bool {
        match candidate.strip_prefix(self.printed.as_str()) {
            Some(extension) => {
                if !extension.is_empty() {
                    print!("{extension}");
                    self.printed = candidate.to_string();
                    self.flush();
                }
                true
            }
            None => false,
        }
    }

    fn open_text(&self) -> bool {
        !self.printed.is_empty() || self.diverged
    }

    fn reset_response(&mut self) {
        self.open = false;
        self.diverged = false;
        self.raw.clear();
        self.printed.clear();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn push_message(&mut self, message: &Message) {
        if message.is_assistant() {
            self.reset_response();
            self.open = true;
        }
    }

    fn update_assistant(&mut self, content: &str) {
        self.raw.clear();
        self.raw.push_str(content);
        if content.is_empty() {
            return;
        }
        self.clear_indicator();
        if self.diverged {
            return;
        }
        let settled = sanitize(&content[..settled_len(content)]);
        if !self.emit(&settled) {
            self.diverged = true;
        }
    }

    fn status_changed(&mut self, status: &Status) {
        if status.phase.is_busy() && status.loading && !self.open_text() && !self.indicator {
            if self.use_color {
                print!("{ANSI_DIM}{WRITING_INDICATOR}{ANSI_RESET}");
            } else {
                print!("{WRITING_INDICATOR}");
            }
            self.indicator = true;
            self.flush();
        }
    }

    fn finish_response(&mut self) {
        self.clear_indicator();
        if self.open {
            let full = sanitize(&self.raw);
            if self.diverged || !self.emit(&full) {
                // A late delimiter re-paired an earlier span; show the final form.
                println!();
                print!("{full}");
            }
            println!("\n");
            self.flush();
        }
        self.reset_response();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_indicator();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.clear_indicator();
        println!("{info}");
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
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn math_span_is_held_until_closed() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.push_message(&Message::assistant(""));

        renderer.update_assistant("Energy is $E = [Source: a]");
        assert_eq!(renderer.printed, "Energy is ");

        renderer.update_assistant("Energy is $E = [Source: a] mc^2$.");
        assert_eq!(renderer.printed, "Energy is $E = mc^2$.");
        assert!(!renderer.diverged);

        renderer.finish_response();
        assert!(renderer.printed.is_empty());
        assert!(!renderer.open);
    }

    #[test]
    fn late_delimiter_marks_divergence() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.push_message(&Message::assistant(""));

        renderer.update_assistant("$$a$$ b [Source: x] ");
        assert_eq!(renderer.printed, "$$a$$ b [Source: x] ");

        // The closing `$` pairs with the tail of `$$a$$` and swallows the tag.
        renderer.update_assistant("$$a$$ b [Source: x] $");
        renderer.update_assistant("$$a$$ b [Source: x] $c$");
        assert!(renderer.diverged);
    }

    #[test]
    fn indicator_follows_busy_loading_status() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.status_changed(&Status::IDLE);
        assert!(!renderer.indicator);

        renderer.status_changed(&Status {
            phase: Phase::Sending,
            loading: true,
            streaming: true,
        });
        assert!(renderer.indicator);

        renderer.push_message(&Message::assistant(""));
        renderer.update_assistant("Hi");
        assert!(!renderer.indicator);

        // Text is already on screen, so the indicator does not come back.
        renderer.status_changed(&Status {
            phase: Phase::Streaming,
            loading: true,
            streaming: true,
        });
        assert!(!renderer.indicator);

        renderer.finish_response();
        renderer.status_changed(&Status {
            phase: Phase::Settled,
            loading: false,
            streaming: false,
        });
        assert!(!renderer.indicator);
    }

    #[test]
    fn user_push_does_not_open_response() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.push_message(&Message::user("hi"));
        assert!(!renderer.open);
    }
}
