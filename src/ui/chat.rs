//! Console rendering of a tutor conversation.

use std::io::Write;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::conversation::{TranscriptEvent, TranscriptSink};
use crate::ui::icons::{TUTOR, WARN};

/// Streams replies to stdout as they arrive.
///
/// A spinner runs between [`ConsoleRenderer::waiting`] and the first event of
/// the reply. Each `Delta` prints only the text not yet on screen.
pub struct ConsoleRenderer {
    spinner: Option<ProgressBar>,
    printed: usize,
    verbose: bool,
}

impl ConsoleRenderer {
    pub fn new(verbose: bool) -> Self {
        Self {
            spinner: None,
            printed: 0,
            verbose,
        }
    }

    /// Show a spinner until the model starts answering.
    pub fn waiting(&mut self, label: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(style(label.to_string()).dim().to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn write(&self, text: &str) {
        let mut out = std::io::stdout();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// The part of `text_so_far` not yet printed, if the prefix still matches.
pub(crate) fn unprinted(text_so_far: &str, printed: usize) -> Option<&str> {
    text_so_far.get(printed..)
}

impl TranscriptSink for ConsoleRenderer {
    fn publish(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::UserMessage(text) => {
                if self.verbose {
                    self.write(&format!("{}\n", style(format!("> {}", text)).dim()));
                }
            }
            TranscriptEvent::Delta { text_so_far } => {
                if self.printed == 0 {
                    self.stop_spinner();
                    self.write(&format!("{}", TUTOR));
                }
                if let Some(fresh) = unprinted(&text_so_far, self.printed) {
                    self.write(fresh);
                }
                self.printed = text_so_far.len();
            }
            TranscriptEvent::Finished { .. } => {
                self.stop_spinner();
                self.write("\n\n");
                self.printed = 0;
            }
            TranscriptEvent::Notice(text) => {
                self.stop_spinner();
                if self.printed > 0 {
                    self.write("\n");
                }
                self.write(&format!("{}{}\n\n", WARN, style(text).yellow()));
                self.printed = 0;
            }
        }
    }
}
