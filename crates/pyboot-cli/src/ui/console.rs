//! Console reporter
//!
//! Status lines go to stderr so the launched application owns stdout.
//! Download progress redraws a single line in place, throttled to a few
//! frames per second.

use std::io::{IsTerminal, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::style::Stylize;
use crossterm::{cursor, queue, terminal};
use pyboot_core::Reporter;

use super::theme::{Theme, format_size};

const FRAME: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct LiveLine {
    file_name: String,
    drawn_at: Instant,
}

#[derive(Debug)]
pub struct ConsoleReporter {
    theme: Theme,
    interactive: bool,
    live: Mutex<Option<LiveLine>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            interactive: std::io::stderr().is_terminal(),
            live: Mutex::new(None),
        }
    }

    fn line(&self, text: &str) {
        self.finish_live();
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{text}");
    }

    /// Terminate an in-place progress line before printing anything else.
    fn finish_live(&self) {
        let Ok(mut live) = self.live.lock() else {
            return;
        };
        if live.take().is_some() && self.interactive {
            let _ = writeln!(std::io::stderr());
        }
    }

    fn draw_progress(
        &self,
        file_name: &str,
        current: u64,
        total: Option<u64>,
    ) -> std::io::Result<()> {
        let theme = &self.theme;
        let amount = match total.filter(|&t| t > 0) {
            Some(t) => format!(
                "{} / {} ({}%)",
                format_size(current),
                format_size(t),
                current.saturating_mul(100) / t
            ),
            None => format_size(current),
        };

        let mut err = std::io::stderr().lock();
        queue!(
            err,
            cursor::MoveToColumn(0),
            terminal::Clear(terminal::ClearType::CurrentLine)
        )?;
        write!(
            err,
            "  {} {} {}",
            theme.icons.active.with(theme.colors.active),
            file_name,
            amount.with(theme.colors.secondary)
        )?;
        err.flush()
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        self.line(&title.with(self.theme.colors.header).bold().to_string());
    }

    fn downloading(&self, file_name: &str, current: u64, total: Option<u64>) {
        // Non-interactive output only gets the resolver's completion line.
        if !self.interactive {
            return;
        }

        let Ok(mut live) = self.live.lock() else {
            return;
        };
        let now = Instant::now();
        let complete = total.is_some_and(|t| current >= t);
        let due = match live.as_ref() {
            Some(l) if l.file_name == file_name => {
                complete || now.duration_since(l.drawn_at) >= FRAME
            }
            Some(_) => {
                let _ = writeln!(std::io::stderr());
                true
            }
            None => true,
        };
        if !due {
            return;
        }

        if let Err(e) = self.draw_progress(file_name, current, total) {
            tracing::debug!("progress redraw failed: {e}");
        }
        *live = Some(LiveLine {
            file_name: file_name.to_string(),
            drawn_at: now,
        });
    }

    fn candidate_missed(&self, file_name: &str, reason: &str) {
        let theme = &self.theme;
        self.line(&format!(
            "  {} {} {}",
            theme.icons.skipped.with(theme.colors.secondary),
            file_name.with(theme.colors.secondary),
            format!("({reason})").with(theme.colors.secondary)
        ));
    }

    fn info(&self, msg: &str) {
        self.line(&format!("  {} {msg}", self.theme.icons.info.blue()));
    }

    fn success(&self, msg: &str) {
        self.line(&format!(
            "  {} {msg}",
            self.theme.icons.success.with(self.theme.colors.success)
        ));
    }

    fn warning(&self, msg: &str) {
        self.line(&format!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        ));
    }

    fn error(&self, msg: &str) {
        self.line(&format!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        ));
    }
}
