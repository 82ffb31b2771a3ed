//! Terminal output: prefixed log lines and the watch-mode status block.
//!
//! Everything goes to stderr. Stdout carries rendered documents and runner
//! output, so it must stay clean enough to pipe.
//!
//! ```ignore
//! log!("context"; "ready after {} ms", delay);
//! debug!("worker"; "cache hit {}", hash);
//! ```

use crossterm::{
    cursor, queue,
    terminal::{Clear, ClearType},
};
use owo_colors::{AnsiColors, OwoColorize};
use parking_lot::Mutex;
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set by `--verbose`.
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a line with a colored `[module]` prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like [`log!`], but only with `--verbose`. Arguments are not evaluated
/// otherwise.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Prefix colors, by pipeline stage. Anything else is yellow.
const PREFIX_COLORS: &[(&str, AnsiColors)] = &[
    ("host", AnsiColors::BrightBlue),
    ("context", AnsiColors::BrightCyan),
    ("worker", AnsiColors::BrightCyan),
    ("runner", AnsiColors::BrightMagenta),
    ("watch", AnsiColors::BrightGreen),
    ("error", AnsiColors::BrightRed),
];

pub fn log(module: &str, message: &str) {
    let color = PREFIX_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(module))
        .map_or(AnsiColors::BrightYellow, |&(_, color)| color);
    let prefix = format!("[{module}]");

    let mut err = stderr().lock();
    writeln!(err, "{} {message}", prefix.color(color).bold()).ok();
    err.flush().ok();
}

// ============================================================================
// Watch status
// ============================================================================

/// The block of lines describing the latest render in `watch`.
///
/// Each report replaces the previous one in place, so the terminal only
/// ever shows how the current version of the file rendered.
struct StatusBlock {
    /// Lines printed by the previous report.
    height: usize,
}

static STATUS: Mutex<StatusBlock> = Mutex::new(StatusBlock { height: 0 });

enum Mark {
    Success,
    Unchanged,
    Error,
}

impl StatusBlock {
    fn report(&mut self, mark: Mark, headline: &str, detail: &str) {
        let mut err = stderr().lock();
        if self.height > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let up = self.height.min(u16::MAX as usize) as u16;
            queue!(err, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock()).dimmed().to_string();
        let line = match mark {
            Mark::Success => format!("{stamp} {} {headline}", "✓".green()),
            Mark::Unchanged => format!("{stamp} {}", headline.dimmed()),
            Mark::Error => format!("{stamp} {} {headline}", "✗".red()),
        };
        writeln!(err, "{line}").ok();
        self.height = 1;

        for row in detail.lines() {
            writeln!(err, "  {row}").ok();
            self.height += 1;
        }
        err.flush().ok();
    }
}

/// UTC wall clock as `HH:MM:SS`.
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
}

pub fn status_success(headline: &str) {
    STATUS.lock().report(Mark::Success, headline, "");
}

pub fn status_unchanged(headline: &str) {
    STATUS.lock().report(Mark::Unchanged, headline, "");
}

/// Error headline plus an indented, possibly multi-line detail.
pub fn status_error(headline: &str, detail: &str) {
    STATUS.lock().report(Mark::Error, headline, detail);
}
