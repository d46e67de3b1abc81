//! Terminal output for builds: prefixed log lines, live progress bars for the
//! parallel phases and per-phase timing.
//!
//! ```ignore
//! log!("build"; "{} pages created", count);
//!
//! let progress = ProgressBars::new_filtered(&[("html", 40), ("feeds", 3)]);
//! if let Some(progress) = &progress {
//!     progress.inc_by_name("html");
//! }
//! ```
//!
//! Log lines print above any active bars so rayon workers can keep updating
//! them while phases report.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Instant,
};

static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Lines currently held by progress bars below the cursor.
static BAR_ROWS: AtomicUsize = AtomicUsize::new(0);

static QUIET: AtomicBool = AtomicBool::new(false);

const FALLBACK_WIDTH: u16 = 120;
const BAR_MIN: usize = 10;
const BAR_MAX: usize = 40;

/// Silence (or re-enable) all logger output.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::SeqCst);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::SeqCst)
}

fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map_or(FALLBACK_WIDTH, |(w, _)| w)) as usize
}

/// Width of `[module] `.
const fn prefix_width(module: &str) -> usize {
    module.len() + 3
}

// ============================================================================
// Log lines
// ============================================================================

/// Log a formatted message under a module prefix.
///
/// ```ignore
/// log!("check"; "{}: no description", page);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print `[module] message`, cut to the terminal width unless it spans
/// several lines (error snippets stay whole).
#[allow(clippy::cast_possible_truncation)]
pub fn log(module: &str, message: &str) {
    if is_quiet() {
        return;
    }

    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    let rows = BAR_ROWS.load(Ordering::SeqCst);
    if rows > 0 {
        execute!(stdout, cursor::MoveUp(rows as u16), Clear(ClearType::FromCursorDown)).ok();
    }

    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, terminal_width().saturating_sub(prefix_width(module)))
    };
    writeln!(stdout, "{prefix} {message}").ok();

    // give the bars their lines back; they redraw on the next tick
    for _ in 0..rows {
        writeln!(stdout).ok();
    }
    stdout.flush().ok();
}

/// Phase lines are cyan, check findings blue, errors red; everything else
/// the build colour.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "phase" => prefix.cyan(),
        "check" => prefix.bright_blue().bold(),
        "error" => prefix.bright_red().bold(),
        "build" | "write" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Longest prefix of `s` within `max_len` bytes that ends on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Progress bars
// ============================================================================

/// One terminal row per named counter, redrawn in place as rayon workers
/// call [`inc_by_name`](Self::inc_by_name). Bars clear themselves on drop.
pub struct ProgressBars {
    bars: Vec<Bar>,
    draw: Mutex<()>,
}

struct Bar {
    name: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl ProgressBars {
    pub fn new(counters: &[(&'static str, usize)]) -> Self {
        let mut stdout = stdout().lock();
        for _ in counters {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();
        BAR_ROWS.store(counters.len(), Ordering::SeqCst);

        Self {
            bars: counters
                .iter()
                .map(|&(name, total)| Bar {
                    name,
                    total,
                    done: AtomicUsize::new(0),
                })
                .collect(),
            draw: Mutex::new(()),
        }
    }

    /// Bars for the non-empty counters, or `None` when quiet, when stdout is
    /// not a terminal or when there is at most one unit of work.
    pub fn new_filtered(counters: &[(&'static str, usize)]) -> Option<Self> {
        if is_quiet() || !stdout().is_terminal() {
            return None;
        }

        let counters: Vec<_> = counters.iter().filter(|(_, n)| *n > 0).copied().collect();
        if counters.iter().map(|(_, n)| n).sum::<usize>() <= 1 {
            return None;
        }
        Some(Self::new(&counters))
    }

    pub fn inc_by_name(&self, name: &str) {
        if let Some((row, bar)) = self.bars.iter().enumerate().find(|(_, bar)| bar.name == name) {
            let done = bar.done.fetch_add(1, Ordering::Relaxed) + 1;
            self.redraw(row, bar, done);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn redraw(&self, row: usize, bar: &Bar, done: usize) {
        let _guard = self.draw.lock().ok();
        let line = bar_line(done, bar.total, terminal_width().saturating_sub(prefix_width(bar.name)));
        let up = (self.bars.len() - row) as u16;

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(up), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} {line}", colorize_prefix(bar.name)).ok();
        execute!(stdout, cursor::MoveDown(up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&self) {
        if BAR_ROWS.swap(0, Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.draw.lock().ok();
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveUp(self.bars.len() as u16),
            Clear(ClearType::FromCursorDown)
        )
        .ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

/// `[████░░░░] done/total`, the bar sized to what `room` leaves over.
fn bar_line(done: usize, total: usize, room: usize) -> String {
    let count = format!("{done}/{total}");
    let width = room.saturating_sub(count.len() + 3).clamp(BAR_MIN, BAR_MAX);
    let filled = if total == 0 { 0 } else { (done.min(total) * width) / total };
    format!("[{}{}] {count}", "█".repeat(filled), "░".repeat(width - filled))
}

// ============================================================================
// Phase timing
// ============================================================================

/// Times consecutive build phases and logs each as `[phase] <name> <n>ms`.
#[derive(Debug)]
pub struct PhaseTimer {
    started: Instant,
    steps: Vec<(&'static str, u128)>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Vec::new(),
        }
    }

    /// Close the running phase under `name`; the next one starts now.
    pub fn step(&mut self, name: &'static str) {
        let ms = self.started.elapsed().as_millis();
        self.started = Instant::now();
        self.steps.push((name, ms));
        crate::log!("phase"; "{name:<18}{ms:>6}ms");
    }

    pub fn steps(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    pub fn total_ms(&self) -> u128 {
        self.steps.iter().map(|(_, ms)| ms).sum()
    }

    /// The phase that took longest; the earliest one on ties.
    pub fn slowest(&self) -> Option<(&'static str, u128)> {
        self.steps
            .iter()
            .copied()
            .reduce(|slowest, step| if step.1 > slowest.1 { step } else { slowest })
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_width() {
        assert_eq!(prefix_width("phase"), 8);
        assert_eq!(prefix_width(""), 3);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("render pages", 20), "render pages");
        assert_eq!(truncate_str("render pages", 6), "render");
        assert_eq!(truncate_str("abc", 0), "");
        // "é" is 2 bytes
        assert_eq!(truncate_str("aé", 2), "a");
    }

    #[test]
    fn test_bar_line() {
        assert_eq!(bar_line(5, 10, 0), format!("[{}{}] 5/10", "█".repeat(5), "░".repeat(5)));
        assert_eq!(bar_line(0, 0, 0), format!("[{}] 0/0", "░".repeat(BAR_MIN)));

        let wide = bar_line(40, 40, 500);
        assert_eq!(wide.chars().filter(|c| *c == '█').count(), BAR_MAX);
    }

    #[test]
    fn test_phase_timer_records_steps_in_order() {
        set_quiet(true);
        let mut timer = PhaseTimer::new();
        assert!(timer.slowest().is_none());

        timer.step("initialize");
        timer.step("render pages");
        assert_eq!(timer.steps(), vec!["initialize", "render pages"]);
        assert!(timer.slowest().is_some());
    }

    #[test]
    fn test_progress_bars_skipped_when_quiet() {
        set_quiet(true);
        assert!(ProgressBars::new_filtered(&[("html", 10), ("feeds", 2)]).is_none());
    }

    #[test]
    fn test_colorize_prefix_contains_module() {
        assert!(colorize_prefix("phase").to_string().contains("[phase]"));
        assert!(colorize_prefix("Check").to_string().contains("[Check]"));
    }
}
