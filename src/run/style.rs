use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Reset, Style};

const BOLD: Style = Style::new().bold();
const DIM: Style = Style::new().dimmed();
const GREEN: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const RED: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));
const YELLOW: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)));

/// ANSI color helpers that only emit escape codes when enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct Palette {
    color: bool,
}

impl Palette {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Palette { color }
    }

    /// Colored when stdout is a terminal.
    #[must_use]
    pub fn for_stdout() -> Self {
        Palette::new(std::io::stdout().is_terminal())
    }

    fn paint(self, style: Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{Reset}")
        } else {
            s.to_string()
        }
    }

    #[must_use]
    pub fn bold(self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    #[must_use]
    pub fn dim(self, s: &str) -> String {
        self.paint(DIM, s)
    }

    #[must_use]
    pub fn green(self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    #[must_use]
    pub fn red(self, s: &str) -> String {
        self.paint(RED, s)
    }

    #[must_use]
    pub fn yellow(self, s: &str) -> String {
        self.paint(YELLOW, s)
    }
}

#[must_use]
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let tenths = d.subsec_millis() / 100;
    if total_secs < 60 {
        format!("{total_secs}.{tenths}s")
    } else {
        format!("{}m {}.{tenths}s", total_secs / 60, total_secs % 60)
    }
}
