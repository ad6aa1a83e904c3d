use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled},
};
use std::io::{self, Write};

/// Line terminator for text printed while the line editor holds the terminal
/// in raw mode, where a bare `\n` does not return the carriage.
pub fn line_ending() -> &'static str {
    if is_raw_mode_enabled().unwrap_or(false) {
        "\r\n"
    } else {
        "\n"
    }
}

/// Terminal modes captured at startup so an interrupt can put them back.
#[derive(Debug, Clone, Copy)]
pub struct TerminalGuard {
    raw_mode: bool,
}

impl TerminalGuard {
    pub fn capture() -> Self {
        Self {
            raw_mode: is_raw_mode_enabled().unwrap_or(false),
        }
    }

    pub fn restore(&self) -> io::Result<()> {
        let raw_now = is_raw_mode_enabled()?;
        if raw_now && !self.raw_mode {
            disable_raw_mode()?;
        } else if !raw_now && self.raw_mode {
            enable_raw_mode()?;
        }

        let mut stdout = io::stdout();
        execute!(stdout, Show)?;
        stdout.flush()
    }
}
