use std::io::{self, Write};

use anyhow::Context;
use crossterm::{cursor, execute, terminal};

use camterm_core::format::Size;

/// Raw mode plus the alternate screen for as long as the guard lives.
/// Dropping it, or panicking, puts the terminal back.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            original_hook(info);
        }));

        terminal::enable_raw_mode().context("enable raw mode")?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
            .context("enter alternate screen")?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(b"\x1b[0m");
    let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Current terminal size in cells.
pub fn size() -> anyhow::Result<Size> {
    let (cols, rows) = terminal::size().context("query terminal size")?;
    Ok(Size::new(cols as u32, rows as u32))
}
