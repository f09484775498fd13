//! Console stand-ins for the display hardware.

use std::io::Write;
use std::sync::Mutex;

use tracing::info;

use super::{COMPACT_ROWS, CompactDisplay, DisplayError, TerminalDisplay};

/// Emulates the compact display by keeping its rows in memory and logging
/// every write.
#[derive(Debug, Default)]
pub struct ConsoleLcd {
    rows: Mutex<[String; COMPACT_ROWS]>,
}

impl ConsoleLcd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row contents.
    pub fn rows(&self) -> [String; COMPACT_ROWS] {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl CompactDisplay for ConsoleLcd {
    fn clear(&self) -> Result<(), DisplayError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        for row in rows.iter_mut() {
            row.clear();
        }
        Ok(())
    }

    fn write_line(&self, row: usize, text: &str) -> Result<(), DisplayError> {
        if row >= COMPACT_ROWS {
            return Err(DisplayError::RowOutOfRange {
                row,
                rows: COMPACT_ROWS,
            });
        }

        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows[row] = text.to_string();
        info!(target: "lcd", row, text, "compact display");
        Ok(())
    }
}

/// Prints terminal output to stdout.
#[derive(Debug, Default)]
pub struct StdoutTerminal;

impl StdoutTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl TerminalDisplay for StdoutTerminal {
    fn show(&self, text: &str) -> Result<(), DisplayError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        stdout.flush()?;
        Ok(())
    }
}
