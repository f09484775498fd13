//! Display surfaces.
//!
//! Two independent surfaces consume the board's output:
//! - a compact character display, 2 rows of 16 columns
//! - a terminal-style display that prints multi-line text

mod console;

pub use console::{ConsoleLcd, StdoutTerminal};

use std::sync::Arc;

/// Rows on the compact display.
pub const COMPACT_ROWS: usize = 2;

/// Columns on the compact display.
pub const COMPACT_COLUMNS: usize = 16;

/// Errors from writing to a display.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The device or stream rejected the write
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row index beyond the display
    #[error("row {row} out of range (display has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
}

/// A fixed-size character display.
pub trait CompactDisplay: Send + Sync {
    fn clear(&self) -> Result<(), DisplayError>;

    fn write_line(&self, row: usize, text: &str) -> Result<(), DisplayError>;
}

/// A print-only text display.
pub trait TerminalDisplay: Send + Sync {
    fn show(&self, text: &str) -> Result<(), DisplayError>;
}

/// Both display surfaces, shared between restarts of the scheduler.
#[derive(Clone)]
pub struct Displays {
    pub compact: Arc<dyn CompactDisplay>,
    pub terminal: Arc<dyn TerminalDisplay>,
}

impl Displays {
    pub fn new(compact: Arc<dyn CompactDisplay>, terminal: Arc<dyn TerminalDisplay>) -> Self {
        Self { compact, terminal }
    }
}
