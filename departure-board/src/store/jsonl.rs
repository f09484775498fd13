//! Append-only JSON-lines departure store.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DepartureFact, DepartureStore, StoreError};

const BUS_FILE: &str = "bus_departures.jsonl";
const RAIL_FILE: &str = "rail_departures.jsonl";

/// Writes each departure as one JSON object per line, bus and rail
/// departures to separate files in the same directory.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    dir: PathBuf,
}

impl JsonLinesStore {
    /// Create a store writing into `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File receiving bus departures.
    pub fn bus_path(&self) -> PathBuf {
        self.dir.join(BUS_FILE)
    }

    /// File receiving rail departures.
    pub fn rail_path(&self) -> PathBuf {
        self.dir.join(RAIL_FILE)
    }

    /// Blocking file I/O. Async callers go through `spawn_blocking`.
    fn append(&self, path: &Path, fact: &DepartureFact) -> Result<(), StoreError> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }

        let line = serde_json::to_string(fact)?;
        debug!(path = %path.display(), "appending departure");

        let mut file = OpenOptions::new().append(true).create(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl DepartureStore for JsonLinesStore {
    fn store_bus_departure(&self, fact: &DepartureFact) -> Result<(), StoreError> {
        self.append(&self.bus_path(), fact)
    }

    fn store_rail_departure(&self, fact: &DepartureFact) -> Result<(), StoreError> {
        self.append(&self.rail_path(), fact)
    }
}
