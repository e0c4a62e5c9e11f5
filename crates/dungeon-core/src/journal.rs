//! Journal
//!
//! Append-only JSONL log of world events.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use dungeon_model::{EventDetail, WorldEvent};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("cannot open journal {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("journal write failed: {0}")]
    Write(#[from] std::io::Error),
    #[error("journal encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes [`WorldEvent`]s to a JSONL file.
pub struct Journal {
    writer: Option<BufWriter<File>>,
    event_count: u64,
    next_event_id: u64,
}

impl Journal {
    /// Starts a new journal at `path`, truncating any old one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
            next_event_id: 1,
        })
    }

    /// Continues an existing journal; ids carry on from its last line.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let open_err = |source| JournalError::Open {
            path: path.to_path_buf(),
            source,
        };
        let existing = match File::open(path) {
            Ok(file) => BufReader::new(file).lines().count() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(open_err(e)),
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
            next_event_id: existing + 1,
        })
    }

    /// A journal that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
            next_event_id: 1,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("evt_{:08}", self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Events recorded by this handle.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Assigns an id and writes one line.
    pub fn record(&mut self, turn: u64, detail: EventDetail) -> Result<WorldEvent, JournalError> {
        let event = WorldEvent::new(self.next_id(), turn, detail);
        self.log(&event)?;
        Ok(event)
    }

    pub fn log(&mut self, event: &WorldEvent) -> Result<(), JournalError> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(event)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), JournalError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush journal");
        }
    }
}

/// Reads every event back from a journal file.
pub fn read_journal(path: impl AsRef<Path>) -> Result<Vec<WorldEvent>, JournalError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| JournalError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}
