//! JSON Lines file writer for recorded events.
//!
//! One JSON object per line, appended to `events_{YYYY-MM-DD}.jsonl`:
//! - An interrupted write only damages the last line
//! - Existing files are appended to, never truncated
//! - The file rotates when the UTC date changes

use crate::error::{PersistenceError, PersistenceResult};
use crate::record::{RecordEvent, Recorder};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Active writer state for daily file.
struct ActiveWriter {
    writer: BufWriter<File>,
    date: String,
    records_written: usize,
}

/// Buffered JSON Lines writer.
pub struct JsonLinesWriter {
    base_dir: PathBuf,
    buffer: Vec<RecordEvent>,
    /// Buffer size that triggers a flush.
    max_buffer_size: usize,
    active_writer: Option<ActiveWriter>,
}

impl JsonLinesWriter {
    /// Create a writer rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>, max_buffer_size: usize) -> PersistenceResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size: max_buffer_size.max(1),
            active_writer: None,
        })
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer an event, flushing when the buffer is full.
    pub fn add_record(&mut self, event: RecordEvent) -> PersistenceResult<()> {
        self.buffer.push(event);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    fn close_active_writer(&mut self) -> PersistenceResult<()> {
        if let Some(mut active) = self.active_writer.take() {
            active.writer.flush()?;
            info!(
                date = %active.date,
                records = active.records_written,
                "Closed JSON Lines writer"
            );
        }
        Ok(())
    }

    fn open_writer(&mut self, date: &str) -> PersistenceResult<()> {
        let path = self.base_dir.join(format!("events_{date}.jsonl"));

        info!(path = %path.display(), "Opening JSON Lines writer (append mode)");

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        self.active_writer = Some(ActiveWriter {
            writer: BufWriter::new(file),
            date: date.to_string(),
            records_written: 0,
        });

        Ok(())
    }

    /// Write buffered events to today's file.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();

        let needs_rotation = self
            .active_writer
            .as_ref()
            .map(|w| w.date != today)
            .unwrap_or(false);
        if needs_rotation {
            self.close_active_writer()?;
        }
        if self.active_writer.is_none() {
            self.open_writer(&today)?;
        }

        let Some(active) = self.active_writer.as_mut() else {
            return Err(PersistenceError::WriterClosed);
        };

        let record_count = self.buffer.len();
        for event in &self.buffer {
            let json = serde_json::to_string(event)?;
            writeln!(active.writer, "{json}")?;
        }
        active.writer.flush()?;
        active.records_written += record_count;

        debug!(date = %today, records = record_count, "Flushed events to JSON Lines");

        self.buffer.clear();
        Ok(())
    }

    /// Flush pending events and close the file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        self.close_active_writer()
    }
}

impl Recorder for JsonLinesWriter {
    fn record(&mut self, event: RecordEvent) -> PersistenceResult<()> {
        self.add_record(event)
    }

    fn flush(&mut self) -> PersistenceResult<()> {
        JsonLinesWriter::flush(self)
    }
}

impl Drop for JsonLinesWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, "Failed to flush buffer on drop");
        }
        if let Err(e) = self.close_active_writer() {
            warn!(?e, "Failed to close writer on drop");
        }
    }
}
