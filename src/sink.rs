//! Batch emitter / sink interface.
//!
//! The core hands finite batches to a `RecordSink` and never
//! materializes a full table, which is what bounds memory independently
//! of the requested volume. Collaborators implement the trait:
//! `JsonlSink` is the bundled file writer (columnar writers plug in the
//! same way and are not a core concern), `MemorySink` backs tests and
//! interactive previews.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::error::SinkWriteError;

/// Destination for synthesized record batches of one table.
///
/// `emit` is called repeatedly with bounded batches; `finish` signals
/// completion (it is called even for a zero-row run, so progress
/// displays always observe a terminal event). A failing sink aborts the
/// remainder of its table only — batches already accepted stay valid and
/// are never rolled back.
pub trait RecordSink<R> {
    fn emit(&mut self, batch: Vec<R>) -> Result<(), SinkWriteError>;
    fn finish(&mut self, table: &str) -> Result<(), SinkWriteError>;
}

impl<R, S: RecordSink<R> + ?Sized> RecordSink<R> for Box<S> {
    fn emit(&mut self, batch: Vec<R>) -> Result<(), SinkWriteError> {
        (**self).emit(batch)
    }

    fn finish(&mut self, table: &str) -> Result<(), SinkWriteError> {
        (**self).finish(table)
    }
}

/// JSON-lines file sink, one serialized record per line.
pub struct JsonlSink {
    writer: BufWriter<File>,
    path: PathBuf,
    rows: u64,
}

impl JsonlSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkWriteError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Serialize> RecordSink<R> for JsonlSink {
    fn emit(&mut self, batch: Vec<R>) -> Result<(), SinkWriteError> {
        for record in &batch {
            serde_json::to_writer(&mut self.writer, record)
                .map_err(|e| SinkWriteError::new(e.to_string()))?;
            self.writer.write_all(b"\n")?;
        }
        self.rows += batch.len() as u64;
        Ok(())
    }

    fn finish(&mut self, table: &str) -> Result<(), SinkWriteError> {
        self.writer.flush()?;
        info!(table, rows = self.rows, path = %self.path.display(), "table written");
        Ok(())
    }
}

/// In-memory sink with a shared handle: clone it before handing it to
/// the runner, then read the rows back afterwards.
pub struct MemorySink<R> {
    rows: Arc<Mutex<Vec<R>>>,
    finished: Arc<Mutex<Option<String>>>,
}

impl<R> MemorySink<R> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(Mutex::new(None)),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table name passed to `finish`, if completion was signaled.
    pub fn finished(&self) -> Option<String> {
        self.finished.lock().ok().and_then(|f| f.clone())
    }
}

impl<R: Clone> MemorySink<R> {
    pub fn rows(&self) -> Vec<R> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl<R> Clone for MemorySink<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            finished: Arc::clone(&self.finished),
        }
    }
}

impl<R> Default for MemorySink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RecordSink<R> for MemorySink<R> {
    fn emit(&mut self, batch: Vec<R>) -> Result<(), SinkWriteError> {
        self.rows
            .lock()
            .map_err(|_| SinkWriteError::new("memory sink poisoned"))?
            .extend(batch);
        Ok(())
    }

    fn finish(&mut self, table: &str) -> Result<(), SinkWriteError> {
        *self
            .finished
            .lock()
            .map_err(|_| SinkWriteError::new("memory sink poisoned"))? = Some(table.to_string());
        Ok(())
    }
}
