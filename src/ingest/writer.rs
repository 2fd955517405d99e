//! Checkpoint log writer.

use crate::error::Result;
use crate::schema::{CheckpointRecord, SolverKind, LOG_HEADER};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes checkpoint rows in the format [`super::read_rows`] parses.
///
/// The header is written on construction. Unsolved objectives are written as
/// `inf`.
pub struct CheckpointLogWriter<W: Write> {
    inner: Writer<W>,
    rows_written: usize,
}

impl CheckpointLogWriter<File> {
    /// Create (truncate) a log file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CheckpointLogWriter<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = Writer::from_writer(writer);
        inner.write_record(LOG_HEADER)?;
        Ok(Self {
            inner,
            rows_written: 0,
        })
    }

    /// Append one row.
    pub fn write(&mut self, kind: SolverKind, record: &CheckpointRecord) -> Result<()> {
        self.inner.write_record([
            kind.name().to_string(),
            record.instance_id.clone(),
            record.elapsed_time.to_string(),
            record.objective.to_string(),
            record.status_code.to_string(),
        ])?;
        self.rows_written += 1;
        Ok(())
    }

    /// Append every record of one solver.
    pub fn write_all<'a, I>(&mut self, kind: SolverKind, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a CheckpointRecord>,
    {
        for record in records {
            self.write(kind, record)?;
        }
        Ok(())
    }

    /// Rows written so far (header excluded).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush buffered rows.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
    }
}
