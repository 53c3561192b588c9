//! Finished log entries and the sinks that persist them.
//!
//! The dispatch loop only accumulates [`LogEntry`] values in generation order.
//! Persisting them is the job of a [`LogSink`], handed the whole batch once the
//! loop has stopped.

use crate::{Completion, Error, Result};
use core::fmt;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

/// Default file the simulation appends to.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// One line of the simulation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A worker finished an admitted request.
    Completed(Completion),
    /// The request came from the blocked range and was dismissed.
    Blocked { source: String },
    /// The request's source could not be parsed and was dismissed.
    Rejected { source: String },
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(completion) => fmt::Display::fmt(completion, f),
            Self::Blocked { source } => write!(f, "BLOCKED IP: {source} REQUEST DISMISSED"),
            Self::Rejected { source } => write!(f, "INVALID IP: {source} REQUEST DISMISSED"),
        }
    }
}

/// Destination for finished log entries.
pub trait LogSink {
    /// Persists `entries` in order, one line each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogWrite`] if the underlying destination fails.
    fn write_entries(&mut self, entries: &[LogEntry]) -> Result<()>;
}

/// A [`LogSink`] over any [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn write_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        for entry in entries {
            writeln!(self.writer, "{entry}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Appending file sink.
pub type FileSink = WriterSink<BufWriter<File>>;

impl FileSink {
    /// Opens (or creates) `path` in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogSinkUnavailable`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::LogSinkUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}
