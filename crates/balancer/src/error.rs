use std::{io, path::PathBuf};
use thiserror::Error;

/// A result type defaulting to the crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All recoverable conditions the balancer can report.
///
/// None of these are fatal to the dispatch loop: malformed addresses are
/// dropped and logged, an exhausted pool skips scaling, and sink failures are
/// surfaced to the caller that owns the log destination.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A request's source address is not a dotted four-octet address.
    #[error("invalid source address `{address}`")]
    InvalidAddress { address: String },

    /// The pool has no workers left to compute a load ratio against.
    #[error("worker pool exhausted")]
    PoolExhausted,

    /// The log destination could not be opened.
    #[error("log sink unavailable: {}", .path.display())]
    LogSinkUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing finished entries to the sink failed.
    #[error("failed to write log entries")]
    LogWrite(#[from] io::Error),
}
