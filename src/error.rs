//! Error types
//!
//! Only configuration problems and report I/O are fatal. Anything that goes
//! wrong with a single instance is reported as an [`InstanceError`] and the
//! run moves on; solver failures never become errors at all, they are
//! carried as [`crate::runner::Exit`] values.

use crate::ledger::LedgerState;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why one instance could not be benchmarked.
#[derive(Error, Debug)]
pub enum InstanceError {
    /// The file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// No `p edge` / `p col` / `p cnf` line
    #[error("missing header line")]
    MissingHeader,
    /// More than one header line
    #[error("line {line}: duplicated header")]
    DuplicateHeader {
        /// 1-based line number
        line: usize,
    },
    /// Header declares another format
    #[error("line {line}: unsupported header '{header}'")]
    UnsupportedFormat {
        /// 1-based line number
        line: usize,
        /// The offending header
        header: String,
    },
    /// A declared count or a data token is not an integer
    #[error("line {line}: '{token}' is not an integer")]
    BadInteger {
        /// 1-based line number
        line: usize,
        /// The offending token
        token: String,
    },
    /// An edge line without two endpoints
    #[error("line {line}: incomplete edge")]
    IncompleteEdge {
        /// 1-based line number
        line: usize,
    },
    /// A vertex or variable index outside the declared range
    #[error("line {line}: index {index} outside 1..={limit}")]
    IndexOutOfRange {
        /// 1-based line number
        line: usize,
        /// The offending index (absolute value for literals)
        index: u64,
        /// Declared vertex or variable count
        limit: usize,
    },
}

/// Fatal problems detected before the run loop starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A template file could not be loaded
    #[error("cannot load template {path}: {source}")]
    Template {
        /// Template path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// Neither an instance directory nor a single file was given
    #[error("an instance directory is required when not using --single-file")]
    NoInput,
    /// The instance directory does not exist
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Misuse of the ledger state machine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// Operation not allowed in the current state
    #[error("cannot {operation} a ledger in state {state:?}")]
    InvalidTransition {
        /// Attempted operation
        operation: &'static str,
        /// State at the time of the call
        state: LedgerState,
    },
}

/// Errors that abort a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Ledger misuse
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Report or directory I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for the controller
pub type BenchResult<T> = Result<T, BenchError>;
