//! Crate-wide error taxonomy.
//!
//! Each sub-error models one failure domain (event construction, tableau
//! validation, merge compatibility, forbidden-rule lookup, engine state,
//! audit sink I/O) and is composed into [`Error`] via `#[from]`.

use thiserror::Error;

use crate::instant::InstantCode;

/// Errors raised while constructing or inspecting an [`crate::event::Event`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("event label cannot be empty")]
    EmptyLabel,
    #[error("event label {0:?} must not contain '_'")]
    LabelContainsUnderscore(String),
    #[error("event span must satisfy start < end, got start={start}, end={end}")]
    NonPositiveSpan { start: i64, end: i64 },
}

/// Errors raised while constructing or mutating a [`crate::tableau::Tableau`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableauError {
    #[error("all rows of a tableau must have the same width, expected {expected} got {actual}")]
    InconsistentWidth { expected: usize, actual: usize },
    #[error("timeline {timeline} does not match the pattern (_|S_L (I_L)* E_L)* at row {row}")]
    MalformedTimeline { timeline: usize, row: usize },
    #[error("deleting event {label:?} would leave the tableau empty")]
    EmptyAfterDeletion { label: String },
    #[error("event {label:?} not found in tableau")]
    EventNotFound { label: String },
    #[error("instants length {instants} does not match row count {rows}")]
    InstantsLengthMismatch { instants: usize, rows: usize },
}

/// Errors raised by [`crate::mem_tableau::MemTableau::merge`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("merge requires a singleton itemset (exactly one event), got size {0}")]
    NonSingleton(usize),
    #[error("incompatible tableau widths: self has {self_width} timelines, other has {other_width}")]
    IncompatibleWidth { self_width: usize, other_width: usize },
    #[error("merge produced a malformed candidate matrix: {0}")]
    MaterializationFailed(#[from] TableauError),
}

/// Errors raised by the forbidden-interval bookkeeping on a memoized tableau.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenError {
    #[error("no history entry to convert to a forbidden rule")]
    EmptyHistory,
    #[error("instant code {0} not found while rewriting forbidden rule")]
    InstantNotFound(InstantCode),
}

/// Errors raised by the Apriori engine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invariant violated: found {count} matches for a (k-1)-subset during backing, expected exactly 1")]
    DuplicateBackingMatch { count: usize },
    #[error("engine state transition {from} -> {to} is not valid")]
    InvalidTransition { from: String, to: String },
}

/// Errors raised by an [`crate::audit::AuditSink`] implementation.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("audit database already exists at {0}")]
    AlreadyExists(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error composing every sub-domain's error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Tableau(#[from] TableauError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
