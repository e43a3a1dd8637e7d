//! An immutable labelled interval on one timeline.
//!
//! Mirrors the reference's `eventClass`: a validated triple
//! `(timeline, label, (start, end))` with total equality, a total order, and
//! tuple-like positional access. When an `Event` is produced by
//! [`crate::tableau::Tableau::events_list`], `start`/`end` are **row
//! indices** into the owning tableau, not raw input timestamps — see
//! SPEC_FULL.md §3.

use std::fmt;

use crate::error::EventError;

/// A labelled interval on a single timeline.
///
/// ## Poka-Yoke construction
///
/// The only way to build an `Event` is [`Event::new`], which validates every
/// invariant up front: the label must be non-empty and must not contain
/// `'_'` (the marker alphabet uses `_` as a separator between the `S`/`I`/`E`
/// tag and the label), and `start` must be strictly less than `end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    timeline: u32,
    label: String,
    start: i64,
    end: i64,
}

impl Event {
    /// Creates a new validated `Event`.
    ///
    /// # Errors
    /// - [`EventError::EmptyLabel`] if `label` is empty.
    /// - [`EventError::LabelContainsUnderscore`] if `label` contains `'_'`.
    /// - [`EventError::NonPositiveSpan`] if `start >= end`.
    pub fn new(timeline: u32, label: impl Into<String>, start: i64, end: i64) -> Result<Self, EventError> {
        let label = label.into();
        if label.is_empty() {
            return Err(EventError::EmptyLabel);
        }
        if label.contains('_') {
            return Err(EventError::LabelContainsUnderscore(label));
        }
        if start >= end {
            return Err(EventError::NonPositiveSpan { start, end });
        }
        Ok(Event { timeline, label, start, end })
    }

    pub fn timeline(&self) -> u32 {
        self.timeline
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Positional tuple view, mirroring the reference's list-like indexing.
    pub fn as_tuple(&self) -> (u32, &str, (i64, i64)) {
        (self.timeline, &self.label, (self.start, self.end))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, ({}, {}))", self.timeline, self.label, self.start, self.end)
    }
}

/// Ordering is lexicographic by (start, end, timeline, label), per §3.
impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.start, self.end, self.timeline, &self.label).cmp(&(
            other.start,
            other.end,
            other.timeline,
            &other.label,
        ))
    }
}
