//! Turns per-timeline interval lists into a [`Tableau`], the way the
//! reference's `intervals_to_words` turns `(label, begin, end)` triples into
//! marker rows.
//!
//! Timelines are keyed by a stable `u32` id so column order is
//! deterministic regardless of insertion order; within a timeline, events
//! must be given in non-decreasing start order and must not overlap.

use std::collections::{BTreeMap, VecDeque};

use crate::error::TableauError;
use crate::marker::Marker;
use crate::tableau::Tableau;

/// One timeline's ordered, non-overlapping interval events.
pub type TimelineRecord = BTreeMap<u32, Vec<(String, f64, f64)>>;

/// Builds a [`Tableau`] from per-timeline interval lists.
///
/// One row is emitted per distinct time instant at which some timeline
/// starts or ends an event. When one event's end coincides exactly with the
/// next event's start on the same timeline, the redundant `E_label`
/// transition is elided — the row at that instant shows only the next
/// event's `S_label`, never both.
pub fn timelines_to_tableau(record: &TimelineRecord) -> Result<Tableau, TableauError> {
    let width = record.len();
    if width == 0 {
        return Tableau::from_markers(Vec::new());
    }

    let mut queues: Vec<VecDeque<(String, f64, f64)>> =
        record.values().map(|events| events.iter().cloned().collect()).collect();
    let mut current: Vec<Option<(String, f64, f64)>> = queues.iter_mut().map(|q| q.pop_front()).collect();
    let mut active: Vec<Option<String>> = vec![None; width];

    if current.iter().all(Option::is_none) {
        return Tableau::from_markers(Vec::new());
    }

    let mut rows: Vec<Vec<Marker>> = Vec::new();
    let mut last_instant = f64::NEG_INFINITY;

    while current.iter().any(Option::is_some) {
        let next_instant = current
            .iter()
            .flatten()
            .flat_map(|(_, start, end)| [*start, *end])
            .filter(|t| *t > last_instant)
            .fold(f64::INFINITY, f64::min);
        last_instant = next_instant;

        let mut row = vec![Marker::Null; width];
        for i in 0..width {
            let Some((label, start, end)) = current[i].clone() else { continue };
            if next_instant == start {
                row[i] = Marker::Start(label.clone());
                active[i] = Some(label);
                if let Some((_, next_start, _)) = queues[i].front() {
                    if end == *next_start {
                        current[i] = queues[i].pop_front();
                    }
                }
            } else if next_instant == end {
                row[i] = Marker::End(label);
                active[i] = None;
                current[i] = queues[i].pop_front();
            } else if let Some(active_label) = &active[i] {
                row[i] = Marker::Interior(active_label.clone());
            }
        }
        rows.push(row);
    }

    Tableau::from_markers(rows)
}
