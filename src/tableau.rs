//! The immutable marker-matrix representation of an interval-itemset.

use std::cell::RefCell;
use std::hash::{Hash, Hasher};

use crate::error::TableauError;
use crate::event::Event;
use crate::marker::Marker;

/// A sequence of equal-width marker rows encoding an interval-itemset's
/// relative temporal arrangement.
///
/// Equality, ordering in collections, and hashing are defined solely over
/// `data` — two tableaus with the same marker matrix are the same itemset
/// regardless of any derived-view cache state, matching the reference's
/// list-equality semantics.
#[derive(Debug, Clone)]
pub struct Tableau {
    data: Vec<Vec<Marker>>,
    width: usize,
    events_cache: RefCell<Option<Vec<Event>>>,
    searchable_string_cache: RefCell<Option<String>>,
}

impl PartialEq for Tableau {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
impl Eq for Tableau {}

impl Hash for Tableau {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl Tableau {
    /// Builds and validates a tableau from a marker matrix.
    ///
    /// # Errors
    /// - [`TableauError::InconsistentWidth`] if rows differ in length.
    /// - [`TableauError::MalformedTimeline`] if a timeline column does not
    ///   match `(⊥|S_L (I_L)* E_L)*`.
    pub fn from_markers(data: Vec<Vec<Marker>>) -> Result<Tableau, TableauError> {
        let width = data.first().map(|r| r.len()).unwrap_or(0);
        for row in &data {
            if row.len() != width {
                return Err(TableauError::InconsistentWidth { expected: width, actual: row.len() });
            }
        }
        Self::validate_timelines(&data, width)?;
        Ok(Tableau {
            data,
            width,
            events_cache: RefCell::new(None),
            searchable_string_cache: RefCell::new(None),
        })
    }

    /// Builds and validates a tableau from the reference's textual spelling
    /// (`S_label`, `I_label`, `E_label`, `_`).
    pub fn from_raw(data: Vec<Vec<String>>) -> Result<Tableau, TableauError> {
        let width = data.first().map(|r| r.len()).unwrap_or(0);
        let mut parsed = Vec::with_capacity(data.len());
        for (row_idx, row) in data.into_iter().enumerate() {
            if row.len() != width {
                return Err(TableauError::InconsistentWidth { expected: width, actual: row.len() });
            }
            let mut parsed_row = Vec::with_capacity(row.len());
            for raw in row {
                let marker = Marker::parse(&raw)
                    .ok_or(TableauError::MalformedTimeline { timeline: 0, row: row_idx })?;
                parsed_row.push(marker);
            }
            parsed.push(parsed_row);
        }
        Tableau::from_markers(parsed)
    }

    fn validate_timelines(data: &[Vec<Marker>], width: usize) -> Result<(), TableauError> {
        for t in 0..width {
            let mut open: Option<&str> = None;
            for (row_idx, row) in data.iter().enumerate() {
                match &row[t] {
                    Marker::Null => {
                        if open.is_some() {
                            return Err(TableauError::MalformedTimeline { timeline: t, row: row_idx });
                        }
                    }
                    Marker::Start(label) => {
                        if open.is_some() {
                            return Err(TableauError::MalformedTimeline { timeline: t, row: row_idx });
                        }
                        open = Some(label.as_str());
                    }
                    Marker::Interior(label) => {
                        if open != Some(label.as_str()) {
                            return Err(TableauError::MalformedTimeline { timeline: t, row: row_idx });
                        }
                    }
                    Marker::End(label) => {
                        if open != Some(label.as_str()) {
                            return Err(TableauError::MalformedTimeline { timeline: t, row: row_idx });
                        }
                        open = None;
                    }
                }
            }
            if open.is_some() {
                return Err(TableauError::MalformedTimeline { timeline: t, row: data.len() });
            }
        }
        Ok(())
    }

    /// Builds a height-2 singleton tableau for `event`: `S_label` on row 0,
    /// `E_label` on row 1, `⊥` elsewhere, across `total_timelines` columns.
    pub fn from_event(event: &Event, total_timelines: usize) -> Tableau {
        let mut start_row = vec![Marker::Null; total_timelines];
        let mut end_row = vec![Marker::Null; total_timelines];
        start_row[event.timeline() as usize] = Marker::Start(event.label().to_string());
        end_row[event.timeline() as usize] = Marker::End(event.label().to_string());
        Tableau {
            data: vec![start_row, end_row],
            width: total_timelines,
            events_cache: RefCell::new(None),
            searchable_string_cache: RefCell::new(None),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.data.len()
    }

    pub fn row(&self, index: usize) -> &[Marker] {
        &self.data[index]
    }

    pub fn rows(&self) -> &[Vec<Marker>] {
        &self.data
    }

    /// Number of distinct events (count of `S_` markers across the matrix).
    pub fn size(&self) -> usize {
        self.data.iter().flatten().filter(|m| m.is_start()).count()
    }

    pub fn check_compatibility(&self, other: &Tableau) -> bool {
        self.width == other.width
    }

    /// One [`Event`] per S/E pair on each timeline, row position as
    /// start/end. Cached, invalidated only by `del_null`.
    pub fn events_list(&self) -> Vec<Event> {
        if let Some(cached) = self.events_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut events = Vec::new();
        for t in 0..self.width {
            let mut start: Option<usize> = None;
            for (row_idx, row) in self.data.iter().enumerate() {
                match &row[t] {
                    Marker::Start(_) => start = Some(row_idx),
                    Marker::End(label) => {
                        if let Some(s) = start.take() {
                            if let Ok(event) = Event::new(t as u32, label.clone(), s as i64, row_idx as i64) {
                                events.push(event);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        *self.events_cache.borrow_mut() = Some(events.clone());
        events
    }

    /// Canonical one-line serialization:
    /// `[c_{0,0},c_{0,1},...][c_{1,0},...]...`.
    pub fn as_searchable_string(&self) -> String {
        if let Some(cached) = self.searchable_string_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut out = String::new();
        for row in &self.data {
            out.push('[');
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&cell.to_string());
            }
            out.push(']');
        }
        *self.searchable_string_cache.borrow_mut() = Some(out.clone());
        out
    }

    /// True iff `needle`'s pattern occurs as an order-preserving, per-cell
    /// compatible subsequence of `self`'s rows.
    pub fn contains(&self, needle: &Tableau) -> bool {
        if self.width != needle.width {
            return false;
        }
        let mut cursor = 0usize;
        for needle_row in &needle.data {
            let mut found = None;
            while cursor < self.data.len() {
                if Self::row_compatible(&self.data[cursor], needle_row) {
                    found = Some(cursor);
                    cursor += 1;
                    break;
                }
                cursor += 1;
            }
            if found.is_none() {
                return false;
            }
        }
        true
    }

    fn row_compatible(haystack_row: &[Marker], needle_row: &[Marker]) -> bool {
        haystack_row
            .iter()
            .zip(needle_row.iter())
            .all(|(h, n)| n.is_null() || h == n)
    }

    /// Clears `evt`'s `S`/`E` markers and the `I_L` interior run between them
    /// on `evt`'s timeline, without collapsing any row. Shared by
    /// [`Tableau::delete_event`] and `MemTableau::delete_event`, which must
    /// keep a parallel `instants` array in lockstep with collapsed rows.
    pub(crate) fn clear_event_markers(&self, evt: &Event) -> Result<Vec<Vec<Marker>>, TableauError> {
        let t = evt.timeline() as usize;
        let start = evt.start() as usize;
        let end = evt.end() as usize;
        if t >= self.width || start >= self.data.len() || end >= self.data.len() {
            return Err(TableauError::EventNotFound { label: evt.label().to_string() });
        }
        let mut data = self.data.clone();
        if !matches!(&data[start][t], Marker::Start(l) if l == evt.label()) {
            return Err(TableauError::EventNotFound { label: evt.label().to_string() });
        }
        data[start][t] = Marker::Null;
        data[end][t] = Marker::Null;
        for row in data.iter_mut().take(end).skip(start + 1) {
            row[t] = Marker::Null;
        }
        Ok(data)
    }

    /// Removes `evt`'s `S`/`E` markers (and the `I_L` interior run between
    /// them on `evt`'s timeline), then collapses any row left with no
    /// `S`/`E` marker on any timeline (all cells `⊥` or `I_*`).
    ///
    /// # Errors
    /// [`TableauError::EmptyAfterDeletion`] if the result would have size 0.
    pub fn delete_event(&self, evt: &Event) -> Result<Tableau, TableauError> {
        let data = self.clear_event_markers(evt)?;
        let cleaned: Vec<Vec<Marker>> = data.into_iter().filter(|row| !Self::is_dead_row(row)).collect();

        let result = Tableau {
            width: self.width,
            events_cache: RefCell::new(None),
            searchable_string_cache: RefCell::new(None),
            data: cleaned,
        };
        if result.size() == 0 {
            return Err(TableauError::EmptyAfterDeletion { label: evt.label().to_string() });
        }
        Ok(result)
    }

    pub(crate) fn is_dead_row(row: &[Marker]) -> bool {
        row.iter().all(|m| matches!(m, Marker::Null | Marker::Interior(_)))
    }

    /// Removes every row that carries no `S`/`E` marker on any timeline.
    /// Idempotent: a second call is a no-op.
    pub fn del_null(&mut self) {
        let before = self.data.len();
        self.data.retain(|row| !Self::is_dead_row(row));
        if self.data.len() != before {
            *self.events_cache.borrow_mut() = None;
            *self.searchable_string_cache.borrow_mut() = None;
        }
    }

    /// Builds a filler row for insertion at `row_index`: `⊥` everywhere,
    /// except timelines currently inside an open event (scanning rows
    /// `0..row_index`) receive the matching `I_L` marker.
    pub fn gen_null(&self, row_index: usize) -> Vec<Marker> {
        let mut out = vec![Marker::Null; self.width];
        for t in 0..self.width {
            let mut open: Option<&str> = None;
            for row in self.data.iter().take(row_index) {
                match &row[t] {
                    Marker::Start(label) => open = Some(label.as_str()),
                    Marker::End(_) => open = None,
                    _ => {}
                }
            }
            if let Some(label) = open {
                out[t] = Marker::Interior(label.to_string());
            }
        }
        out
    }
}
