//! A tableau augmented with the instant lattice, forbidden memory, and
//! insertion history needed to merge candidates without regenerating
//! placements already ruled out.

use std::hash::{Hash, Hasher};

use hashbrown::HashMap;
use std::collections::HashSet;

use crate::error::{ForbiddenError, MergeError, TableauError};
use crate::event::Event;
use crate::instant::{BoundRange, ForbiddenInterval, InstantCode};
use crate::marker::Marker;
use crate::tableau::Tableau;

/// Per-label lists of forbidden start/end placements.
pub type ForbiddenMap = HashMap<String, Vec<ForbiddenInterval>>;

/// A tableau paired with its per-row instant codes, forbidden-insertion
/// memory, and append-only history of placements merged into it.
///
/// Equality, ordering, and hashing delegate entirely to the wrapped
/// [`Tableau`] — two `MemTableau`s with the same marker matrix are the same
/// itemset regardless of how their instant lattices or memory were built,
/// matching the reference's inherited list-equality.
#[derive(Debug, Clone)]
pub struct MemTableau {
    tableau: Tableau,
    instants: Vec<InstantCode>,
    forbidden: ForbiddenMap,
    history: Vec<(String, (InstantCode, InstantCode))>,
}

impl PartialEq for MemTableau {
    fn eq(&self, other: &Self) -> bool {
        self.tableau == other.tableau
    }
}
impl Eq for MemTableau {}

impl Hash for MemTableau {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tableau.hash(state);
    }
}

impl MemTableau {
    pub fn new(tableau: Tableau, instants: Vec<InstantCode>) -> Result<MemTableau, TableauError> {
        if instants.len() != tableau.height() {
            return Err(TableauError::InstantsLengthMismatch { instants: instants.len(), rows: tableau.height() });
        }
        Ok(MemTableau { tableau, instants, forbidden: HashMap::new(), history: Vec::new() })
    }

    /// The height-2 leaf tableau for a single dataset event, with the
    /// reference's literal base-level instant codes `"1"`/`"2"`.
    pub fn from_event(event: &Event, total_timelines: usize) -> MemTableau {
        MemTableau {
            tableau: Tableau::from_event(event, total_timelines),
            instants: vec![InstantCode::new("1"), InstantCode::new("2")],
            forbidden: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn instants(&self) -> &[InstantCode] {
        &self.instants
    }

    pub fn forbidden(&self) -> &ForbiddenMap {
        &self.forbidden
    }

    pub fn history(&self) -> &[(String, (InstantCode, InstantCode))] {
        &self.history
    }

    pub fn size(&self) -> usize {
        self.tableau.size()
    }

    pub fn events_list(&self) -> Vec<Event> {
        self.tableau.events_list()
    }

    pub fn check_compatibility(&self, other: &MemTableau) -> bool {
        self.tableau.check_compatibility(&other.tableau)
    }

    pub fn contains(&self, needle: &MemTableau) -> bool {
        self.tableau.contains(&needle.tableau)
    }

    /// Accumulative (union) merge of forbidden rules into this tableau's
    /// memory, mirroring the reference's `forbidden` setter: a label already
    /// on file gets the union (deduplicated) of old and new intervals.
    pub fn add_forbidden(&mut self, updates: ForbiddenMap) {
        for (label, new_rules) in updates {
            match self.forbidden.get_mut(&label) {
                Some(existing) => {
                    let mut set: HashSet<ForbiddenInterval> = existing.drain(..).collect();
                    set.extend(new_rules);
                    existing.extend(set);
                }
                None => {
                    self.forbidden.insert(label, new_rules);
                }
            }
        }
    }

    /// Turns the most recent history entry into a forbidden rule: future
    /// insertions of that label at an overlapping (start, end) placement
    /// are disallowed.
    pub fn as_forbidden(&self) -> Result<ForbiddenMap, ForbiddenError> {
        let (label, (s, e)) = self.history.last().ok_or(ForbiddenError::EmptyHistory)?;

        let next_index = self
            .instants
            .iter()
            .position(|code| code == e)
            .ok_or_else(|| ForbiddenError::InstantNotFound(e.clone()))?
            + 1;
        let next_instant = if next_index < self.instants.len() {
            self.instants[next_index].clone()
        } else {
            InstantCode::three_sentinel_of_width(self.instants[0].len())
        };

        let start_bound = if !s.is_anchored() {
            BoundRange::Range(s.with_last_digit('0'), next_instant.clone())
        } else {
            BoundRange::Single(s.clone())
        };
        let end_bound = if !e.is_anchored() {
            BoundRange::Range(e.with_last_digit('0'), next_instant)
        } else {
            BoundRange::Single(e.clone())
        };

        let mut map = HashMap::new();
        map.insert(label.clone(), vec![ForbiddenInterval::new(start_bound, end_bound)]);
        Ok(map)
    }

    /// Removes every row carrying no `S`/`E` marker on any timeline, keeping
    /// `instants` in lockstep. Idempotent.
    pub fn del_null(&mut self) {
        let keep: Vec<bool> = self.tableau.rows().iter().map(|row| !Tableau::is_dead_row(row)).collect();
        self.tableau.del_null();
        let mut mask = keep.into_iter();
        self.instants.retain(|_| mask.next().unwrap_or(false));
    }

    /// Deletes `evt`, keeping `instants` in lockstep with collapsed rows.
    /// The result starts with fresh (empty) forbidden memory and history,
    /// matching the reference's plain constructor call.
    pub fn delete_event(&self, evt: &Event) -> Result<MemTableau, TableauError> {
        let data = self.tableau.clear_event_markers(evt)?;
        let mut new_data = Vec::with_capacity(data.len());
        let mut new_instants = Vec::with_capacity(self.instants.len());
        for (row, instant) in data.into_iter().zip(self.instants.iter()) {
            if !Tableau::is_dead_row(&row) {
                new_data.push(row);
                new_instants.push(instant.clone());
            }
        }
        let new_tableau = Tableau::from_markers(new_data)?;
        if new_tableau.size() == 0 {
            return Err(TableauError::EmptyAfterDeletion { label: evt.label().to_string() });
        }
        Ok(MemTableau { tableau: new_tableau, instants: new_instants, forbidden: HashMap::new(), history: Vec::new() })
    }

    /// Merges `other` (which must be a singleton after the larger-itemset
    /// swap below) into `self`, returning every structurally distinct
    /// placement of its one event consistent with `self`'s forbidden
    /// memory.
    pub fn merge(&self, other: &MemTableau) -> Result<Vec<MemTableau>, MergeError> {
        if !self.check_compatibility(other) {
            return Err(MergeError::IncompatibleWidth {
                self_width: self.tableau.width(),
                other_width: other.tableau.width(),
            });
        }
        let (base, add) = if other.size() > self.size() { (other, self) } else { (self, other) };
        if add.size() != 1 {
            return Err(MergeError::NonSingleton(add.size()));
        }

        let add_events = add.events_list();
        let timeline = add_events[0].timeline() as usize;

        let mut graph = Self::generate_insertion_points(base, timeline);
        let item = other.events_list()[0].label().to_string();
        self.prune_from_memory(&item, &mut graph);
        graph.retain(|(_, ends)| !ends.is_empty());

        Self::generate_combinations(base, add, timeline, &graph)
    }

    fn prune_from_memory(&self, item: &str, graph: &mut [(InstantCode, Vec<InstantCode>)]) {
        let Some(rules) = self.forbidden.get(item) else { return };
        for (start_point, end_points) in graph.iter_mut() {
            for rule in rules {
                if rule.contains_start(start_point) {
                    end_points.retain(|ep| !rule.contains_end(ep));
                }
            }
        }
    }

    /// All (start, end) placement pairs available for inserting a new event
    /// on `timeline`, expressed as one extra trailing digit over `base`'s
    /// own instant codes — anchored (`0`) at existing rows, `5` at the
    /// midpoints between/around them.
    fn generate_insertion_points(base: &MemTableau, timeline: usize) -> Vec<(InstantCode, Vec<InstantCode>)> {
        let points = base.instants();
        let width = points[0].len();
        let width1 = width + 1;

        let updated_points: Vec<InstantCode> = points.iter().map(|p| p.anchored()).collect();
        let middle_points: Vec<InstantCode> =
            points.iter().map(|p| InstantCode::new(format!("{}5", p.as_str()))).collect();

        let starting_point = InstantCode::new(format!("{}5", "0".repeat(width)));
        let mut candidate_points = Vec::with_capacity(1 + 2 * points.len());
        candidate_points.push(starting_point);
        for (u, m) in updated_points.iter().zip(middle_points.iter()) {
            candidate_points.push(u.clone());
            candidate_points.push(m.clone());
        }

        let mut events_instants: Vec<(InstantCode, InstantCode)> =
            vec![(InstantCode::zero_sentinel_of_width(width1), InstantCode::zero_sentinel_of_width(width1))];
        let mut open: Option<InstantCode> = None;
        for (row_idx, point) in updated_points.iter().enumerate() {
            match &base.tableau.row(row_idx)[timeline] {
                Marker::Start(_) => {
                    if open.is_none() {
                        open = Some(point.clone());
                    }
                }
                Marker::End(_) => {
                    if let Some(s) = open.take() {
                        events_instants.push((s, point.clone()));
                    }
                }
                _ => {}
            }
        }
        events_instants.push((InstantCode::three_sentinel_of_width(width1), InstantCode::three_sentinel_of_width(width1)));

        let mut graph: Vec<(InstantCode, Vec<InstantCode>)> = Vec::new();
        for event in 1..events_instants.len() {
            let prev_end = events_instants[event - 1].1.clone();
            let cur_start = events_instants[event].0.clone();

            let starting_points: Vec<InstantCode> = candidate_points
                .iter()
                .filter(|p| **p >= prev_end && **p < cur_start)
                .cloned()
                .collect();
            let ending_points: Vec<InstantCode> = candidate_points
                .iter()
                .filter(|p| **p > prev_end && **p <= cur_start)
                .cloned()
                .collect();

            for sp in starting_points {
                let sp_is_mid = sp.as_str().ends_with('5');
                let ends: Vec<InstantCode> = ending_points
                    .iter()
                    .filter(|ep| (sp_is_mid && **ep >= sp) || **ep > sp)
                    .cloned()
                    .collect();
                if !ends.is_empty() {
                    graph.push((sp, ends));
                }
            }
        }
        graph
    }

    /// Materializes one `MemTableau` per (start, end) pair in `graph`,
    /// inserting filler rows from `base.gen_null` where a placement falls
    /// between two existing rows.
    ///
    /// # Errors
    /// [`MergeError::MaterializationFailed`] if any materialized matrix fails
    /// `Tableau::from_markers` validation — the reference's
    /// `_generate_combinations` builds a `memLexRepr` for every (s,e) pair
    /// unconditionally, and its constructor raises on a malformed matrix
    /// rather than skipping it, so this must propagate rather than drop.
    fn generate_combinations(
        base: &MemTableau,
        add: &MemTableau,
        timeline: usize,
        graph: &[(InstantCode, Vec<InstantCode>)],
    ) -> Result<Vec<MemTableau>, MergeError> {
        let width = base.instants[0].len();
        let mut positions = Vec::with_capacity(base.instants.len() + 2);
        positions.push(InstantCode::zero_sentinel_of_width(width));
        positions.extend(base.instants.iter().cloned());
        positions.push(InstantCode::three_sentinel_of_width(width));

        let base_data = base.tableau.rows();
        let add_label = add.events_list()[0].label().to_string();
        let add_start_cell = add.tableau.row(0)[timeline].clone();
        let add_end_cell = add.tableau.row(1)[timeline].clone();

        let mut out = Vec::new();
        for (start_point, end_points) in graph {
            let mut i_position = positions
                .iter()
                .position(|p| p.as_str() == &start_point.as_str()[..start_point.len() - 1])
                .expect("every candidate start point is derived from an existing base position");
            if i_position != 0 && !start_point.as_str().ends_with('5') {
                i_position -= 1;
            }

            for end_point in end_points {
                let mut j_position = positions
                    .iter()
                    .position(|p| p.as_str() == &end_point.as_str()[..end_point.len() - 1])
                    .expect("every candidate end point is derived from an existing base position");
                if j_position != 0 && !end_point.as_str().ends_with('5') {
                    j_position -= 1;
                }

                let mut combination: Vec<Vec<Marker>> = base_data.to_vec();
                let mut i = start_point.clone();
                let mut j = end_point.clone();

                let offset = if i.as_str().ends_with('0') {
                    0
                } else {
                    combination.insert(i_position, base.tableau.gen_null(i_position));
                    1
                };

                combination[i_position][timeline] = add_start_cell.clone();

                if !j.as_str().ends_with('0') {
                    combination.insert(j_position + offset, base.tableau.gen_null(j_position));
                }
                if !combination[j_position + offset][timeline].is_start() {
                    combination[j_position + offset][timeline] = add_end_cell.clone();
                }

                for k in (i_position + 1)..(j_position + offset) {
                    combination[k][timeline] = Marker::Interior(add_label.clone());
                }

                let mut temp_instants: Vec<InstantCode> = positions[1..positions.len() - 1].iter().map(|p| p.anchored()).collect();
                if !i.as_str().ends_with('0') {
                    i = i.with_last_digit('4');
                    temp_instants.insert(i_position, i.clone());
                }
                if !j.as_str().ends_with('0') {
                    j = j.with_last_digit('6');
                    temp_instants.insert(j_position + offset, j.clone());
                }

                let tableau = Tableau::from_markers(combination)?;
                let mut child = MemTableau {
                    tableau,
                    instants: temp_instants,
                    forbidden: HashMap::new(),
                    history: Vec::new(),
                };
                child.history.push((add_label.clone(), (i, j)));
                out.push(child);
            }
        }
        Ok(out)
    }
}
