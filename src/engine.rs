//! The Apriori engine: singlet extraction, candidate generation,
//! downward-closure backing with forbidden-interval rewriting, and support
//! measurement, with an optional audit sink.
//!
//! Candidate generation and support checking run as two separate passes:
//! generation mutates each backing (k-1)-subset's forbidden memory in place
//! as candidates are produced, so later candidates in the same size see
//! rules written by earlier ones, while the support pass that follows is a
//! pure measure-and-log step with no further memory writes.

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;
use std::collections::HashSet;

use crate::audit::{AuditSink, SinkTable};
use crate::error::{EngineError, Error};
use crate::event::Event;
use crate::instant::{BoundRange, ForbiddenInterval, InstantCode};
use crate::mem_tableau::{ForbiddenMap, MemTableau};

/// Tracks the engine's run state explicitly: each `apriori()` call asserts
/// the current state before advancing it. The public API exposes only
/// `apriori()`, so `InvalidTransition` is unreachable except by calling
/// `apriori()` twice on the same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    SingletsExtracted,
    Size(usize),
    Done,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Init => write!(f, "Init"),
            EngineState::SingletsExtracted => write!(f, "SingletsExtracted"),
            EngineState::Size(k) => write!(f, "Size({k})"),
            EngineState::Done => write!(f, "Done"),
        }
    }
}

/// The lexical-tableau Apriori engine: mines frequent interval-itemsets out
/// of `dataset` at minimum support `epsilon`.
pub struct AprioriEngine {
    dataset: Vec<MemTableau>,
    epsilon: f64,
    cut_solutions: HashSet<MemTableau>,
    sink: Option<Box<dyn AuditSink>>,
    state: EngineState,
}

impl AprioriEngine {
    pub fn new(dataset: Vec<MemTableau>, epsilon: f64) -> Self {
        AprioriEngine {
            dataset,
            epsilon,
            cut_solutions: HashSet::new(),
            sink: None,
            state: EngineState::Init,
        }
    }

    /// A denylist of itemsets pruned before support evaluation, at every
    /// size (singlet extraction and candidate generation alike).
    pub fn with_cut_solutions(mut self, cut_solutions: impl IntoIterator<Item = MemTableau>) -> Self {
        self.cut_solutions = cut_solutions.into_iter().collect();
        self
    }

    /// Attaches an optional audit sink that records every measured
    /// candidate, frequent or not, as it is discovered.
    pub fn with_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// support(I) = |{ R in dataset : I in R }| / |dataset|.
    pub fn support(&self, itemset: &MemTableau) -> f64 {
        if self.dataset.is_empty() {
            return 0.0;
        }
        let hits = self.dataset.iter().filter(|record| record.contains(itemset)).count();
        hits as f64 / self.dataset.len() as f64
    }

    /// Runs the full Apriori loop: extract singlets, then repeatedly
    /// generate and back candidates of the next size until a size yields no
    /// frequent itemsets. Returns every frequent size's itemsets.
    pub fn apriori(&mut self) -> Result<BTreeMap<usize, Vec<MemTableau>>, Error> {
        if self.state != EngineState::Init {
            return Err(EngineError::InvalidTransition {
                from: self.state.to_string(),
                to: EngineState::SingletsExtracted.to_string(),
            }
            .into());
        }

        tracing::info!(records = self.dataset.len(), epsilon = self.epsilon, "starting apriori run");

        let singlets = self.extract_singlets();
        self.state = EngineState::SingletsExtracted;
        tracing::debug!(count = singlets.len(), "extracted singlets");

        let mut frequent: BTreeMap<usize, Vec<MemTableau>> = BTreeMap::new();
        let mut freq1 = Vec::with_capacity(singlets.len());
        for itemset in &singlets {
            let supp = self.support(itemset);
            if supp >= self.epsilon {
                self.record_sink(SinkTable::Frequent, itemset, supp)?;
                freq1.push(itemset.clone());
            } else {
                self.record_sink(SinkTable::Unfrequent, itemset, supp)?;
            }
        }
        tracing::debug!(size = 1, frequent = freq1.len(), "size 1 complete");
        frequent.insert(1, freq1.clone());

        let mut k = 1;
        let mut prev_frequent = freq1;
        while !prev_frequent.is_empty() {
            k += 1;
            self.state = EngineState::Size(k);
            let singles = frequent.get(&1).cloned().unwrap_or_default();

            let groups = self.generate_next(&mut prev_frequent, &singles)?;
            let freq_k = self.check_group_support(groups)?;
            tracing::debug!(size = k, frequent = freq_k.len(), "size complete");

            if freq_k.is_empty() {
                break;
            }
            frequent.insert(k, freq_k.clone());
            prev_frequent = freq_k;
        }

        self.state = EngineState::Done;
        Ok(frequent)
    }

    /// One [`MemTableau`] per distinct event across the whole dataset,
    /// deduplicated structurally and filtered against cut_solutions.
    fn extract_singlets(&self) -> Vec<MemTableau> {
        let mut out: Vec<MemTableau> = Vec::new();
        for record in &self.dataset {
            let width = record.tableau().width();
            for event in record.events_list() {
                let candidate = MemTableau::from_event(&event, width);
                if self.cut_solutions.contains(&candidate) {
                    continue;
                }
                if !out.iter().any(|existing| existing == &candidate) {
                    out.push(candidate);
                }
            }
        }
        out
    }

    fn record_sink(&mut self, table: SinkTable, itemset: &MemTableau, support: f64) -> Result<(), Error> {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(table, itemset, support)?;
        }
        Ok(())
    }

    /// For every (X, Y) pair with X in `prev_frequent` and Y in `singles`,
    /// merges X and Y, dedups the raw merge result, drops unreasonable or
    /// cut candidates, and keeps the survivors as one group.
    ///
    /// `prev_frequent` is mutated in place by the backing pass
    /// (`check_reasonable`) as candidates are processed, so later (X, Y)
    /// pairs in this same call see forbidden rules written by earlier ones.
    /// This is the one place forbidden memory propagates live during a
    /// single Apriori size.
    fn generate_next(
        &mut self,
        prev_frequent: &mut Vec<MemTableau>,
        singles: &[MemTableau],
    ) -> Result<Vec<Vec<MemTableau>>, Error> {
        let mut next_size: Vec<Vec<MemTableau>> = Vec::new();

        for x_index in 0..prev_frequent.len() {
            let base = prev_frequent[x_index].clone();
            for y in singles {
                let raw = base.merge(y)?;

                let mut known: Vec<MemTableau> = Vec::new();
                for mut candidate in raw {
                    if known.iter().any(|k| k == &candidate) {
                        continue;
                    }
                    // `check_reasonable` runs unconditionally for every non-duplicate
                    // candidate, cut_solutions or not, matching `_generate_next`'s
                    // `not self._check_reasonable(candidate) or (... cut check ...)`:
                    // the backing side effects (forward/backward forbidden-rewrite
                    // into the matched (k-1) parent) must land even for candidates
                    // that are about to be cut.
                    if !Self::check_reasonable(&mut candidate, prev_frequent)? {
                        continue;
                    }
                    if self.cut_solutions.contains(&candidate) {
                        continue;
                    }
                    known.push(candidate);
                }
                if !known.is_empty() {
                    next_size.push(known);
                }
            }
        }

        Ok(next_size)
    }

    /// §4.5.1: true iff every (k-1)-subset of `candidate` (obtained by
    /// deleting one event at a time) equals some element of `prev_frequent`.
    /// As a side effect of finding each match M, rewrites M's forbidden
    /// rules into `candidate`'s coordinates (forward pass) and registers a
    /// new forbidden rule in M reflecting the removed event's own placement
    /// (backward pass), exactly as `_check_reasonable` does.
    fn check_reasonable(candidate: &mut MemTableau, prev_frequent: &mut [MemTableau]) -> Result<bool, Error> {
        for event in candidate.events_list() {
            let subset = match candidate.delete_event(&event) {
                Ok(s) => s,
                Err(_) => return Ok(false),
            };

            let mut match_index = None;
            let mut match_count = 0usize;
            for (idx, m) in prev_frequent.iter().enumerate() {
                if m == &subset {
                    match_count += 1;
                    match_index = Some(idx);
                }
            }
            if match_count > 1 {
                return Err(EngineError::DuplicateBackingMatch { count: match_count }.into());
            }
            let Some(idx) = match_index else { return Ok(false) };

            let match_instants = prev_frequent[idx].instants().to_vec();
            let match_forbidden = prev_frequent[idx].forbidden().clone();

            let forward = rewrite_forbidden_map(&match_forbidden, &match_instants, subset.instants());
            candidate.add_forbidden(forward);

            if let Some(backward) = backward_pass_rule(candidate, &subset, &match_instants, &event) {
                prev_frequent[idx].add_forbidden(backward);
            }
        }
        Ok(true)
    }

    /// §4.5 step 3c: measures support for every candidate in every group,
    /// splitting frequent from unfrequent and recording both to the sink.
    /// Matches `_check_group_support`: a separate full pass after
    /// `generate_next`, with no further forbidden-memory writes (those all
    /// happened already, during backing).
    fn check_group_support(&mut self, groups: Vec<Vec<MemTableau>>) -> Result<Vec<MemTableau>, Error> {
        let mut frequent = Vec::new();
        for group in groups {
            for candidate in group {
                let supp = self.support(&candidate);
                if supp < self.epsilon {
                    self.record_sink(SinkTable::Unfrequent, &candidate, supp)?;
                } else {
                    self.record_sink(SinkTable::Frequent, &candidate, supp)?;
                    if !frequent.iter().any(|f: &MemTableau| f == &candidate) {
                        frequent.push(candidate);
                    }
                }
            }
        }
        Ok(frequent)
    }
}

/// Forward pass: rewrites every forbidden rule held by a (k-1)-subset match
/// `M` into a candidate's own instant coordinates, per §4.5.1. `m_instants`
/// is `M`'s instant list; `subset_instants` is the (k-1)-subset's instant
/// list, which shares `M`'s row positions (it was built by deleting one
/// event's rows from the full candidate) but names them in the *candidate's*
/// own coordinate system.
fn rewrite_forbidden_map(
    forbidden: &ForbiddenMap,
    m_instants: &[InstantCode],
    subset_instants: &[InstantCode],
) -> ForbiddenMap {
    let mut out: ForbiddenMap = HashMap::new();
    for (label, rules) in forbidden {
        let rewritten: Vec<ForbiddenInterval> = rules
            .iter()
            .map(|rule| {
                ForbiddenInterval::new(
                    rewrite_bound(&rule.start, m_instants, subset_instants),
                    rewrite_bound(&rule.end, m_instants, subset_instants),
                )
            })
            .collect();
        out.insert(label.clone(), rewritten);
    }
    out
}

fn rewrite_bound(bound: &BoundRange, m_instants: &[InstantCode], subset_instants: &[InstantCode]) -> BoundRange {
    match bound {
        BoundRange::Single(a) => BoundRange::Single(rewrite_code(a, m_instants, subset_instants)),
        BoundRange::Range(a, b) => BoundRange::Range(
            rewrite_code(a, m_instants, subset_instants),
            rewrite_code(b, m_instants, subset_instants),
        ),
    }
}

fn rewrite_code(code: &InstantCode, m_instants: &[InstantCode], subset_instants: &[InstantCode]) -> InstantCode {
    let width = subset_instants.first().map(|i| i.len()).unwrap_or(code.len());
    if code.is_zero_pattern() {
        return InstantCode::zero_sentinel_of_width(width);
    }
    if code.is_three_pattern() {
        return InstantCode::three_sentinel_of_width(width);
    }
    match m_instants.iter().position(|c| c == code) {
        Some(pos) if pos < subset_instants.len() => subset_instants[pos].clone(),
        _ => code.clone(),
    }
}

/// Backward pass: builds the forbidden rule that must be registered into `M`
/// (the matched (k-1)-subset) so that a future merge revisiting `M` skips
/// regenerating this exact placement of `event`. Mirrors `_check_reasonable`'s
/// backward pass, including its boundary handling when `event`'s start/end
/// row does not survive into `subset` (the row was only alive because of
/// `event` itself, or coincided with a row that died for an unrelated
/// reason — in which case this returns `None` instead of the reference's
/// unguarded index lookup, skipping the memoization rather than panicking).
fn backward_pass_rule(
    candidate: &MemTableau,
    subset: &MemTableau,
    match_instants: &[InstantCode],
    event: &Event,
) -> Option<ForbiddenMap> {
    let width = match_instants.first()?.len();
    let start_row = event.start() as usize;
    let end_row = event.end() as usize;

    let start_parts = resolve_boundary(
        candidate.instants().get(start_row)?,
        start_row,
        candidate.instants(),
        subset.instants(),
        match_instants,
        width,
        true,
    )?;
    let end_parts = resolve_boundary(
        candidate.instants().get(end_row)?,
        end_row,
        candidate.instants(),
        subset.instants(),
        match_instants,
        width,
        false,
    )?;

    let mut map = HashMap::new();
    map.insert(
        event.label().to_string(),
        vec![ForbiddenInterval::new(parts_to_bound(start_parts), parts_to_bound(end_parts))],
    );
    Some(map)
}

fn parts_to_bound(parts: (InstantCode, Option<InstantCode>)) -> BoundRange {
    match parts {
        (a, None) => BoundRange::Single(a),
        (a, Some(b)) => BoundRange::Range(a, b),
    }
}

/// Resolves one side (start/end) of the backward-pass rule for a row that
/// may or may not survive deletion of the owning event, per
/// `_check_reasonable`'s try/except-ValueError structure. `is_start`
/// selects between the "look left" (start) and "look right" (end) boundary
/// conventions the reference uses when the row in question doesn't survive.
#[allow(clippy::too_many_arguments)]
fn resolve_boundary(
    target: &InstantCode,
    row: usize,
    candidate_instants: &[InstantCode],
    subset_instants: &[InstantCode],
    match_instants: &[InstantCode],
    width: usize,
    is_start: bool,
) -> Option<(InstantCode, Option<InstantCode>)> {
    if let Some(idx) = subset_instants.iter().position(|c| c == target) {
        return match_instants.get(idx).map(|code| (code.clone(), None));
    }

    if is_start {
        if row == 0 {
            return Some((InstantCode::zero_sentinel_of_width(width), match_instants.first().cloned()));
        }
        let previous = candidate_instants.get(row - 1)?;
        let previous_idx = subset_instants.iter().position(|c| c == previous)?;
        let first = match_instants.get(previous_idx)?.clone();
        if previous_idx == subset_instants.len() - 1 {
            Some((first, Some(InstantCode::three_sentinel_of_width(width))))
        } else {
            Some((first, match_instants.get(previous_idx + 1).cloned()))
        }
    } else {
        if row == candidate_instants.len() - 1 {
            return Some((match_instants.last()?.clone(), Some(InstantCode::three_sentinel_of_width(width))));
        }
        let next = candidate_instants.get(row + 1)?;
        let next_idx = subset_instants.iter().position(|c| c == next)?;
        if next_idx == 0 {
            Some((InstantCode::zero_sentinel_of_width(width), match_instants.first().cloned()))
        } else {
            Some((match_instants.get(next_idx - 1)?.clone(), match_instants.get(next_idx).cloned()))
        }
    }
}
