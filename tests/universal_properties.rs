//! Property-based checks for invariants that must hold across every
//! [`MemTableau`]/[`Tableau`] ever constructed, not just the handful of
//! fixed examples colocated with each module. Strategies are generated
//! inline, the way the reference crate's own `proptest` suites do it under
//! `tests/`.

use proptest::prelude::*;

use lex_apriori::engine::AprioriEngine;
use lex_apriori::event::Event;
use lex_apriori::instant::{BoundRange, ForbiddenInterval};
use lex_apriori::mem_tableau::{ForbiddenMap, MemTableau};

fn an_event_label() -> impl Strategy<Value = String> {
    "[a-e]"
}

fn an_event() -> impl Strategy<Value = (u32, String, i64, i64)> {
    (0u32..3, an_event_label(), 0i64..5).prop_flat_map(|(timeline, label, start)| {
        (start + 1..start + 6).prop_map(move |end| (timeline, label.clone(), start, end))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A singleton built from any valid event contains itself and is fully
    /// supported by a one-record dataset consisting of only itself.
    #[test]
    fn prop_singleton_contains_itself_and_is_fully_supported((timeline, label, start, end) in an_event()) {
        let event = Event::new(timeline, label.clone(), start, end).unwrap();
        let singleton = MemTableau::from_event(&event, (timeline + 1) as usize);
        prop_assert!(singleton.contains(&singleton));

        let mut engine = AprioriEngine::new(vec![singleton.clone()], 0.5);
        prop_assert!((engine.support(&singleton) - 1.0).abs() < 1e-9);
        prop_assert!(engine.apriori().is_ok());
    }

    /// `del_null` never changes the tableau it's applied to twice in a row,
    /// and it never changes the instant/row count relationship.
    #[test]
    fn prop_del_null_is_idempotent((timeline, label, start, end) in an_event()) {
        let event = Event::new(timeline, label.clone(), start, end).unwrap();
        let mut singleton = MemTableau::from_event(&event, (timeline + 1) as usize);

        singleton.del_null();
        let once = singleton.clone();
        singleton.del_null();

        prop_assert_eq!(once, singleton.clone());
        prop_assert_eq!(singleton.instants().len(), singleton.tableau().height());
    }

    /// Merging two singletons on distinct timelines always yields at least
    /// one candidate, and every candidate contains both original events.
    #[test]
    fn prop_merge_of_distinct_timeline_singletons_preserves_both_events(
        (t1, l1, s1, e1) in an_event(),
        label2 in an_event_label(),
        s2 in 0i64..5,
    ) {
        let e2 = s2 + 1;
        prop_assume!(label2 != l1);
        let total = (t1 + 2) as usize;
        let event1 = Event::new(t1, l1.clone(), s1, e1).unwrap();
        let event2 = Event::new(t1 + 1, label2.clone(), s2, e2).unwrap();

        let base = MemTableau::from_event(&event1, total);
        let addend = MemTableau::from_event(&event2, total);

        let candidates = base.merge(&addend).unwrap();
        prop_assert!(!candidates.is_empty());
        for candidate in &candidates {
            prop_assert_eq!(candidate.size(), 2);
            prop_assert!(candidate.contains(&base));
            prop_assert!(candidate.contains(&addend));
            prop_assert_eq!(candidate.instants().len(), candidate.tableau().height());
        }
    }

    /// Deleting an event from a merged pair always restores something
    /// structurally equal to one of the two original singletons, and the
    /// instant/row lockstep invariant survives the deletion.
    #[test]
    fn prop_delete_event_on_a_merge_round_trips_to_a_singleton(
        (t1, l1, s1, e1) in an_event(),
        label2 in an_event_label(),
        s2 in 0i64..5,
    ) {
        let e2 = s2 + 1;
        prop_assume!(label2 != l1);
        let total = (t1 + 2) as usize;
        let event1 = Event::new(t1, l1.clone(), s1, e1).unwrap();
        let event2 = Event::new(t1 + 1, label2.clone(), s2, e2).unwrap();

        let base = MemTableau::from_event(&event1, total);
        let addend = MemTableau::from_event(&event2, total);
        let candidates = base.merge(&addend).unwrap();

        for candidate in &candidates {
            for event in candidate.events_list() {
                let reduced = candidate.delete_event(&event).unwrap();
                prop_assert_eq!(reduced.size(), 1);
                prop_assert_eq!(reduced.instants().len(), reduced.tableau().height());
                prop_assert!(reduced == base || reduced == addend);
            }
        }
    }

    /// Forbidden soundness (spec.md §8): after merge, no emitted candidate
    /// has an (s,e) placement for a label covered by a forbidden interval
    /// already present in the parent at merge time. Take any placement a
    /// first merge actually produces, register it as forbidden on a clone
    /// of the parent (as backing would via `as_forbidden`/`add_forbidden`),
    /// and re-merge: that exact (label, s, e) placement must never reappear.
    #[test]
    fn prop_merge_never_regenerates_a_forbidden_placement(
        (timeline, label, start, end) in an_event(),
        add_start in 0i64..5,
    ) {
        let add_end = add_start + 1;
        let total = (timeline + 1) as usize;
        let base_event = Event::new(timeline, label.clone(), start, end).unwrap();
        let addend_event = Event::new(timeline, label.clone(), add_start, add_end).unwrap();

        let base = MemTableau::from_event(&base_event, total);
        let addend = MemTableau::from_event(&addend_event, total);

        let candidates = base.merge(&addend).unwrap();
        prop_assume!(!candidates.is_empty());

        let (forbidden_label, (s, e)) = candidates[0].history().last().unwrap().clone();

        let mut base_with_memory = base.clone();
        let mut rule_map: ForbiddenMap = ForbiddenMap::new();
        rule_map.insert(
            forbidden_label.clone(),
            vec![ForbiddenInterval::new(BoundRange::Single(s.clone()), BoundRange::Single(e.clone()))],
        );
        base_with_memory.add_forbidden(rule_map);

        let pruned = base_with_memory.merge(&addend).unwrap();
        for candidate in &pruned {
            let (l, (cs, ce)) = candidate.history().last().unwrap();
            prop_assert!(!(l == &forbidden_label && cs == &s && ce == &e));
        }
    }

    /// Support never increases when an event is deleted from an itemset:
    /// a shorter itemset is contained at least wherever the longer one was.
    #[test]
    fn prop_support_is_monotone_under_event_deletion(
        (t1, l1, s1, e1) in an_event(),
        label2 in an_event_label(),
        s2 in 0i64..5,
    ) {
        let e2 = s2 + 1;
        prop_assume!(label2 != l1);
        let total = (t1 + 2) as usize;
        let event1 = Event::new(t1, l1.clone(), s1, e1).unwrap();
        let event2 = Event::new(t1 + 1, label2.clone(), s2, e2).unwrap();

        let base = MemTableau::from_event(&event1, total);
        let addend = MemTableau::from_event(&event2, total);
        let candidates = base.merge(&addend).unwrap();
        let Some(candidate) = candidates.into_iter().next() else { return Ok(()) };

        let dataset = vec![candidate.clone()];
        let engine = AprioriEngine::new(dataset, 0.0);

        let full_support = engine.support(&candidate);
        for event in candidate.events_list() {
            let reduced = candidate.delete_event(&event).unwrap();
            prop_assert!(engine.support(&reduced) >= full_support);
        }
    }
}

/// Not a property, but the standard "well-formed empty tableau" edge case:
/// an engine with zero records never divides by zero.
#[test]
fn empty_dataset_apriori_runs_to_completion() {
    let mut engine: AprioriEngine = AprioriEngine::new(Vec::new(), 0.5);
    let frequent = engine.apriori().unwrap();
    assert!(frequent.is_empty() || frequent.values().all(Vec::is_empty));
}
