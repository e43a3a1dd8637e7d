//! End-to-end Apriori scenarios from the design's §8 "Concrete scenarios"
//! list, exercised through the public API the way a downstream consumer
//! would: build a dataset of [`MemTableau`] records, run [`AprioriEngine`],
//! inspect the frequent map.

use lex_apriori::audit::SqliteAuditSink;
use lex_apriori::engine::AprioriEngine;
use lex_apriori::instant::InstantCode;
use lex_apriori::mem_tableau::MemTableau;
use lex_apriori::tableau::Tableau;

fn mem_from_raw(rows: &[&[&str]]) -> MemTableau {
    let data: Vec<Vec<String>> = rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect();
    let tableau = Tableau::from_raw(data).unwrap();
    let height = tableau.height();
    let instants: Vec<InstantCode> = (1..=height).map(|i| InstantCode::new(i.to_string())).collect();
    MemTableau::new(tableau, instants).unwrap()
}

fn scenario_1_row() -> MemTableau {
    mem_from_raw(&[&["S_a", "_", "_"], &["_", "S_b", "_"], &["_", "_", "S_c"], &["_", "_", "E_c"]])
}

/// Scenario 1: three copies of `[[S_a],[S_b],[S_c],[E_c]]`, ε=0.5: frequent
/// sizes must be |1|=3, |2|=3, |3|=1, with the size-3 element equal to the
/// dataset row itself.
#[test]
fn scenario_1_three_identical_three_timeline_records() {
    let dataset = vec![scenario_1_row(), scenario_1_row(), scenario_1_row()];
    let mut engine = AprioriEngine::new(dataset, 0.5);
    let frequent = engine.apriori().unwrap();

    assert_eq!(frequent.get(&1).map(Vec::len), Some(3));
    assert_eq!(frequent.get(&2).map(Vec::len), Some(3));
    assert_eq!(frequent.get(&3).map(Vec::len), Some(1));
    assert!(frequent.get(&4).is_none());

    let size3 = &frequent[&3];
    assert!(size3.iter().any(|itemset| itemset == &scenario_1_row()));
}

/// Scenario 2: two copies of `[[S_a,S_b],[E_a,E_b]]`, ε=0.5: frequent[1] has
/// the two singletons for `a` and `b` on their respective timelines;
/// frequent[2] contains exactly one itemset where `a` and `b` co-occur with
/// equal start and end.
#[test]
fn scenario_2_two_identical_synchronized_records() {
    let row = || mem_from_raw(&[&["S_a", "S_b"], &["E_a", "E_b"]]);
    let dataset = vec![row(), row()];
    let mut engine = AprioriEngine::new(dataset, 0.5);
    let frequent = engine.apriori().unwrap();

    assert_eq!(frequent.get(&1).map(Vec::len), Some(2));
    assert_eq!(frequent.get(&2).map(Vec::len), Some(1));
    assert!(frequent[&2].iter().any(|itemset| itemset == &row()));
}

/// Scenario 5: enabling the audit sink on scenario 1 writes exactly
/// |frequent[1]| + |frequent[2]| + |frequent[3]| rows to `frequent_itemsets`,
/// and none to `unfrequent_itemsets` when `save_all` is off.
#[test]
fn scenario_5_audit_sink_row_counts() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scenario5.sqlite");
    let sink = SqliteAuditSink::create(&db_path, false).unwrap();

    let dataset = vec![scenario_1_row(), scenario_1_row(), scenario_1_row()];
    let mut engine = AprioriEngine::new(dataset, 0.5).with_sink(Box::new(sink));
    let frequent = engine.apriori().unwrap();

    let expected_rows: usize = frequent.values().map(Vec::len).sum();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let frequent_rows: i64 = conn.query_row("SELECT COUNT(*) FROM frequent_itemsets", [], |r| r.get(0)).unwrap();
    let unfrequent_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM unfrequent_itemsets", [], |r| r.get(0)).unwrap();

    assert_eq!(frequent_rows as usize, expected_rows);
    assert_eq!(unfrequent_rows, 0);
}
