//! # lex-apriori
//!
//! A lexical-tableau Apriori engine for mining frequent temporal itemsets
//! out of multi-timeline interval event logs.
//!
//! Each record in a dataset is a *tableau*: a matrix of marker rows (one row
//! per distinct instant, one column per timeline) spelling out, for every
//! timeline, when a labelled interval starts (`S_label`), continues
//! (`I_label`), ends (`E_label`), or is simply absent (`_`). An *instant
//! lattice* of digit-string codes lets the engine describe positions
//! strictly between two existing rows without renumbering anything, which is
//! what makes in-place Apriori-style merging of itemsets possible.
//!
//! ## Architecture
//!
//! ```text
//! Timeline intervals
//!     ↓ (timelines_to_tableau)
//! Tableau (marker matrix)
//!     ↓ (MemTableau::from_event / Tableau::events_list)
//! MemTableau (tableau + instant codes + forbidden memory)
//!     ↓ (AprioriEngine::apriori)
//! Frequent itemsets, one Vec<MemTableau> per size
//!     ↓ (AuditSink, optional)
//! SQLite log of frequent / unfrequent itemsets
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use lex_apriori::engine::AprioriEngine;
//! use lex_apriori::mem_tableau::MemTableau;
//! use lex_apriori::tableau::Tableau;
//! use lex_apriori::instant::InstantCode;
//!
//! let tableau = Tableau::from_raw(vec![
//!     vec!["S_a".to_string()],
//!     vec!["E_a".to_string()],
//! ])?;
//! let instants = vec![InstantCode::new("1".to_string()), InstantCode::new("2".to_string())];
//! let record = MemTableau::new(tableau, instants)?;
//!
//! let mut engine = AprioriEngine::new(vec![record], 0.5);
//! let frequent = engine.apriori()?;
//! println!("singletons found: {}", frequent.get(&1).map_or(0, Vec::len));
//! # Ok::<(), lex_apriori::error::Error>(())
//! ```
//!
//! ## Key Principles
//!
//! - **Lexical, not numeric**: instant codes are ordered strings, not
//!   timestamps, so a new interstitial position can always be minted between
//!   two existing ones.
//! - **Downward closure with memory**: every candidate itemset must have all
//!   of its one-event-smaller subsets already known frequent; the positions
//!   that subset's own growth would have produced are remembered in a
//!   per-label forbidden map so the search never regenerates them.
//! - **Support by subsequence containment**: an itemset is supported by a
//!   dataset record when its marker rows appear, in order, as a subsequence
//!   of the record's rows — no numeric timestamp arithmetic involved.

pub mod audit;
pub mod engine;
pub mod error;
pub mod event;
pub mod instant;
pub mod marker;
pub mod mem_tableau;
pub mod preprocessor;
pub mod tableau;

pub use audit::{AuditSink, SinkTable, SqliteAuditSink};
pub use engine::{AprioriEngine, EngineState};
pub use error::{Error, Result};
pub use event::Event;
pub use instant::{BoundRange, ForbiddenInterval, InstantCode};
pub use marker::Marker;
pub use mem_tableau::{ForbiddenMap, MemTableau};
pub use preprocessor::{timelines_to_tableau, TimelineRecord};
pub use tableau::Tableau;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        let event = Event::new(0, "a", 0, 1).unwrap();
        let tableau = Tableau::from_event(&event, 1);
        let record = MemTableau::new(tableau, vec![InstantCode::new("1".into()), InstantCode::new("2".into())]).unwrap();
        let mut engine = AprioriEngine::new(vec![record], 0.5);
        assert_eq!(engine.state(), EngineState::Init);
        assert!(engine.apriori().is_ok());
    }
}
