//! Listed-option directory lookup (spec.md §6 supplemental feature,
//! grounded on the original's `fh_opra_lo.c`/`fh_opra_lo.h` listed-options
//! reference table).
//!
//! The directory answers one question: given a root symbol, is it a
//! currently-listed option series, and if so what static attributes does
//! it carry (underlying exchange, multiplier, expiration calendar hints)?
//! The feed handler core only consults it to decide whether category
//! `Y`/`f` records need a fallback multiplier when the wire record omits
//! one; it never owns the directory's refresh lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

/// Static attributes for one listed root symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedOptionRecord {
    pub root: String,
    pub underlying: String,
    pub multiplier: u32,
    pub exchange: String,
}

impl ListedOptionRecord {
    pub fn new(root: impl Into<String>, underlying: impl Into<String>, multiplier: u32, exchange: impl Into<String>) -> Self {
        ListedOptionRecord {
            root: root.into(),
            underlying: underlying.into(),
            multiplier,
            exchange: exchange.into(),
        }
    }
}

/// Collaborator the processor consults for static per-root attributes.
/// Implementations typically wrap a periodically-refreshed snapshot
/// loaded from an external reference-data feed; the core only reads.
pub trait ListedOptionDirectory {
    fn lookup(&self, root: &str) -> Option<Arc<ListedOptionRecord>>;
}

/// An empty directory: every lookup misses. Default multiplier handling
/// in the processor falls back to the OPRA-standard 100.
#[derive(Debug, Default)]
pub struct EmptyDirectory;

impl ListedOptionDirectory for EmptyDirectory {
    fn lookup(&self, _root: &str) -> Option<Arc<ListedOptionRecord>> {
        None
    }
}

/// An in-memory directory, suitable for tests or for a process that
/// loads its full reference set once at start-of-day.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, Arc<ListedOptionRecord>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        StaticDirectory { entries: HashMap::new() }
    }

    pub fn insert(&mut self, record: ListedOptionRecord) {
        self.entries.insert(record.root.clone(), Arc::new(record));
    }
}

impl ListedOptionDirectory for StaticDirectory {
    fn lookup(&self, root: &str) -> Option<Arc<ListedOptionRecord>> {
        self.entries.get(root).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_always_misses() {
        let d = EmptyDirectory;
        assert!(d.lookup("ABCDE").is_none());
    }

    #[test]
    fn static_directory_round_trips_an_entry() {
        let mut d = StaticDirectory::new();
        d.insert(ListedOptionRecord::new("ABCDE", "ABC", 100, "XCBO"));
        let rec = d.lookup("ABCDE").expect("inserted root should resolve");
        assert_eq!(rec.multiplier, 100);
        assert_eq!(rec.underlying, "ABC");
    }

    #[test]
    fn unknown_root_misses() {
        let d = StaticDirectory::new();
        assert!(d.lookup("ZZZZZ").is_none());
    }
}
