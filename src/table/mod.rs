//! C1: the option table — a handle-stable map from [`OptionKey`] to
//! [`OptionEntry`], as specified in spec.md §4.1.

pub mod arena;
pub mod entry;
pub mod key;

use crate::error::WireError;
use crate::listed::ListedOptionDirectory;
use arena::Arena;
pub use entry::{OptionEntry, OptionHandle, UpdateFlags, PRICE_SCALE};
pub use key::OptionKey;
use key::mix_hash;
use tracing::warn;

/// `count`, `capacity`, and byte footprint of the arena, per spec.md §4.1's
/// `stats()` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub count: usize,
    pub capacity: usize,
    pub bytes: usize,
}

const END: u32 = u32::MAX;
/// Log a utilization warning this often once above 90% (spec.md §4.1).
const UTIL_WARN_EVERY: u64 = 10_000;

/// Open-addressing-free hash index with external chaining onto a
/// [`Arena<OptionEntry>`] (spec.md §4.1 "Design"/"Hashing"). The table
/// owns the arena exclusively; FT-line structures only ever hold handles
/// into it (spec.md §3 "Ownership").
pub struct OptionTable {
    arena: Arena<OptionEntry>,
    buckets: Vec<u32>,
    /// Parallel to the arena: `chain_next[handle] = next handle in the
    /// same bucket, or `END`.
    chain_next: Vec<u32>,
    /// Side-table replacing the original's intrusive per-FT-line linked
    /// list (spec.md §9 redesign note).
    ftline_members: Vec<Vec<OptionHandle>>,
    insert_count: u64,
    warned_at: u64,
}

impl OptionTable {
    /// `capacity` is `table_size` from configuration; `num_lines` sizes the
    /// FT-line side table.
    pub fn new(capacity: usize, num_lines: u16) -> Self {
        let bucket_count = (capacity.max(1)).next_power_of_two();
        OptionTable {
            arena: Arena::with_capacity(capacity),
            buckets: vec![END; bucket_count],
            chain_next: Vec::with_capacity(capacity),
            ftline_members: vec![Vec::new(); num_lines as usize],
            insert_count: 0,
            warned_at: 0,
        }
    }

    fn bucket_index(&self, key: &OptionKey) -> usize {
        (mix_hash(key) as usize) & (self.buckets.len() - 1)
    }

    /// O(1) expected; never mutates; the returned handle is valid forever
    /// once it resolves (spec.md §4.1 "pointer stability").
    pub fn lookup(&self, key: &OptionKey) -> Option<OptionHandle> {
        let mut cur = self.buckets[self.bucket_index(key)];
        while cur != END {
            let h = OptionHandle(cur);
            let entry = self.arena.get(h);
            if entry.key == *key {
                return Some(h);
            }
            cur = self.chain_next[cur as usize];
        }
        None
    }

    /// Inserts a new, zero-initialized entry for `key`, enrolling it into
    /// `ftline`'s member list and resolving its listed-option directory
    /// back-reference (spec.md §3 "a reference to a listed option directory
    /// entry, shared, immutable for the process lifetime"). Fails with
    /// [`WireError::DuplicateKey`] if the key already exists, or
    /// [`WireError::TableExhausted`] if the slab is full (spec.md §4.1
    /// "Failure modes" — a configuration error, propagated to the caller so
    /// the packet can be dropped).
    pub fn insert(
        &mut self,
        key: OptionKey,
        ftline: u16,
        topic: String,
        directory: &dyn ListedOptionDirectory,
    ) -> Result<OptionHandle, WireError> {
        if self.lookup(&key).is_some() {
            return Err(WireError::DuplicateKey);
        }
        let mut entry = OptionEntry::new(key, ftline, topic);
        entry.listed = directory.lookup(key.root_str());
        let handle = self
            .arena
            .insert(entry)
            .ok_or(WireError::TableExhausted)?;
        self.chain_next.push(END);
        let bucket = self.bucket_index(&key);
        self.chain_next[handle.0 as usize] = self.buckets[bucket];
        self.buckets[bucket] = handle.0;
        if let Some(members) = self.ftline_members.get_mut(ftline as usize) {
            members.push(handle);
        }

        self.insert_count += 1;
        let stats = self.stats();
        if stats.capacity > 0 {
            let pct = (stats.count * 100) / stats.capacity;
            if pct >= 90 && self.insert_count - self.warned_at >= UTIL_WARN_EVERY {
                warn!(count = stats.count, capacity = stats.capacity, "option table above 90% utilization");
                self.warned_at = self.insert_count;
            }
        }
        Ok(handle)
    }

    pub fn get(&self, handle: OptionHandle) -> &OptionEntry {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: OptionHandle) -> &mut OptionEntry {
        self.arena.get_mut(handle)
    }

    /// All options assigned to `ftline`, in insertion order.
    pub fn members_of(&self, ftline: u16) -> &[OptionHandle] {
        self.ftline_members
            .get(ftline as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            count: self.arena.len(),
            capacity: self.arena.capacity(),
            bytes: self.arena.bytes_used(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listed::{EmptyDirectory, ListedOptionRecord, StaticDirectory};

    fn key(root: &[u8; 5], strike: u32) -> OptionKey {
        OptionKey::new(root, 25, 1, 17, b'C', b'N', strike, 0)
    }

    #[test]
    fn insert_then_lookup_resolves_same_handle() {
        let mut t = OptionTable::new(16, 4);
        let k = key(b"MSFT\0", 300);
        let h = t.insert(k, 1, "t".into(), &EmptyDirectory).unwrap();
        assert_eq!(t.lookup(&k), Some(h));
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut t = OptionTable::new(16, 4);
        let k = key(b"MSFT\0", 300);
        t.insert(k, 1, "t".into(), &EmptyDirectory).unwrap();
        assert!(matches!(t.insert(k, 1, "t".into(), &EmptyDirectory), Err(WireError::DuplicateKey)));
    }

    #[test]
    fn exhaustion_is_reported_not_silently_dropped() {
        let mut t = OptionTable::new(1, 1);
        t.insert(key(b"AAA\0\0", 1), 0, "a".into(), &EmptyDirectory).unwrap();
        let res = t.insert(key(b"BBB\0\0", 1), 0, "b".into(), &EmptyDirectory);
        assert!(matches!(res, Err(WireError::TableExhausted)));
    }

    #[test]
    fn entry_pointer_is_stable_across_further_inserts() {
        let mut t = OptionTable::new(64, 4);
        let k0 = key(b"AAA\0\0", 1);
        let h0 = t.insert(k0, 0, "a".into(), &EmptyDirectory).unwrap();
        t.get_mut(h0).cum_volume = 42;
        for i in 1..50u32 {
            let mut root = *b"ZZZZ\0";
            root[4] = (b'0' + (i % 10) as u8).max(1);
            t.insert(key(&root, i), 0, format!("z{i}"), &EmptyDirectory).unwrap();
        }
        assert_eq!(t.get(h0).cum_volume, 42);
    }

    #[test]
    fn ftline_membership_side_table_tracks_assignment() {
        let mut t = OptionTable::new(16, 4);
        let h = t.insert(key(b"AAA\0\0", 1), 2, "a".into(), &EmptyDirectory).unwrap();
        assert_eq!(t.members_of(2), &[h]);
        assert!(t.members_of(3).is_empty());
    }

    #[test]
    fn stats_report_count_capacity_bytes() {
        let mut t = OptionTable::new(10, 1);
        t.insert(key(b"AAA\0\0", 1), 0, "a".into(), &EmptyDirectory).unwrap();
        let s = t.stats();
        assert_eq!(s.count, 1);
        assert_eq!(s.capacity, 10);
        assert!(s.bytes > 0);
    }

    #[test]
    fn insert_resolves_listed_directory_back_reference() {
        let mut dir = StaticDirectory::new();
        dir.insert(ListedOptionRecord::new("MSFT", "MSFT", 100, "XCBO"));
        let mut t = OptionTable::new(16, 4);
        let k = key(b"MSFT\0", 300);
        let h = t.insert(k, 1, "t".into(), &dir).unwrap();
        let listed = t.get(h).listed.as_ref().expect("root is in the directory");
        assert_eq!(listed.multiplier, 100);
    }
}
