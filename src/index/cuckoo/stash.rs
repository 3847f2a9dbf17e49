//! The small overflow table for entries the kick loop couldn't place.

use super::entry::Entry;

/// One stashed record: the entry plus the canonical (smaller) of its two
/// candidate bucket indices, masked to the active level. Lookup recomputes
/// the same canonical index from the fingerprint and compares both fields.
#[derive(Debug, Clone, Copy)]
struct Stashed {
    canonical_i1: u32,
    entry: Entry,
}

/// Fixed-capacity side table. Capacity is 1 while `bsize == 2` and 4 once
/// `bsize == 4` (see `config::STASH_CAPACITY_BSIZE2/4`).
pub struct Stash {
    records: Vec<Stashed>,
    capacity: usize,
}

impl Stash {
    pub fn new(capacity: usize) -> Self {
        Stash {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Raise the capacity after a width grow (1 -> 4). Never lowers it.
    pub fn set_capacity(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.capacity);
        self.capacity = capacity;
    }

    /// Try to admit `entry` under canonical index `canonical_i1`. Fails if
    /// the stash is already at capacity.
    pub fn try_insert(&mut self, canonical_i1: u32, entry: Entry) -> bool {
        if self.is_full() {
            return false;
        }
        self.records.push(Stashed { canonical_i1, entry });
        true
    }

    /// Append every stashed position matching `canonical_i1` and `tag` to
    /// `out`, returning how many were written.
    pub fn find_into(&self, canonical_i1: u32, tag: u32, out: &mut [u32], written: usize) -> usize {
        let mut n = written;
        for r in &self.records {
            if n >= out.len() {
                break;
            }
            if r.canonical_i1 == canonical_i1 && r.entry.tag() == tag {
                out[n] = r.entry.pos();
                n += 1;
            }
        }
        n
    }

    /// Drain every stashed record out as `(canonical_i1, entry)` pairs, for
    /// re-insertion after a grow.
    pub fn drain_all(&mut self) -> Vec<(u32, Entry)> {
        self.records
            .drain(..)
            .map(|r| (r.canonical_i1, r.entry))
            .collect()
    }

    /// Every stashed entry, for introspection.
    pub fn iter(&self) -> impl Iterator<Item = Entry> + '_ {
        self.records.iter().map(|r| r.entry)
    }
}
