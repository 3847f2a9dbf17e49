//! Cuckoo eviction: relocate entries until the pending one finds a home, or
//! give up after a bounded number of iterations.

use super::bucket::BucketStore;
use super::entry::Entry;
use crate::hint::unlikely;

/// Outcome of running the kick loop to place one pending entry.
pub enum KickOutcome {
    /// The pending entry (or one displaced along the way) found an empty
    /// slot.
    Placed,
    /// The loop ran out of iterations. Carries the bucket index and entry
    /// that are still homeless so the caller can stash or grow.
    Failed { bucket: u32, pending: Entry },
}

/// `maxkick = 2 * logsize` of the active level, per the original engine.
pub fn max_kick(logsize: u32) -> u32 {
    2 * logsize
}

/// Snapshot of one bucket's slots taken before the kick loop's first write
/// to it, so a caller that ultimately must abort the whole insert (a grow
/// allocation failed) can restore the table to its pre-insert state without
/// literally replaying the loop in reverse.
pub struct Touched {
    entries: Vec<(u32, Vec<Entry>)>,
}

impl Touched {
    pub fn new() -> Self {
        Touched { entries: Vec::new() }
    }

    fn record(&mut self, store: &BucketStore, bucket: u32) {
        if self.entries.iter().any(|(b, _)| *b == bucket) {
            return;
        }
        let slots = (0..store.bsize()).map(|s| store.get(bucket, s)).collect();
        self.entries.push((bucket, slots));
    }

    /// Restore every touched bucket to its pre-kick contents, most-recently
    /// touched first (irrelevant for correctness since buckets are disjoint,
    /// but matches the order entries were displaced in).
    pub fn revert(&self, store: &mut BucketStore) {
        for (bucket, slots) in self.entries.iter().rev() {
            for (s, entry) in slots.iter().enumerate() {
                store.set(*bucket, s as u32, *entry);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run the kick loop starting from bucket `i1`, trying to make room for
/// `pending`. `mask` is the active table's mask (`mask0` pre-resize,
/// `mask1` post-resize).
pub fn kickloop(
    store: &mut BucketStore,
    mut i1: u32,
    mask: u32,
    mut pending: Entry,
    touched: &mut Touched,
) -> KickOutcome {
    let logsize = (32 - mask.leading_zeros()).max(1);
    let maxkick = max_kick(logsize);
    let bsize = store.bsize();

    for _ in 0..maxkick {
        touched.record(store, i1);

        let evicted = store.get(i1, 0);
        for s in 0..bsize - 1 {
            let next = store.get(i1, s + 1);
            store.set(i1, s, next);
        }
        store.set(i1, bsize - 1, pending);

        if unlikely(evicted.is_empty()) {
            // The bucket had a free slot all along (shifted into place);
            // nothing was actually evicted.
            return KickOutcome::Placed;
        }

        i1 = (i1 ^ evicted.tag()) & mask;
        touched.record(store, i1);

        if let Some(empty_slot) = (0..bsize).find(|&s| store.get(i1, s).is_empty()) {
            store.set(i1, empty_slot, evicted);
            return KickOutcome::Placed;
        }

        pending = evicted;
    }

    KickOutcome::Failed { bucket: i1, pending }
}
