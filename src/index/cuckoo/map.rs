//! The public fingerprint map: `new`, `find`, `insert`, `prefetch`.

use log::{debug, warn};

use super::bucket::BucketStore;
use super::dispatch::{restash, Candidates};
use super::entry::Entry;
use super::fingerprint::{extend_for_resize, split};
use super::kick::{kickloop, KickOutcome, Touched};
use super::slot::{find_in_pair, first_empty_in_pair, place};
use super::stash::Stash;
use crate::config::{self, MAXFIND, STASH_CAPACITY_BSIZE2, STASH_CAPACITY_BSIZE4};
use crate::error::FpMapError;
use crate::Result;

/// Outcome of a successful [`FingerprintMap::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    /// Placed without any structural change.
    PlacedDirectly,
    /// Placed, but only after a width grow and/or an index grow.
    PlacedAfterGrow,
}

/// A cuckoo-filter style map from 64-bit fingerprints to non-zero 32-bit
/// positions.
///
/// The map never stores or compares the original keys: it is the caller's
/// job to hash a key down to a fingerprint, and to recheck every candidate
/// `find` returns against the real key, since tag collisions are possible
/// by design (see the crate-level docs).
pub struct FingerprintMap {
    store: BucketStore,
    stash: Stash,
    cnt: u64,
    logsize0: u32,
    mask0: u32,
    logsize1: u32,
    mask1: u32,
}

impl FingerprintMap {
    /// Create an empty map with `2^logsize` initial buckets of 2 slots
    /// each. `logsize` is clamped up to [`config::MIN_LOGSIZE`]; a request
    /// above the platform's [`config::MAX_LOGSIZE`] is an error.
    pub fn new(logsize: u32) -> Result<Self> {
        let logsize = config::clamp_initial_logsize(logsize)
            .map_err(|logsize| FpMapError::SizeCap { logsize })?;
        let nb = 1u64 << logsize;
        let mask0 = mask_for(logsize);
        let store = BucketStore::new(nb, 2)?;
        debug!("fingerprint map created with logsize {}", logsize);
        Ok(FingerprintMap {
            store,
            stash: Stash::new(STASH_CAPACITY_BSIZE2),
            cnt: 0,
            logsize0: logsize,
            mask0,
            logsize1: logsize,
            mask1: mask0,
        })
    }

    /// Whether index growth has happened at least once.
    #[inline]
    fn resized(&self) -> bool {
        self.logsize1 > self.logsize0
    }

    /// Number of live entries, stash included.
    pub fn len(&self) -> u64 {
        self.cnt
    }

    pub fn is_empty(&self) -> bool {
        self.cnt == 0
    }

    /// Total slot capacity at the current size: `2^logsize1 * bsize`.
    pub fn capacity(&self) -> u64 {
        self.store.nb() * self.store.bsize() as u64
    }

    /// Every live `(tag, pos)` pair across the bucket array then the stash,
    /// in bucket/slot order. Exposed for checksums and debugging; the order
    /// is stable for a given sequence of inserts.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let store = &self.store;
        let bucket_entries = (0..store.nb()).flat_map(move |b| {
            let b = b as u32;
            (0..store.bsize()).filter_map(move |s| {
                let e = store.get(b, s);
                if e.is_empty() {
                    None
                } else {
                    Some((e.tag(), e.pos()))
                }
            })
        });
        let stash_entries = self.stash.iter().map(|e| (e.tag(), e.pos()));
        bucket_entries.chain(stash_entries)
    }

    /// Release the map. `FingerprintMap` already releases its memory when
    /// dropped; this exists for parity with the C API's explicit `free(map)`.
    pub fn free(self) {}

    /// Resolve a fingerprint to its active-level candidates and the
    /// canonical stash index (always computed against `mask0`, so it stays
    /// meaningful across a later index grow).
    fn candidates_for_fp(&self, fp: u64) -> (Candidates, u32) {
        let s0 = split(fp, self.mask0);
        let canonical_i1 = s0.i1.min(s0.i2);
        let candidates = if !self.resized() {
            Candidates {
                i1: s0.i1,
                i2: s0.i2,
                canonical_i1,
            }
        } else {
            let s1 = extend_for_resize(s0.i1, s0.i2, s0.tag, self.logsize0, self.mask1);
            Candidates {
                i1: s1.i1,
                i2: s1.i2,
                canonical_i1,
            }
        };
        (candidates, s0.tag)
    }

    /// Bring both of `fp`'s candidate buckets into cache. Purely advisory.
    pub fn prefetch(&self, fp: u64) {
        let (c, _) = self.candidates_for_fp(fp);
        self.store.prefetch(c.i1);
        self.store.prefetch(c.i2);
    }

    /// Write every position matching `fp` into `out`, returning how many
    /// were written. `out` should have room for at least
    /// [`config::MAXFIND`] entries; excess matches beyond `out.len()` are
    /// silently dropped, matching the two-bucket-plus-stash upper bound.
    pub fn find(&self, fp: u64, out: &mut [u32]) -> usize {
        let (c, tag) = self.candidates_for_fp(fp);
        let mut n = find_in_pair(&self.store, c.i1, c.i2, tag, out);
        if self.stash.len() > 0 {
            n = self.stash.find_into(c.canonical_i1, tag, out, n);
        }
        n.min(MAXFIND)
    }

    /// Insert `(fp, pos)`. `pos` may be any `u32` value, including 0.
    pub fn insert(&mut self, fp: u64, pos: u32) -> Result<InsertStatus> {
        let (c, tag) = self.candidates_for_fp(fp);
        let entry = Entry::new(tag, pos);

        if let Some(slot) = first_empty_in_pair(&self.store, c.i1, c.i2) {
            place(&mut self.store, slot, entry);
            self.cnt += 1;
            return Ok(InsertStatus::PlacedDirectly);
        }

        let mask_active = if self.resized() { self.mask1 } else { self.mask0 };
        let mut touched = Touched::new();
        match kickloop(&mut self.store, c.i1, mask_active, entry, &mut touched) {
            KickOutcome::Placed => {
                self.cnt += 1;
                return Ok(InsertStatus::PlacedDirectly);
            }
            KickOutcome::Failed { .. } => {
                // The loop already wrote into every bucket it touched along
                // the chain; undo that before falling back to stash/grow, or
                // `entry` below would duplicate a slot the chain still holds
                // while the entry genuinely displaced off the end is lost.
                touched.revert(&mut self.store);
            }
        }

        if self.stash.try_insert(c.canonical_i1, entry) {
            self.cnt += 1;
            debug!("insert: placed into stash, now holding {}", self.stash.len());
            return Ok(InsertStatus::PlacedDirectly);
        }

        self.grow_and_place(c.canonical_i1, entry)
    }

    /// Width-grow (if still at `bsize == 2`) or index-grow (otherwise),
    /// then restash the displaced entry alongside whatever was already in
    /// the stash.
    fn grow_and_place(&mut self, canonical_i1: u32, pending: Entry) -> Result<InsertStatus> {
        if self.store.bsize() == 2 {
            self.grow_width(canonical_i1, pending)
        } else {
            self.grow_index(canonical_i1, pending)
        }
    }

    fn grow_width(&mut self, canonical_i1: u32, pending: Entry) -> Result<InsertStatus> {
        let new_store = super::grow::grow_width(&self.store)?;
        self.store = new_store;
        self.stash.set_capacity(STASH_CAPACITY_BSIZE4);
        debug!("width grow: bsize 2 -> 4");

        let mut to_place = self.stash.drain_all();
        to_place.push((canonical_i1, pending));
        self.restash_all(to_place)
    }

    fn grow_index(&mut self, canonical_i1: u32, pending: Entry) -> Result<InsertStatus> {
        let next_logsize1 = self.logsize1 + 1;
        if next_logsize1 > config::MAX_LOGSIZE {
            warn!(
                "insert rejected: index grow would exceed logsize cap {}",
                config::MAX_LOGSIZE
            );
            return Err(FpMapError::SizeCap {
                logsize: next_logsize1,
            });
        }

        let new_store =
            super::grow::grow_index(&self.store, self.logsize0, self.mask0, self.mask1)?;
        self.store = new_store;
        self.logsize1 = next_logsize1;
        self.mask1 = (self.mask1 << 1) | 1;
        debug!("index grow: logsize1 -> {}", self.logsize1);

        let mut to_place = self.stash.drain_all();
        to_place.push((canonical_i1, pending));
        self.restash_all(to_place)
    }

    fn restash_all(&mut self, pending: Vec<(u32, Entry)>) -> Result<InsertStatus> {
        let mask_active = if self.resized() { self.mask1 } else { self.mask0 };
        let logsize0 = self.logsize0;
        let mask0 = self.mask0;
        let mask1 = self.mask1;
        let resized = self.resized();

        let resolve = |canonical_i1: u32, entry: Entry| -> Candidates {
            let tag = entry.tag();
            let i1 = canonical_i1;
            let i2 = (i1 ^ tag) & mask0;
            if !resized {
                Candidates {
                    i1,
                    i2,
                    canonical_i1,
                }
            } else {
                let s1 = extend_for_resize(i1, i2, tag, logsize0, mask1);
                Candidates {
                    i1: s1.i1,
                    i2: s1.i2,
                    canonical_i1,
                }
            }
        };

        match restash(&mut self.store, &mut self.stash, mask_active, pending, resolve) {
            Ok(()) => Ok(InsertStatus::PlacedAfterGrow),
            Err(overflow) => {
                let lost = overflow.len();
                // Put everything we can back into the stash so the map stays
                // usable for `find`, even though this insert reports failure.
                for (canonical_i1, entry) in overflow {
                    let _ = self.stash.try_insert(canonical_i1, entry);
                }
                warn!("insert failed: {} entries could not be restashed after grow", lost);
                Err(FpMapError::Full)
            }
        }
    }
}

#[inline]
fn mask_for(logsize: u32) -> u32 {
    if logsize >= 32 {
        u32::MAX
    } else {
        (1u32 << logsize) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nasam(mut x: u64) -> u64 {
        x ^= x.rotate_right(25) ^ x.rotate_right(47);
        x = x.wrapping_mul(0x9e6c_63d0_676a_9a99);
        x ^= (x >> 23) ^ (x >> 51);
        x = x.wrapping_mul(0x9e6d_62d0_6f6a_9a9b);
        x ^= (x >> 23) ^ (x >> 51);
        x
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut m = FingerprintMap::new(4).unwrap();
        for i in 1u64..=200 {
            m.insert(nasam(i), i as u32).unwrap();
        }
        for i in 1u64..=200 {
            let mut out = [0u32; 12];
            let n = m.find(nasam(i), &mut out);
            assert!(out[..n].contains(&(i as u32)), "missing {}", i);
        }
    }

    #[test]
    fn new_clamps_small_logsize() {
        let m = FingerprintMap::new(0).unwrap();
        assert_eq!(m.mask0, (1 << config::MIN_LOGSIZE) - 1);
    }

    #[test]
    fn new_rejects_oversized_logsize() {
        let err = FingerprintMap::new(config::MAX_LOGSIZE + 1).unwrap_err();
        assert!(matches!(err, FpMapError::SizeCap { .. }));
    }

    #[test]
    fn grows_past_initial_capacity_without_losing_entries() {
        let mut m = FingerprintMap::new(4).unwrap();
        let mut inserted = Vec::new();
        for i in 1u64..=5000 {
            if m.insert(nasam(i), i as u32).is_ok() {
                inserted.push(i);
            } else {
                break;
            }
        }
        assert!(inserted.len() > 16 * 2, "should have grown past the initial 2-slot*16-bucket capacity");
        for i in &inserted {
            let mut out = [0u32; 12];
            let n = m.find(nasam(*i), &mut out);
            assert!(out[..n].contains(&(*i as u32)), "lost {} after growth", i);
        }
    }
}
