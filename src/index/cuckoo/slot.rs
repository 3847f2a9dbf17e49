//! Scanning a candidate pair of buckets for matches or an empty slot.

use super::bucket::BucketStore;
use super::entry::Entry;
use crate::config::MAXFIND;

/// A slot address: which of the two candidate buckets, and which index
/// within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub bucket: u32,
    pub slot: u32,
}

/// Append every position whose tag matches `tag` across both buckets to
/// `out`, in bucket-then-slot order. Returns the number written.
pub fn find_in_pair(store: &BucketStore, b1: u32, b2: u32, tag: u32, out: &mut [u32]) -> usize {
    #[cfg(feature = "simd")]
    {
        if store.bsize() == 4 {
            return find_in_pair_simd4(store, b1, b2, tag, out);
        }
    }
    find_in_pair_scalar(store, b1, b2, tag, out)
}

fn find_in_pair_scalar(store: &BucketStore, b1: u32, b2: u32, tag: u32, out: &mut [u32]) -> usize {
    let mut n = 0;
    for &b in &[b1, b2] {
        for s in 0..store.bsize() {
            if n >= out.len() || n >= MAXFIND {
                return n;
            }
            let e = store.get(b, s);
            if !e.is_empty() && e.tag() == tag {
                out[n] = e.pos();
                n += 1;
            }
        }
    }
    n
}

/// Same contract as [`find_in_pair_scalar`], but compares all 4 tags of a
/// bucket in a single SIMD lane instead of one slot at a time. Only used
/// once buckets have grown to 4 slots.
#[cfg(feature = "simd")]
fn find_in_pair_simd4(store: &BucketStore, b1: u32, b2: u32, tag: u32, out: &mut [u32]) -> usize {
    use packed_simd::u32x4;

    let needle = u32x4::splat(tag);
    let mut n = 0;
    for &b in &[b1, b2] {
        let tags = u32x4::new(
            store.get(b, 0).tag(),
            store.get(b, 1).tag(),
            store.get(b, 2).tag(),
            store.get(b, 3).tag(),
        );
        let matches = tags.eq(needle);
        for s in 0..4u32 {
            if n >= out.len() || n >= MAXFIND {
                return n;
            }
            if matches.extract(s as usize) {
                out[n] = store.get(b, s).pos();
                n += 1;
            }
        }
    }
    n
}

/// The first empty slot among `b1`'s then `b2`'s slots, in slot order.
pub fn first_empty_in_pair(store: &BucketStore, b1: u32, b2: u32) -> Option<SlotRef> {
    for &b in &[b1, b2] {
        for s in 0..store.bsize() {
            if store.get(b, s).is_empty() {
                return Some(SlotRef { bucket: b, slot: s });
            }
        }
    }
    None
}

/// Place `entry` into a known-empty slot.
pub fn place(store: &mut BucketStore, at: SlotRef, entry: Entry) {
    debug_assert!(store.get(at.bucket, at.slot).is_empty());
    store.set(at.bucket, at.slot, entry);
}
