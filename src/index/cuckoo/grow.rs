//! Width grow (2-slot buckets to 4-slot buckets) and index grow (doubling
//! the bucket count), the two structural changes that make room once the
//! kick loop and the stash can no longer absorb a failed insert.

use std::convert::TryFrom;

use super::bucket::BucketStore;
use super::entry::Entry;
use crate::Result;

/// Reinterpret every 2-slot bucket as the first half of a 4-slot bucket.
/// Back-to-front so that a future in-place variant stays safe; today's
/// implementation allocates fresh, but the ordering is kept to match.
pub fn grow_width(store: &BucketStore) -> Result<BucketStore> {
    store.widen(4)
}

/// Double the bucket count, redistributing each old bucket's entries into
/// the low half (same index) or high half (`index + old_nb`) of the grown
/// table, based on which candidate index the extended derivation selects.
pub fn grow_index(store: &BucketStore, logsize0: u32, mask0: u32, mask1_old: u32) -> Result<BucketStore> {
    let old_nb = store.nb();
    let old_nb_u32 = u32::try_from(old_nb).expect("bucket count exceeded u32 before an index grow");
    let bsize = store.bsize();
    let mut grown = store.doubled_empty()?;
    let mask1_new = (mask1_old << 1) | 1;

    for i in 0..old_nb_u32 {
        for s in 0..bsize {
            let entry = store.get(i, s);
            if entry.is_empty() {
                continue;
            }
            let (i1p, i2p) = extended_candidates(i, entry.tag(), logsize0, mask0, mask1_new);
            let dest_bucket = if i1p == i || i2p == i {
                i
            } else {
                i + old_nb_u32
            };
            place_in_first_empty(&mut grown, dest_bucket, entry);
        }
    }

    Ok(grown)
}

fn extended_candidates(i: u32, tag: u32, logsize0: u32, mask0: u32, mask1_new: u32) -> (u32, u32) {
    let i_a = i & mask0;
    let i_b = (i_a ^ tag) & mask0;
    let i_low = i_a.min(i_b);
    let i1p = (i_low | (tag << logsize0)) & mask1_new;
    let i2p = (i1p ^ tag) & mask1_new;
    (i1p, i2p)
}

fn place_in_first_empty(store: &mut BucketStore, bucket: u32, entry: Entry) {
    for s in 0..store.bsize() {
        if store.get(bucket, s).is_empty() {
            store.set(bucket, s, entry);
            return;
        }
    }
    unreachable!(
        "redistribution overflowed bucket {}: more than bsize entries classified into one half",
        bucket
    );
}
