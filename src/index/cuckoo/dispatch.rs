//! Re-insertion of stashed and pending entries after a grow ("restash"),
//! and the small piece of state the map uses to pick the right insert/find
//! behaviour (`bsize`, whether index growth has happened, and how many
//! entries are stashed).
//!
//! Some cuckoo filter implementations swap function-pointer triples keyed on
//! bucket width for this; this crate keeps `bsize`/`resized` as plain fields
//! on the map and matches on them directly, which is equally correct and
//! simpler for a scalar (non-SIMD-dispatch) implementation.

use log::{debug, trace};

use super::bucket::BucketStore;
use super::entry::Entry;
use super::kick::{kickloop, KickOutcome, Touched};
use super::slot::{first_empty_in_pair, place};
use super::stash::Stash;

/// Candidate bucket pair for one entry, already resolved against the
/// active level (pre- or post-resize).
pub struct Candidates {
    pub i1: u32,
    pub i2: u32,
    pub canonical_i1: u32,
}

/// Re-place every entry in `pending` against the grown table. `resolve`
/// computes an entry's `Candidates` under the level active *after* the
/// grow that just happened.
///
/// Returns `Ok(())` if every entry found a home (directly, via a kick, or
/// back into the stash); `Err(overflow)` with the entries that still
/// wouldn't fit if the stash filled up too, in which case the grow itself
/// is treated as a failure.
pub fn restash(
    store: &mut BucketStore,
    stash: &mut Stash,
    mask_active: u32,
    pending: Vec<(u32, Entry)>,
    resolve: impl Fn(u32, Entry) -> Candidates,
) -> Result<(), Vec<(u32, Entry)>> {
    let mut overflow = Vec::new();

    for (canonical_i1, entry) in pending {
        let c = resolve(canonical_i1, entry);

        if let Some(slot) = first_empty_in_pair(store, c.i1, c.i2) {
            place(store, slot, entry);
            trace!("restash: placed directly into bucket {}", slot.bucket);
            continue;
        }

        let mut touched = Touched::new();
        match kickloop(store, c.i1, mask_active, entry, &mut touched) {
            KickOutcome::Placed => {
                trace!("restash: placed via kick from bucket {}", c.i1);
                continue;
            }
            KickOutcome::Failed { .. } => {
                touched.revert(store);
            }
        }

        if stash.try_insert(c.canonical_i1, entry) {
            debug!("restash: fell back to stash, now holding {}", stash.len());
            continue;
        }

        overflow.push((canonical_i1, entry));
    }

    if overflow.is_empty() {
        Ok(())
    } else {
        Err(overflow)
    }
}
