#![cfg_attr(
    feature = "nightly",
    feature(alloc_layout_extra, allocator_api, core_intrinsics,)
)]

//! A fingerprint map: a cuckoo-filter style bucket engine that maps 64-bit
//! fingerprints to non-zero 32-bit positions.
//!
//! The map never sees the original keys. Callers hash their own keys down to
//! a 64-bit fingerprint, store the resulting position alongside it, and treat
//! every [`find`](index::cuckoo::FingerprintMap::find) hit as a candidate to
//! be rechecked against the real key. Lookups are worst-case O(1): every
//! fingerprint has exactly two candidate buckets, plus a tiny overflow stash.

/// Clamped construction parameters and platform capacity caps.
pub mod config;
/// Typed error values returned by fallible operations.
pub mod error;
/// The fingerprint map itself: bucket storage, cuckoo eviction, growth.
pub mod index;

/// Branch-prediction hints.
mod hint;

pub use error::{FpMapError, Result};
pub use index::cuckoo::{FingerprintMap, InsertStatus};
