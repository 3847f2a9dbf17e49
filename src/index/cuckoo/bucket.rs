//! The raw, contiguous bucket array.
//!
//! Entries are stored flat: bucket `i`, slot `s` lives at word offset
//! `i * bsize + s`. This is a manual allocation rather than a `Vec<Entry>`
//! because the array is resized in place by reinterpretation (width grow)
//! and by a doubling copy (index grow), neither of which map onto `Vec`'s
//! growth semantics.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc};

use super::entry::Entry;
use crate::error::FpMapError;

/// 16-byte alignment matches the original engine's bucket alignment and
/// keeps 4-slot (32-byte) buckets naturally aligned for any future SIMD scan.
const BUCKET_ALIGN: usize = 16;

fn layout_for(words: usize) -> Layout {
    let size = words
        .checked_mul(8)
        .expect("bucket array word count overflowed a byte size");
    Layout::from_size_align(size, BUCKET_ALIGN).expect("bad bucket array layout")
}

/// Owns `nb * bsize` contiguous, zero-initialised entries.
pub struct BucketStore {
    ptr: NonNull<u64>,
    /// Number of buckets. `u64` because `logsize1` can reach `32` on 64-bit
    /// targets, i.e. `nb == 2^32`, one past what a `u32` count can hold
    /// (bucket *indices* still fit in `u32`, since they only ever reach
    /// `nb - 1`).
    nb: u64,
    /// Slots per bucket, 2 or 4.
    bsize: u32,
}

unsafe impl Send for BucketStore {}
unsafe impl Sync for BucketStore {}

impl BucketStore {
    /// Allocate a zeroed store of `nb` buckets, `bsize` slots each.
    pub fn new(nb: u64, bsize: u32) -> crate::Result<Self> {
        let words = nb as usize * bsize as usize;
        let layout = layout_for(words);
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr as *mut u64).ok_or(FpMapError::Alloc {
            requested_bytes: layout.size(),
        })?;
        Ok(BucketStore { ptr, nb, bsize })
    }

    #[inline]
    pub fn nb(&self) -> u64 {
        self.nb
    }

    #[inline]
    pub fn bsize(&self) -> u32 {
        self.bsize
    }

    #[inline]
    fn offset(&self, bucket: u32, slot: u32) -> usize {
        debug_assert!((bucket as u64) < self.nb, "bucket {} out of {} buckets", bucket, self.nb);
        debug_assert!(slot < self.bsize, "slot {} out of {} slots", slot, self.bsize);
        bucket as usize * self.bsize as usize + slot as usize
    }

    #[inline]
    pub fn get(&self, bucket: u32, slot: u32) -> Entry {
        let off = self.offset(bucket, slot);
        unsafe { Entry::from_raw(*self.ptr.as_ptr().add(off)) }
    }

    #[inline]
    pub fn set(&mut self, bucket: u32, slot: u32, entry: Entry) {
        let off = self.offset(bucket, slot);
        unsafe { *self.ptr.as_ptr().add(off) = entry.raw() };
    }

    /// Bring both candidate buckets into cache.
    #[inline]
    pub fn prefetch(&self, bucket: u32) {
        #[cfg(all(
            feature = "nightly",
            any(target_arch = "x86", target_arch = "x86_64")
        ))]
        unsafe {
            let off = self.offset(bucket, 0);
            core::intrinsics::prefetch_read_data(self.ptr.as_ptr().add(off), 3);
        }
        #[cfg(not(all(
            feature = "nightly",
            any(target_arch = "x86", target_arch = "x86_64")
        )))]
        {
            let _ = bucket;
        }
    }

    /// Rebuild a store with `new_bsize` slots per bucket, copying each old
    /// bucket's entries into the first `old_bsize` slots of the new one and
    /// zeroing the rest. Used for the 2-slot to 4-slot width grow.
    ///
    /// Must copy back-to-front: `new` and `self` may eventually share the
    /// same backing allocation in a future in-place variant, and processing
    /// high indices first keeps that safe even though today's implementation
    /// allocates a fresh store.
    pub fn widen(&self, new_bsize: u32) -> crate::Result<Self> {
        debug_assert!(new_bsize > self.bsize);
        let mut new_store = BucketStore::new(self.nb, new_bsize)?;
        for i in (0..self.nb).rev() {
            let i = i as u32;
            for s in (0..self.bsize).rev() {
                let e = self.get(i, s);
                if !e.is_empty() {
                    new_store.set(i, s, e);
                }
            }
        }
        Ok(new_store)
    }

    /// Double the number of buckets, leaving the new store's contents at
    /// zero: the caller redistributes entries explicitly (index grow is not
    /// a plain copy, see `grow::grow_index`).
    pub fn doubled_empty(&self) -> crate::Result<Self> {
        BucketStore::new(self.nb * 2, self.bsize)
    }
}

impl Drop for BucketStore {
    fn drop(&mut self) {
        let words = self.nb as usize * self.bsize as usize;
        let layout = layout_for(words);
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
    }
}
