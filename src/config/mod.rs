//! Construction-time constants and the clamping applied to them.

/// Smallest `logsize` a map can be constructed with; requests below this are
/// clamped up.
pub const MIN_LOGSIZE: u32 = 4;

/// Largest `logsize1` a map is ever allowed to grow to.
///
/// The original engine caps this lower on 32-bit targets, where bucket
/// indices and the stash's canonical index both live in a `u32` alongside
/// other header fields sized against `usize`. 64-bit targets can address the
/// full 32-bit bucket-index space.
#[cfg(target_pointer_width = "64")]
pub const MAX_LOGSIZE: u32 = 32;
#[cfg(not(target_pointer_width = "64"))]
pub const MAX_LOGSIZE: u32 = 26;

/// Upper bound on the number of positions `find` can return for one
/// fingerprint: two buckets of at most 4 slots each, plus the stash.
pub const MAXFIND: usize = 12;

/// Stash capacity while buckets hold 2 slots.
pub const STASH_CAPACITY_BSIZE2: usize = 1;

/// Stash capacity once buckets have grown to 4 slots.
pub const STASH_CAPACITY_BSIZE4: usize = 4;

/// Clamp a requested `logsize` into `[MIN_LOGSIZE, MAX_LOGSIZE]`, reporting
/// whether the request exceeded the cap (a size error) rather than falling
/// below the floor (which is silently rounded up).
pub fn clamp_initial_logsize(requested: u32) -> Result<u32, u32> {
    if requested > MAX_LOGSIZE {
        return Err(requested);
    }
    Ok(requested.max(MIN_LOGSIZE))
}
