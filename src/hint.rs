// Branch prediction hints. Only available on nightly, but in the kick loop
// and the stash lookup these consistently help: the "found nothing, keep
// probing" path dominates.

#[cfg(not(feature = "nightly"))]
#[inline]
pub fn likely(b: bool) -> bool {
    b
}
#[cfg(not(feature = "nightly"))]
#[inline]
pub fn unlikely(b: bool) -> bool {
    b
}

#[cfg(feature = "nightly")]
#[inline]
pub fn likely(b: bool) -> bool {
    unsafe { core::intrinsics::likely(b) }
}
#[cfg(feature = "nightly")]
#[inline]
pub fn unlikely(b: bool) -> bool {
    unsafe { core::intrinsics::unlikely(b) }
}
