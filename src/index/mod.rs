/// The cuckoo-filter bucket engine: fingerprint splitting, bucket storage,
/// the kick loop, the stash, and width/index growth.
pub mod cuckoo;
