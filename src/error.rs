use thiserror::Error;

/// Errors a [`crate::FingerprintMap`] operation can fail with.
#[derive(Error, Debug)]
pub enum FpMapError {
    /// The map would need to grow past its platform-dependent `logsize` cap.
    #[error("fingerprint map hit its size cap at logsize {logsize}")]
    SizeCap {
        /// The `logsize` that was rejected.
        logsize: u32,
    },
    /// The allocator failed to provide memory for a grow.
    #[error("allocation failed for {requested_bytes} bytes")]
    Alloc {
        /// Bytes requested from the allocator.
        requested_bytes: usize,
    },
    /// Kicking, stashing and growing all failed to place the entry.
    #[error("fingerprint map is full: no kick, stash slot or grow could place the entry")]
    Full,
}

/// Crate-local `Result` alias, matching every fallible operation's error type.
pub type Result<T> = std::result::Result<T, FpMapError>;
