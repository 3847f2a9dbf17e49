use fpindex::{FingerprintMap, InsertStatus};
use proptest::prelude::*;

/// The scenario test hash from the design notes: a strong 64-bit mixer used
/// to generate fingerprints deterministically from an integer.
fn nasam(mut x: u64) -> u64 {
    x ^= x.rotate_right(25) ^ x.rotate_right(47);
    x = x.wrapping_mul(0x9e6c_63d0_676a_9a99);
    x ^= (x >> 23) ^ (x >> 51);
    x = x.wrapping_mul(0x9e6d_62d0_6f6a_9a9b);
    x ^= (x >> 23) ^ (x >> 51);
    x
}

#[test]
fn s1_dense_odd_insert_round_trips() {
    let mut m = FingerprintMap::new(10).unwrap();
    let mut placed = 0u64;
    for i in (1..=65535u64).step_by(2) {
        if m.insert(nasam(i), i as u32).is_ok() {
            placed += 1;
        }
        let mut out = [0u32; 12];
        let n = m.find(nasam(i), &mut out);
        assert!(out[..n].contains(&(i as u32)), "lost {} right after inserting it", i);
    }
    assert_eq!(placed, 32768);
    assert_eq!(m.len(), placed);
}

#[test]
fn s2_false_positive_rate_is_low_on_unseen_keys() {
    let mut m = FingerprintMap::new(10).unwrap();
    for i in (1..=65535u64).step_by(2) {
        m.insert(nasam(i), i as u32).unwrap();
    }
    let mut hits = 0u64;
    let mut total = 0u64;
    for i in (2..=65536u64).step_by(2) {
        let mut out = [0u32; 12];
        let n = m.find(nasam(i), &mut out);
        assert!(n <= 1, "unexpectedly many matches for an absent key: {}", n);
        hits += n as u64;
        total += 1;
    }
    // A 32-bit tag collision rate is on the order of 2^-32 per probed slot;
    // even with generous slack this should be nowhere near 1%.
    assert!((hits as f64) < (total as f64) * 0.01);
}

#[test]
fn s3_load_factor_bound_before_failure() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut m = FingerprintMap::new(4).unwrap();
    let mut i = 0u64;
    loop {
        i += 1;
        if m.insert(nasam(i), i as u32).is_err() {
            break;
        }
        if i > 1_000_000 {
            panic!("map never reported full, something is wrong with growth");
        }
    }
    let capacity = m.capacity();
    let load_factor = m.len() as f64 / capacity as f64;
    assert!(
        load_factor >= 0.85,
        "load factor {} (len {}, capacity {}) fell below the 0.85 bound before the map reported failure",
        load_factor,
        m.len(),
        capacity
    );
}

#[test]
fn s6_bucket_array_hash_is_deterministic_across_runs() {
    fn checksum(m: &FingerprintMap) -> u64 {
        let mut h = 0xcbf2_9ce4_8422_2325u64;
        for (tag, pos) in m.iter() {
            h ^= tag as u64;
            h = h.wrapping_mul(0x1000_0000_01b3);
            h ^= pos as u64;
            h = h.wrapping_mul(0x1000_0000_01b3);
        }
        h
    }

    fn run() -> u64 {
        let mut m = FingerprintMap::new(10).unwrap();
        for i in (1..=65535u64).step_by(2) {
            m.insert(nasam(i), i as u32).unwrap();
        }
        checksum(&m)
    }

    assert_eq!(run(), run(), "bucket array checksum differs across two identical insert runs");
}

#[test]
fn s4_survives_width_grow() {
    let mut m = FingerprintMap::new(4).unwrap();
    let mut placed = Vec::new();
    for i in 1..=200u64 {
        if m.insert(nasam(i), i as u32).is_ok() {
            placed.push(i);
        }
    }
    for i in &placed {
        let mut out = [0u32; 12];
        let n = m.find(nasam(*i), &mut out);
        assert!(out[..n].contains(&(*i as u32)));
    }
}

#[test]
fn placed_after_grow_is_reported_distinctly() {
    let mut m = FingerprintMap::new(4).unwrap();
    let mut saw_direct = false;
    let mut saw_after_grow = false;
    for i in 1..=500u64 {
        match m.insert(nasam(i), i as u32) {
            Ok(InsertStatus::PlacedDirectly) => saw_direct = true,
            Ok(InsertStatus::PlacedAfterGrow) => saw_after_grow = true,
            Err(_) => break,
        }
    }
    assert!(saw_direct);
    assert!(saw_after_grow, "expected at least one grow over 500 inserts into a logsize-4 map");
}

proptest! {
    /// Invariant 1: every live entry's alternate index, computed by XORing
    /// its own bucket index with its tag, is reachable and yields the same
    /// fingerprint family. Exercised indirectly: whatever bucket an entry
    /// ends up in, `find` on its original fingerprint must recover it.
    #[test]
    fn xor_symmetry_round_trip(ids in prop::collection::vec(1u64..100_000, 1..300)) {
        let mut m = FingerprintMap::new(6).unwrap();
        let mut placed = Vec::new();
        for id in ids {
            if m.insert(nasam(id), id as u32).is_ok() {
                placed.push(id);
            }
        }
        for id in placed {
            let mut out = [0u32; 12];
            let n = m.find(nasam(id), &mut out);
            prop_assert!(out[..n].contains(&(id as u32)));
        }
    }
}
