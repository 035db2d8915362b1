//! blake3 derivations used by the ledger: flight keys and oracle sampling
//! indexes.

/// Flight key: blake3(airline ‖ designator ‖ departure as big-endian u64).
pub fn flight_key(airline: &[u8; 32], designator: &str, departure: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(airline);
    hasher.update(designator.as_bytes());
    hasher.update(&departure.to_be_bytes());
    *hasher.finalize().as_bytes()
}

/// Pseudo-random index in `0..range` from `seed` and `nonce`.
pub fn sample_index(seed: &[u8; 32], nonce: u64, range: u8) -> u8 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(seed);
    hasher.update(&nonce.to_be_bytes());
    hasher.finalize().as_bytes()[0] % range
}

/// Three distinct indexes in `0..range`. Advances `nonce` once per draw so the
/// caller can persist it; equal draws are discarded.
pub fn distinct_indexes(seed: &[u8; 32], nonce: &mut u64, range: u8) -> [u8; 3] {
    let mut next = || {
        let index = sample_index(seed, *nonce, range);
        *nonce = nonce.wrapping_add(1);
        index
    };

    let first = next();
    let mut second = next();
    while second == first {
        second = next();
    }
    let mut third = next();
    while third == first || third == second {
        third = next();
    }
    [first, second, third]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_key_depends_on_every_part() {
        let a = [1u8; 32];
        let base = flight_key(&a, "ND1309", 1_700_000_000);
        assert_eq!(base, flight_key(&a, "ND1309", 1_700_000_000));
        assert_ne!(base, flight_key(&[2u8; 32], "ND1309", 1_700_000_000));
        assert_ne!(base, flight_key(&a, "ND1310", 1_700_000_000));
        assert_ne!(base, flight_key(&a, "ND1309", 1_700_000_001));
    }

    #[test]
    fn indexes_are_distinct_and_in_range() {
        let mut nonce = 0;
        for seed in 0u8..50 {
            let idx = distinct_indexes(&[seed; 32], &mut nonce, 10);
            assert!(idx.iter().all(|i| *i < 10));
            assert_ne!(idx[0], idx[1]);
            assert_ne!(idx[0], idx[2]);
            assert_ne!(idx[1], idx[2]);
        }
        assert!(nonce >= 150);
    }
}
