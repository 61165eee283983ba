//! Seed-keyed pseudo-random helpers.
//!
//! There is no RNG instance anywhere in the engine. Every "random" value is a
//! pure function of a seed string and a salt: the seed is hashed with FNV-1a,
//! normalized to `[0, 1)`, then scaled into the requested range. Identical
//! inputs always produce identical outputs, so concurrent calls need no
//! locking and every endpoint is reproducible by construction.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the seed bytes, with the salt folded in afterwards.
fn hash_seed(seed: &str, salt: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in seed.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    for byte in salt.to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Normalize a hash to `[0, 1)` using the top 53 bits, the full precision of
/// an f64 mantissa.
fn unit_float(seed: &str, salt: u64) -> f64 {
    (hash_seed(seed, salt) >> 11) as f64 / (1u64 << 53) as f64
}

/// Deterministic float in `[min, max)`.
pub fn random_in_range(seed: &str, min: f64, max: f64, salt: u64) -> f64 {
    min + unit_float(seed, salt) * (max - min)
}

/// Deterministic integer in `[min, max]` inclusive.
pub fn int_in_range(seed: &str, min: i64, max: i64, salt: u64) -> i64 {
    if max <= min {
        return min;
    }
    let span = (max - min + 1) as f64;
    min + (unit_float(seed, salt) * span) as i64
}

/// Deterministic id like `sess_acme_3_9f2c41d08a1b`; stable for a given
/// `(seed, index)` pair.
pub fn consistent_id(seed: &str, index: u64, prefix: &str) -> String {
    let hash = hash_seed(seed, index);
    format!("{}_{}_{}_{:012x}", prefix, seed, index, hash & 0xffff_ffff_ffff)
}

/// Deterministic choice from a fixed pool.
pub fn pick<'a, T>(seed: &str, salt: u64, items: &'a [T]) -> &'a T {
    let index = (unit_float(seed, salt) * items.len() as f64) as usize;
    &items[index.min(items.len() - 1)]
}

/// Deterministic coin flip with the given probability of `true`.
pub fn chance(seed: &str, salt: u64, probability: f64) -> bool {
    unit_float(seed, salt) < probability
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_value() {
        let a = random_in_range("acct_1:revenue", 0.0, 100.0, 7);
        let b = random_in_range("acct_1:revenue", 0.0, 100.0, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_salts_diverge() {
        let a = random_in_range("acct_1:revenue", 0.0, 100.0, 0);
        let b = random_in_range("acct_1:revenue", 0.0, 100.0, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_values_stay_in_range() {
        for salt in 0..1000 {
            let v = random_in_range("spread-check", 2.5, 9.5, salt);
            assert!((2.5..9.5).contains(&v), "out of range: {}", v);

            let n = int_in_range("spread-check", -3, 3, salt);
            assert!((-3..=3).contains(&n), "out of range: {}", n);
        }
    }

    #[test]
    fn test_spread_covers_the_range() {
        // A thousand salts should land in every decile of [0, 1).
        let mut deciles = [0u32; 10];
        for salt in 0..1000 {
            let v = random_in_range("decile-check", 0.0, 1.0, salt);
            deciles[(v * 10.0) as usize] += 1;
        }
        for (i, count) in deciles.iter().enumerate() {
            assert!(*count > 20, "decile {} underpopulated: {}", i, count);
        }
    }

    #[test]
    fn test_int_in_range_degenerate_bounds() {
        assert_eq!(int_in_range("x", 5, 5, 0), 5);
        assert_eq!(int_in_range("x", 5, 4, 0), 5);
    }

    #[test]
    fn test_consistent_id_is_stable_and_distinct() {
        let a = consistent_id("acme", 0, "sess");
        let b = consistent_id("acme", 0, "sess");
        let c = consistent_id("acme", 1, "sess");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sess_acme_0_"));
    }

    #[test]
    fn test_pick_never_out_of_bounds() {
        let pool = ["a", "b", "c"];
        for salt in 0..200 {
            let choice = pick("pool-check", salt, &pool);
            assert!(pool.contains(choice));
        }
    }
}
