use std::sync::{Arc, RwLock};

use blake2::{digest::consts::U16, Blake2b, Digest};

type KeyDigest = Blake2b<U16>;

/// A bloom-style membership filter guarding the cache against lookups for keys that were never
/// written, e.g. requests for category ids that do not exist.
///
/// `contains` can return false positives but never false negatives: every key passed to `insert`
/// is reported as present. Keys cannot be removed, so seed the filter on both writes and
/// read-throughs and accept that stale entries only cost a wasted database query.
#[derive(Clone)]
pub struct KeyFilter {
    inner: Arc<RwLock<FilterBits>>,
}

struct FilterBits {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
}

impl KeyFilter {
    /// A filter sized for `capacity` keys at roughly a 1% false positive rate.
    pub fn with_capacity(capacity: usize) -> Self {
        // ~9.6 bits per key and 7 probes give p ≈ 0.01
        let num_bits = (capacity as u64 * 10).max(64);
        Self::with_params(num_bits, 7)
    }

    pub fn with_params(num_bits: u64, num_hashes: u32) -> Self {
        let words = num_bits.div_ceil(64) as usize;
        let inner = FilterBits { bits: vec![0u64; words], num_bits, num_hashes };
        Self { inner: Arc::new(RwLock::new(inner)) }
    }

    pub fn insert(&self, key: &str) {
        let (h1, h2) = double_hash(key);
        let mut inner = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for i in 0..inner.num_hashes {
            let bit = probe(h1, h2, i, inner.num_bits);
            inner.bits[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let (h1, h2) = double_hash(key);
        let inner = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (0..inner.num_hashes).all(|i| {
            let bit = probe(h1, h2, i, inner.num_bits);
            inner.bits[(bit / 64) as usize] & (1 << (bit % 64)) != 0
        })
    }
}

/// Splits a 128-bit digest of the key into the two seeds for double hashing.
fn double_hash(key: &str) -> (u64, u64) {
    let digest = KeyDigest::digest(key.as_bytes());
    let mut a = [0u8; 8];
    let mut b = [0u8; 8];
    a.copy_from_slice(&digest[..8]);
    b.copy_from_slice(&digest[8..16]);
    (u64::from_le_bytes(a), u64::from_le_bytes(b))
}

fn probe(h1: u64, h2: u64, i: u32, num_bits: u64) -> u64 {
    h1.wrapping_add((i as u64).wrapping_mul(h2)) % num_bits
}
