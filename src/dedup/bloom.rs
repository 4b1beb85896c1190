// src/dedup/bloom.rs
//! Probabilistic membership filter: "possibly seen" with a tunable false
//! positive rate and no false negatives. Bits only ever get set, so relaxed
//! atomics are enough for the fetch workers that share one instance.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct BloomFilter {
    words: Vec<AtomicU64>,
    /// Bit-array size m.
    bits: u64,
    /// Number of probe positions k per key.
    probes: u32,
}

impl BloomFilter {
    /// Size the filter analytically for `expected_items` distinct keys at
    /// `fp_rate` target false-positive probability:
    /// `m = -n·ln(p) / ln²(2)`, `k = (m/n)·ln(2)`.
    pub fn with_rate(expected_items: usize, fp_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = fp_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let bits = ((-n * p.ln()) / (ln2 * ln2)).ceil() as u64;
        let bits = bits.max(64);
        let probes = ((bits as f64 / n) * ln2).round().max(1.0) as u32;

        let words = (0..bits.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        Self { words, bits, probes }
    }

    pub fn bit_size(&self) -> u64 {
        self.bits
    }

    pub fn probe_count(&self) -> u32 {
        self.probes
    }

    /// Set the key's bits. Idempotent.
    pub fn insert(&self, key: &str) {
        for idx in self.positions(key) {
            let (word, mask) = Self::split(idx);
            self.words[word].fetch_or(mask, Ordering::Relaxed);
        }
    }

    /// True if the key was possibly inserted; false means definitely not.
    pub fn contains(&self, key: &str) -> bool {
        self.positions(key).into_iter().all(|idx| {
            let (word, mask) = Self::split(idx);
            self.words[word].load(Ordering::Relaxed) & mask != 0
        })
    }

    /// Double hashing over the two u64 halves of one SHA-256 digest:
    /// position i = h1 + i·h2 (mod m). The stride is forced odd so the k
    /// probes never collapse onto a single bit.
    fn positions(&self, key: &str) -> Vec<u64> {
        let digest = Sha256::digest(key.as_bytes());
        let h1 = u64::from_le_bytes(digest[0..8].try_into().unwrap());
        let h2 = u64::from_le_bytes(digest[8..16].try_into().unwrap()) | 1;

        (0..self.probes as u64)
            .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bits)
            .collect()
    }

    fn split(idx: u64) -> (usize, u64) {
        ((idx / 64) as usize, 1u64 << (idx % 64))
    }
}
