//! Content-addressed cache of forward transforms.
//!
//! The doubling loop feeds the same integers into consecutive
//! multiplications (f_k squares in one step and multiplies in the next), so
//! forward transforms repeat. Entries are keyed by FNV-1a over the transform
//! geometry and the operand's limbs; a colliding key merely produces a value
//! keyed for different content, which the geometry check rejects on hit.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;
use tracing::trace;

use crate::fermat::Fermat;
use crate::params::FftParams;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Cache behavior knobs; all callers see one process-wide cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Master switch.
    pub enabled: bool,
    /// Operands below this bit length skip the cache; the transform is
    /// cheaper than the bookkeeping there.
    pub min_bitlen: usize,
    /// Bounded LRU size.
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_bitlen: 100_000,
            max_entries: 256,
        }
    }
}

struct Entry {
    k: u32,
    m: usize,
    values: Vec<Fermat>,
}

struct Inner {
    map: HashMap<u64, Entry>,
    // Most recent at the front.
    order: VecDeque<u64>,
}

/// Bounded LRU of forward-transformed polynomials.
pub struct TransformCache {
    inner: RwLock<Inner>,
    policy: RwLock<CachePolicy>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TransformCache {
    /// An empty cache with the given policy.
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            policy: RwLock::new(policy),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The process-wide cache.
    pub fn global() -> &'static TransformCache {
        static CACHE: OnceLock<TransformCache> = OnceLock::new();
        CACHE.get_or_init(|| TransformCache::new(CachePolicy::default()))
    }

    /// Replace the policy (shrinks the cache if the bound dropped).
    pub fn set_policy(&self, policy: CachePolicy) {
        *self.policy.write() = policy;
        let mut inner = self.inner.write();
        while inner.map.len() > policy.max_entries {
            evict_tail(&mut inner);
        }
    }

    /// Current policy.
    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        *self.policy.read()
    }

    /// FNV-1a over the transform geometry and the operand's limbs.
    #[must_use]
    pub fn content_key(params: FftParams, digits: &[u64]) -> u64 {
        let mut hash = FNV_OFFSET;
        let mut mix = |word: u64| {
            for byte in word.to_le_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        };
        mix(u64::from(params.k));
        mix(params.m as u64);
        for &digit in digits {
            mix(digit);
        }
        hash
    }

    /// Whether an operand of `bits` bits is worth caching at all.
    #[must_use]
    pub fn admits(&self, bits: usize) -> bool {
        let policy = self.policy();
        policy.enabled && bits >= policy.min_bitlen
    }

    /// Look up a transform, refreshing recency and deep-copying the values.
    pub fn get(&self, key: u64, params: FftParams) -> Option<Vec<Fermat>> {
        {
            let inner = self.inner.read();
            match inner.map.get(&key) {
                Some(entry) if entry.k == params.k && entry.m == params.m => {}
                _ => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Re-check under the write lock; the entry may have been evicted.
        let mut inner = self.inner.write();
        let values = match inner.map.get(&key) {
            Some(entry) if entry.k == params.k && entry.m == params.m => entry.values.clone(),
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        if let Some(pos) = inner.order.iter().position(|&k| k == key) {
            inner.order.remove(pos);
        }
        inner.order.push_front(key);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(values)
    }

    /// Insert a transform, evicting from the LRU tail as needed.
    pub fn put(&self, key: u64, params: FftParams, values: Vec<Fermat>) {
        let max_entries = self.policy().max_entries;
        if max_entries == 0 {
            return;
        }
        let entry = Entry {
            k: params.k,
            m: params.m,
            values,
        };

        let mut inner = self.inner.write();
        if inner.map.contains_key(&key) {
            // Refresh in place; no eviction needed.
            if let Some(pos) = inner.order.iter().position(|&k| k == key) {
                inner.order.remove(pos);
            }
        } else {
            while inner.map.len() >= max_entries {
                evict_tail(&mut inner);
            }
        }
        inner.map.insert(key, entry);
        inner.order.push_front(key);
    }

    /// Entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry; counters are untouched.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.map.len();
        inner.map.clear();
        inner.order.clear();
        if dropped > 0 {
            trace!(dropped, "transform cache cleared");
        }
    }

    /// `(hits, misses)` since creation.
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

fn evict_tail(inner: &mut Inner) {
    if let Some(old) = inner.order.pop_back() {
        inner.map.remove(&old);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::fft_params;
    use num_bigint::BigUint;

    fn values(params: FftParams, seed: u64) -> Vec<Fermat> {
        (0..4)
            .map(|i| Fermat::from_biguint(&BigUint::from(seed + i), params.m))
            .collect()
    }

    #[test]
    fn put_get_roundtrip() {
        let cache = TransformCache::new(CachePolicy::default());
        let params = fft_params(100);
        let key = TransformCache::content_key(params, &[1, 2, 3]);

        assert!(cache.get(key, params).is_none());
        cache.put(key, params, values(params, 10));
        let got = cache.get(key, params).unwrap();
        assert_eq!(got, values(params, 10));

        let (hits, misses) = cache.counters();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn geometry_mismatch_is_a_miss() {
        let cache = TransformCache::new(CachePolicy::default());
        let small = fft_params(100);
        let large = fft_params(100_000);
        let key = TransformCache::content_key(small, &[7]);
        cache.put(key, small, values(small, 1));
        assert!(cache.get(key, large).is_none());
    }

    #[test]
    fn content_key_depends_on_limbs_and_geometry() {
        let params = fft_params(100);
        let other = fft_params(100_000);
        let a = TransformCache::content_key(params, &[1, 2, 3]);
        let b = TransformCache::content_key(params, &[1, 2, 4]);
        let c = TransformCache::content_key(other, &[1, 2, 3]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = TransformCache::new(CachePolicy {
            enabled: true,
            min_bitlen: 0,
            max_entries: 2,
        });
        let params = fft_params(100);
        let k1 = TransformCache::content_key(params, &[1]);
        let k2 = TransformCache::content_key(params, &[2]);
        let k3 = TransformCache::content_key(params, &[3]);

        cache.put(k1, params, values(params, 1));
        cache.put(k2, params, values(params, 2));
        // Touch k1 so k2 becomes the tail.
        assert!(cache.get(k1, params).is_some());
        cache.put(k3, params, values(params, 3));

        assert!(cache.get(k1, params).is_some());
        assert!(cache.get(k2, params).is_none());
        assert!(cache.get(k3, params).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn admits_respects_policy() {
        let cache = TransformCache::new(CachePolicy::default());
        assert!(!cache.admits(50_000));
        assert!(cache.admits(100_000));

        cache.set_policy(CachePolicy {
            enabled: false,
            min_bitlen: 0,
            max_entries: 16,
        });
        assert!(!cache.admits(1_000_000));
    }

    #[test]
    fn shrinking_policy_evicts() {
        let cache = TransformCache::new(CachePolicy {
            enabled: true,
            min_bitlen: 0,
            max_entries: 8,
        });
        let params = fft_params(100);
        for i in 0..8u64 {
            cache.put(
                TransformCache::content_key(params, &[i]),
                params,
                values(params, i),
            );
        }
        assert_eq!(cache.len(), 8);
        cache.set_policy(CachePolicy {
            enabled: true,
            min_bitlen: 0,
            max_entries: 3,
        });
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn clear_empties() {
        let cache = TransformCache::new(CachePolicy::default());
        let params = fft_params(100);
        cache.put(TransformCache::content_key(params, &[9]), params, values(params, 9));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_same_key_keeps_single_entry() {
        let cache = TransformCache::new(CachePolicy::default());
        let params = fft_params(100);
        let key = TransformCache::content_key(params, &[5]);
        cache.put(key, params, values(params, 1));
        cache.put(key, params, values(params, 2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(key, params).unwrap(), values(params, 2));
    }

    #[test]
    fn concurrent_access_is_safe() {
        use std::sync::Arc;
        let cache = Arc::new(TransformCache::new(CachePolicy {
            enabled: true,
            min_bitlen: 0,
            max_entries: 64,
        }));
        let params = fft_params(100);
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..32 {
                        let key = TransformCache::content_key(params, &[t * 100 + i]);
                        cache.put(key, params, values(params, i));
                        let _ = cache.get(key, params);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
