//! Reference [`BloomFilter`] implementations.
//!
//! Not the production filter — the bit array and on-disk layout are kept out
//! of scope for this crate — but a real, non-stub Bloom filter so
//! `check_keys`/`set_keys` exercise genuine membership semantics in tests.

use std::fmt;
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use siphasher::sip::SipHasher13;

use super::{BloomFilter, FilterFactory};
use crate::config::FilterConfig;
use crate::error::Result;

/// In-memory Bloom filter using double hashing: `h_i(x) = h1(x) + i * h2(x)`.
pub struct MemoryFilter {
    bits: Mutex<Vec<u64>>,
    num_bits: u64,
    num_hashes: u32,
    inserted: AtomicU64,
    closed: AtomicBool,
}

impl fmt::Debug for MemoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("inserted", &self.inserted.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let capacity = config.capacity.max(1) as f64;
        let p = config.fp_probability.clamp(1.0e-9, 0.5);
        let num_bits = (-(capacity * p.ln()) / (std::f64::consts::LN_2.powi(2)))
            .ceil()
            .max(64.0) as u64;
        let num_hashes = ((num_bits as f64 / capacity) * std::f64::consts::LN_2)
            .round()
            .clamp(1.0, 24.0) as u32;
        let words = (num_bits as usize / 64) + 1;
        Self {
            bits: Mutex::new(vec![0u64; words]),
            num_bits: words as u64 * 64,
            num_hashes,
            inserted: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    fn hash_pair(key: &[u8]) -> (u64, u64) {
        let mut h1 = SipHasher13::new_with_keys(0x5bd1_e995_ddee_35d3, 0x1234_5678_9abc_def0);
        h1.write(key);
        let mut h2 = SipHasher13::new_with_keys(0x2545_f491_4f6c_dd1d, 0x0fed_cba9_8765_4321);
        h2.write(key);
        (h1.finish(), h2.finish())
    }

    fn bit_positions(&self, key: &[u8]) -> impl Iterator<Item = u64> + '_ {
        let (h1, h2) = Self::hash_pair(key);
        (0..self.num_hashes as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits)
    }
}

impl BloomFilter for MemoryFilter {
    fn contains(&self, key: &[u8]) -> Result<bool> {
        let bits = self.bits.lock();
        Ok(self
            .bit_positions(key)
            .all(|pos| bits[(pos / 64) as usize] & (1 << (pos % 64)) != 0))
    }

    fn add(&self, key: &[u8]) -> Result<bool> {
        let mut bits = self.bits.lock();
        let mut already_set = true;
        for pos in self.bit_positions(key) {
            let word = &mut bits[(pos / 64) as usize];
            let mask = 1u64 << (pos % 64);
            if *word & mask == 0 {
                already_set = false;
                *word |= mask;
            }
        }
        drop(bits);
        if !already_set {
            self.inserted.fetch_add(1, Ordering::Relaxed);
        }
        Ok(!already_set)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        self.closed.store(true, Ordering::Relaxed);
        self.bits.lock().clear();
        Ok(())
    }

    fn is_proxied(&self) -> bool {
        false
    }
}

/// Builds [`MemoryFilter`]s. `fresh` is ignored: the in-memory filter has no
/// on-disk state to discover, so "open existing" degenerates to "create
/// empty", matching a cold-start reload of a filter whose original contents
/// were never persisted.
#[derive(Debug, Default)]
pub struct MemoryFilterFactory;

impl FilterFactory for MemoryFilterFactory {
    fn init(
        &self,
        config: &FilterConfig,
        _name: &[u8],
        _fresh: bool,
    ) -> Result<Box<dyn BloomFilter>> {
        Ok(Box::new(MemoryFilter::new(config)))
    }
}

/// A filter whose state is provided indirectly. Exists so `clear()` and the
/// cold-sweep's proxied-skip rule have something to exercise; `contains`/
/// `add` delegate to an inner [`MemoryFilter`].
#[derive(Debug)]
pub struct ProxyFilter {
    inner: MemoryFilter,
}

impl ProxyFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            inner: MemoryFilter::new(config),
        }
    }
}

impl BloomFilter for ProxyFilter {
    fn contains(&self, key: &[u8]) -> Result<bool> {
        self.inner.contains(key)
    }

    fn add(&self, key: &[u8]) -> Result<bool> {
        self.inner.add(key)
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn delete(&self) -> Result<()> {
        self.inner.delete()
    }

    fn is_proxied(&self) -> bool {
        true
    }
}

/// Builds [`ProxyFilter`]s.
#[derive(Debug, Default)]
pub struct ProxyFilterFactory;

impl FilterFactory for ProxyFilterFactory {
    fn init(
        &self,
        config: &FilterConfig,
        _name: &[u8],
        _fresh: bool,
    ) -> Result<Box<dyn BloomFilter>> {
        Ok(Box::new(ProxyFilter::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_reports_no_members() {
        let filter = MemoryFilter::new(&FilterConfig::default());
        assert!(!filter.contains(b"anything").unwrap());
    }

    #[test]
    fn add_then_contains() {
        let filter = MemoryFilter::new(&FilterConfig::default());
        assert!(filter.add(b"a").unwrap());
        assert!(!filter.add(b"a").unwrap());
        assert!(filter.contains(b"a").unwrap());
        assert!(!filter.contains(b"zzz-not-inserted").unwrap());
    }

    #[test]
    fn proxy_filter_reports_proxied() {
        let filter = ProxyFilter::new(&FilterConfig::default());
        assert!(filter.is_proxied());
        let plain = MemoryFilter::new(&FilterConfig::default());
        assert!(!plain.is_proxied());
    }
}
