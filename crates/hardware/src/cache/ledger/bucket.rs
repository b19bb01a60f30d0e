//! Bucket-sampling victim selection (Random and Sequential).
//!
//! Neither policy keeps bookkeeping of its own: the victim is read straight
//! out of the block store's hash buckets.
//!
//! - **Random** draws a bucket index uniformly, redraws while the bucket is
//!   empty, then draws uniformly within the bucket. The result is uniform over
//!   non-empty buckets, not over blocks: a block sharing its bucket with
//!   others is less likely to be picked than a block alone in its bucket.
//!   Existing experiments depend on this distribution, so it is kept as is.
//! - **Sequential** returns the first block of the first non-empty bucket.
//!   Deterministic, and blind to access history.
//!
//! Random numbers come from a xorshift64 generator, avoiding the overhead of
//! a general purpose RNG and keeping runs reproducible from the seed.

use crate::cache::store::BlockStore;
use crate::common::Addr;

/// Random bucket sampler state.
#[derive(Debug, Clone)]
pub struct RandomBucket {
    /// Internal state for the pseudo-random number generator.
    state: u64,
}

impl RandomBucket {
    /// Fallback seed; xorshift never leaves the all-zero state.
    const ZERO_SEED_REPLACEMENT: u64 = 123456789;

    /// Creates a sampler from `seed`.
    pub const fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            Self::ZERO_SEED_REPLACEMENT
        } else {
            seed
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Returns a value in `lo..=hi`.
    pub fn random(&mut self, lo: usize, hi: usize) -> usize {
        debug_assert!(lo <= hi);
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as usize
    }

    /// Picks a victim from `store`, or `None` if the store is empty.
    pub fn pick(&mut self, store: &BlockStore) -> Option<Addr> {
        if store.is_empty() {
            return None;
        }
        let last_bucket = store.bucket_count() - 1;
        let bucket = loop {
            let bucket = self.random(0, last_bucket);
            tracing::trace!(target: "insert", bucket, size = store.bucket_len(bucket), "random bucket");
            if store.bucket_len(bucket) > 0 {
                break bucket;
            }
        };
        let entry = self.random(0, store.bucket_len(bucket) - 1);
        Some(store.bucket(bucket)[entry].addr)
    }
}

/// Returns the first block of the first non-empty bucket.
pub fn first_in_bucket_order(store: &BlockStore) -> Option<Addr> {
    (0..store.bucket_count())
        .find(|&bucket| store.bucket_len(bucket) > 0)
        .map(|bucket| store.bucket(bucket)[0].addr)
}
