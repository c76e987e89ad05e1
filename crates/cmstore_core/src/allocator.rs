//! Block-based id allocation with a client-side cache.

use crate::error::{CoreError, CoreResult};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// The id-allocation collaborator boundary.
///
/// Implementations reserve blocks of surrogate ids for a named
/// id-sequence, typically with a server round trip. A block may be
/// shorter than requested when the pool is nearly exhausted; returning
/// an empty block for a non-zero request is a failure the source must
/// report, never a silent rounding. The core does not retry on this
/// boundary; retry policy, if any, belongs to the implementation.
pub trait IdSource {
    /// Reserves up to `count` new ids for `lookup`.
    ///
    /// Returned ids must never have been dispensed before.
    fn allocate_block(&mut self, lookup: &str, count: usize) -> CoreResult<Vec<u64>>;
}

/// An id allocator that amortizes round trips by caching blocks.
///
/// Ids fetched in a block but not yet handed out are kept per lookup
/// name and consumed FIFO before any new block is requested. The cache
/// is process-local, in-memory state: ids left in it when the process
/// exits are forfeited, which is harmless for opaque surrogate keys.
///
/// Not safe for concurrent use; callers sharing an allocator across
/// threads must serialize access externally.
pub struct CachingAllocator<S: IdSource> {
    source: S,
    cache: HashMap<String, VecDeque<u64>>,
    /// One-shot block-size hint, default 1. See
    /// [`set_next_allocation_size`](Self::set_next_allocation_size).
    next_allocation_size: usize,
}

impl<S: IdSource> CachingAllocator<S> {
    /// Creates an allocator over the given source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
            next_allocation_size: 1,
        }
    }

    /// Reserves up to `count` ids directly from the source.
    ///
    /// This bypasses the cache entirely: nothing is served from it and
    /// nothing is added to it. The result may be shorter than `count`
    /// when the pool is nearly exhausted, so callers must check the
    /// returned length rather than assume it equals the request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `count == 0` and propagates any
    /// source failure unchanged.
    pub fn allocate_ids(&mut self, lookup: &str, count: usize) -> CoreResult<Vec<u64>> {
        if count == 0 {
            return Err(CoreError::invalid_argument(
                "id allocation count must be at least 1",
            ));
        }
        let ids = self.source.allocate_block(lookup, count)?;
        if ids.is_empty() {
            return Err(CoreError::allocation_failed(
                lookup,
                "source returned an empty block",
            ));
        }
        if ids.len() < count {
            debug!(lookup, requested = count, returned = ids.len(), "short id block");
        }
        Ok(ids)
    }

    /// Sets the block size for the very next [`allocate_id`](Self::allocate_id) call.
    ///
    /// The hint is one-shot: it is consumed (reset to 1) by the next
    /// `allocate_id` call, whether that call hits the cache or fetches a
    /// block. It does not affect [`allocate_ids`](Self::allocate_ids) or
    /// [`allocate_id_with_block`](Self::allocate_id_with_block). Callers
    /// wanting an override that cannot be missed should prefer
    /// `allocate_id_with_block`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `count == 0`.
    pub fn set_next_allocation_size(&mut self, count: usize) -> CoreResult<()> {
        if count == 0 {
            return Err(CoreError::invalid_argument(
                "next allocation size must be at least 1",
            ));
        }
        self.next_allocation_size = count;
        Ok(())
    }

    /// Returns one id for `lookup`.
    ///
    /// Serves from the per-lookup cache when possible; otherwise fetches
    /// a block of the current one-shot hint size (minimum 1), returns
    /// the first id, and caches the remainder in order. The hint resets
    /// to 1 after this call regardless of cache hit or miss.
    ///
    /// # Errors
    ///
    /// Propagates source failures. Ids cached by earlier successful
    /// fetches remain valid and are still served afterwards.
    pub fn allocate_id(&mut self, lookup: &str) -> CoreResult<u64> {
        let block = self.next_allocation_size.max(1);
        self.next_allocation_size = 1;
        self.take_one(lookup, block)
    }

    /// Returns one id for `lookup`, fetching a block of `block_size` on
    /// a cache miss.
    ///
    /// This is the explicit-override form of [`allocate_id`](Self::allocate_id):
    /// the block size travels with the call, so it cannot be lost to the
    /// one-shot hint's reset. The hint itself is neither consumed nor
    /// altered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `block_size == 0` and propagates
    /// source failures.
    pub fn allocate_id_with_block(&mut self, lookup: &str, block_size: usize) -> CoreResult<u64> {
        if block_size == 0 {
            return Err(CoreError::invalid_argument(
                "block size must be at least 1",
            ));
        }
        self.take_one(lookup, block_size)
    }

    /// Returns the number of cached, undispensed ids for `lookup`.
    pub fn cached_ids(&self, lookup: &str) -> usize {
        self.cache.get(lookup).map_or(0, VecDeque::len)
    }

    /// Returns the underlying id source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the underlying id source for mutation.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn take_one(&mut self, lookup: &str, block: usize) -> CoreResult<u64> {
        if let Some(id) = self.cache.get_mut(lookup).and_then(VecDeque::pop_front) {
            return Ok(id);
        }
        let mut ids = self.allocate_ids(lookup, block)?;
        debug!(lookup, block, fetched = ids.len(), "fetched id block");
        let first = ids.remove(0);
        if !ids.is_empty() {
            self.cache
                .entry(lookup.to_string())
                .or_default()
                .extend(ids);
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts round trips and dispenses sequential ids per lookup.
    struct CountingSource {
        next: HashMap<String, u64>,
        calls: usize,
        /// When set, blocks are capped at this many ids.
        pool_cap: Option<usize>,
        fail: bool,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                next: HashMap::new(),
                calls: 0,
                pool_cap: None,
                fail: false,
            }
        }

        fn starting_at(start: u64) -> Self {
            let mut source = Self::new();
            source.next.insert("CTYPE".to_string(), start);
            source
        }
    }

    impl IdSource for CountingSource {
        fn allocate_block(&mut self, lookup: &str, count: usize) -> CoreResult<Vec<u64>> {
            self.calls += 1;
            if self.fail {
                return Err(CoreError::allocation_failed(lookup, "generator unavailable"));
            }
            let issued = self.pool_cap.map_or(count, |cap| count.min(cap));
            let next = self.next.entry(lookup.to_string()).or_insert(0);
            let block = (*next..*next + issued as u64).collect();
            *next += issued as u64;
            Ok(block)
        }
    }

    #[test]
    fn sequential_ids_are_distinct() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        let mut seen = Vec::new();
        for _ in 0..20 {
            let id = allocator.allocate_id("CTYPE").unwrap();
            assert!(!seen.contains(&id));
            seen.push(id);
        }
    }

    #[test]
    fn hint_batches_one_round_trip() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.set_next_allocation_size(5).unwrap();

        allocator.allocate_id("CTYPE").unwrap();
        assert_eq!(allocator.source.calls, 1);
        assert_eq!(allocator.cached_ids("CTYPE"), 4);

        // calls 2..=5 are served from the cache
        for _ in 0..4 {
            allocator.allocate_id("CTYPE").unwrap();
        }
        assert_eq!(allocator.source.calls, 1);
        assert_eq!(allocator.cached_ids("CTYPE"), 0);
    }

    #[test]
    fn seeded_cache_scenario() {
        // allocateIds("CTYPE", 5) -> [10..14], then 5 allocate_id calls
        // return exactly that sequence with zero further round trips.
        let mut allocator = CachingAllocator::new(CountingSource::starting_at(10));
        allocator.set_next_allocation_size(5).unwrap();

        let mut issued = Vec::new();
        for _ in 0..5 {
            issued.push(allocator.allocate_id("CTYPE").unwrap());
        }
        assert_eq!(issued, vec![10, 11, 12, 13, 14]);
        assert_eq!(allocator.source.calls, 1);
    }

    #[test]
    fn hint_resets_after_next_call() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.set_next_allocation_size(3).unwrap();
        allocator.allocate_id("A").unwrap(); // consumes the hint, caches 2

        // Drain the cache, then the next miss fetches a block of 1.
        allocator.allocate_id("A").unwrap();
        allocator.allocate_id("A").unwrap();
        allocator.allocate_id("A").unwrap();
        assert_eq!(allocator.source.calls, 2);
        assert_eq!(allocator.cached_ids("A"), 0);
    }

    #[test]
    fn hint_resets_even_on_cache_hit() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.set_next_allocation_size(2).unwrap();
        allocator.allocate_id("A").unwrap(); // fetches 2, caches 1

        // Hit: the hint set here must still be consumed by this call.
        allocator.set_next_allocation_size(50).unwrap();
        allocator.allocate_id("A").unwrap();

        // Miss: block size is back to 1, not 50.
        allocator.allocate_id("A").unwrap();
        assert_eq!(allocator.cached_ids("A"), 0);
        assert_eq!(allocator.source.calls, 2);
    }

    #[test]
    fn explicit_block_override() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.allocate_id_with_block("A", 10).unwrap();
        assert_eq!(allocator.source.calls, 1);
        assert_eq!(allocator.cached_ids("A"), 9);

        // Does not touch the one-shot hint.
        allocator.set_next_allocation_size(4).unwrap();
        allocator.allocate_id_with_block("B", 1).unwrap();
        assert_eq!(allocator.next_allocation_size, 4);
    }

    #[test]
    fn caches_are_per_lookup() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.allocate_id_with_block("A", 3).unwrap();
        allocator.allocate_id_with_block("B", 3).unwrap();
        assert_eq!(allocator.cached_ids("A"), 2);
        assert_eq!(allocator.cached_ids("B"), 2);
    }

    #[test]
    fn zero_counts_rejected() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        assert!(allocator.allocate_ids("A", 0).is_err());
        assert!(allocator.set_next_allocation_size(0).is_err());
        assert!(allocator.allocate_id_with_block("A", 0).is_err());
    }

    #[test]
    fn short_block_is_not_an_error() {
        let mut source = CountingSource::new();
        source.pool_cap = Some(2);
        let mut allocator = CachingAllocator::new(source);

        let ids = allocator.allocate_ids("A", 5).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn empty_block_is_an_error() {
        let mut source = CountingSource::new();
        source.pool_cap = Some(0);
        let mut allocator = CachingAllocator::new(source);
        assert!(matches!(
            allocator.allocate_ids("A", 3),
            Err(CoreError::AllocationFailed { .. })
        ));
    }

    #[test]
    fn source_failure_keeps_cached_ids_usable() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.allocate_id_with_block("A", 3).unwrap();
        assert_eq!(allocator.cached_ids("A"), 2);

        allocator.source.fail = true;
        // Cache hits still succeed while the source is down.
        allocator.allocate_id("A").unwrap();
        allocator.allocate_id("A").unwrap();
        // Now the cache is empty and the failure propagates.
        assert!(allocator.allocate_id("A").is_err());
    }

    #[test]
    fn allocate_ids_bypasses_cache() {
        let mut allocator = CachingAllocator::new(CountingSource::new());
        allocator.allocate_id_with_block("A", 3).unwrap();
        let cached_before = allocator.cached_ids("A");

        allocator.allocate_ids("A", 2).unwrap();
        assert_eq!(allocator.cached_ids("A"), cached_before);
    }
}
