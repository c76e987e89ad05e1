//! Test fixtures: canned id sources, recording backends, sample data.
//!
//! Provides the collaborator doubles used across the workspace's tests
//! so each test does not re-declare its own source and backend.

use cmstore_core::{
    ComponentDiff, CoreError, CoreResult, IdSource, KeyAssignment, PersistenceBackend, Property,
};

/// An [`IdSource`] that hands out consecutive ids and counts round trips.
pub struct SequentialIdSource {
    next: u64,
    /// Number of `allocate_block` calls made so far.
    pub calls: usize,
}

impl SequentialIdSource {
    /// Creates a source whose first id is `start`.
    pub fn new(start: u64) -> Self {
        Self {
            next: start,
            calls: 0,
        }
    }
}

impl IdSource for SequentialIdSource {
    fn allocate_block(&mut self, _lookup: &str, count: usize) -> CoreResult<Vec<u64>> {
        self.calls += 1;
        let block = (self.next..self.next + count as u64).collect();
        self.next += count as u64;
        Ok(block)
    }
}

/// An [`IdSource`] that fails a configured number of times before
/// delegating to a [`SequentialIdSource`].
pub struct FlakyIdSource {
    inner: SequentialIdSource,
    failures_left: usize,
}

impl FlakyIdSource {
    /// Creates a source that fails the first `failures` calls, then
    /// allocates sequentially from `start`.
    pub fn new(start: u64, failures: usize) -> Self {
        Self {
            inner: SequentialIdSource::new(start),
            failures_left: failures,
        }
    }

    /// Number of successful `allocate_block` round trips.
    pub fn calls(&self) -> usize {
        self.inner.calls
    }
}

impl IdSource for FlakyIdSource {
    fn allocate_block(&mut self, lookup: &str, count: usize) -> CoreResult<Vec<u64>> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(CoreError::allocation_failed(lookup, "simulated outage"));
        }
        self.inner.allocate_block(lookup, count)
    }
}

/// A [`PersistenceBackend`] that records every diff it is asked to
/// apply, as `(inserted, updated, deleted)` counts.
pub struct RecordingBackend {
    /// One entry per successful `apply` call.
    pub applied: Vec<(usize, usize, usize)>,
    /// When true, `apply` fails without recording.
    pub fail: bool,
}

impl RecordingBackend {
    /// Creates a backend that accepts every diff.
    pub fn new() -> Self {
        Self {
            applied: Vec::new(),
            fail: false,
        }
    }

    /// Creates a backend that rejects every diff.
    pub fn failing() -> Self {
        Self {
            applied: Vec::new(),
            fail: true,
        }
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PersistenceBackend<T> for RecordingBackend {
    fn apply(&mut self, diff: &ComponentDiff<T>) -> CoreResult<()> {
        if self.fail {
            return Err(CoreError::allocation_failed("store", "backend down"));
        }
        self.applied
            .push((diff.inserted.len(), diff.updated.len(), diff.deleted.len()));
        Ok(())
    }
}

/// Builds a name-as-key property, panicking on invalid input.
pub fn named_property(name: &str, value: &str) -> Property {
    Property::new(name, value).expect("valid property")
}

/// Builds a property whose key carries a store-generated id part.
pub fn id_keyed_property(name: &str, value: &str, id_part: &str) -> Property {
    Property::with_key_assignment(
        name,
        value,
        KeyAssignment::NameAndId {
            id_part: id_part.to_string(),
        },
    )
    .expect("valid property")
}
