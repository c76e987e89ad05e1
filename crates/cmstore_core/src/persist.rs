//! Persistence orchestration: key allocation, diffing, reconciliation.

use crate::allocator::{CachingAllocator, IdSource};
use crate::collection::{ComponentDiff, ComponentList, DiffMember};
use crate::component::Component;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use tracing::debug;

/// The collaborator that executes store operations.
///
/// Implementations consume a collection's diff and issue the
/// corresponding inserts, updates, and deletes, reporting success or
/// failure back so the caller can reconcile its snapshot. The core
/// never retries on this boundary.
pub trait PersistenceBackend<T> {
    /// Applies the diff to the backing store.
    fn apply(&mut self, diff: &ComponentDiff<T>) -> CoreResult<()>;
}

/// Capability for components whose key contains a server-generated part.
pub trait GeneratedKey: Component {
    /// Returns the id-sequence lookup name for the generated key part,
    /// or `None` when this component's key needs no generated id.
    fn id_lookup(&self) -> Option<&str>;

    /// Binds an allocated id to the generated key part.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMutation` when the component has no generated
    /// key part.
    fn apply_generated_id(&mut self, id: u64) -> CoreResult<()>;
}

/// Persists a list: allocates identities, applies the diff, reconciles.
///
/// The full persistence cycle in one call:
///
/// 1. every member whose key still has unassigned parts gets an id from
///    the allocator (blocks are sized to the number of members sharing a
///    lookup, so N new members cost one allocation round trip);
/// 2. the list's diff is computed and handed to the backend, unless it
///    is empty;
/// 3. on backend success the list is reconciled, so the next diff is
///    empty; on failure the baseline is left untouched and the same diff
///    can be recomputed — members keep any ids already assigned, which
///    are simply reused by the retry.
///
/// Returns the diff that was applied (possibly empty).
///
/// # Errors
///
/// Propagates allocation and backend failures; fails with
/// `InvalidArgument` when a member needs a generated id but names no
/// lookup.
pub fn persist_list<T, S, B>(
    list: &mut ComponentList<T>,
    allocator: &mut CachingAllocator<S>,
    backend: &mut B,
) -> CoreResult<ComponentDiff<T>>
where
    T: DiffMember + GeneratedKey,
    S: IdSource,
    B: PersistenceBackend<T>,
{
    // Size allocation blocks to the demand per lookup name.
    let mut demand: HashMap<String, usize> = HashMap::new();
    for member in list.iter() {
        if member.key().is_assigned() {
            continue;
        }
        let lookup = member.id_lookup().ok_or_else(|| {
            CoreError::invalid_argument(format!(
                "key parts {:?} need a generated id but the component names no lookup",
                member.key().unassigned_parts()
            ))
        })?;
        *demand.entry(lookup.to_string()).or_insert(0) += 1;
    }

    for member in list.iter_mut() {
        if member.key().is_assigned() {
            continue;
        }
        // checked above
        let lookup = member
            .id_lookup()
            .ok_or_else(|| CoreError::invalid_argument("missing id lookup"))?
            .to_string();
        let block = demand.get(&lookup).copied().unwrap_or(1);
        let id = allocator.allocate_id_with_block(&lookup, block)?;
        member.apply_generated_id(id)?;
    }

    let diff = list.diff();
    if !diff.is_empty() {
        debug!(operations = diff.len(), "applying collection diff");
        backend.apply(&diff)?;
    }
    list.reconcile()?;
    Ok(diff)
}
