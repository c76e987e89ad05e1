//! Ordered component list with load-time snapshot and tombstones.

use crate::collection::{ComponentDiff, DiffMember};
use crate::component::Component;
use crate::error::{CoreError, CoreResult};
use crate::key::ComponentKey;
use tracing::debug;

/// An ordered list of components that remembers the state it was loaded
/// with and computes minimal persistence operations against it.
///
/// Membership identity is shallow (key) equality, so a member is "the
/// same row" across the snapshot and the current state even when its
/// attributes changed. Removal tombstones the member rather than
/// discarding it: its data stays available for the delete operation
/// until the next [`reconcile`](Self::reconcile).
#[derive(Debug, Clone)]
pub struct ComponentList<T: DiffMember> {
    /// Current members, in user-visible order.
    members: Vec<T>,
    /// Snapshot captured at load time (empty for a new list).
    originals: Vec<T>,
    /// Members removed since the last reconcile.
    tombstones: Vec<T>,
}

impl<T: DiffMember> ComponentList<T> {
    /// Creates an empty list with an empty snapshot.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            originals: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    /// Creates a list from members loaded out of the backing store.
    ///
    /// The loaded state becomes the snapshot: an immediate
    /// [`diff`](Self::diff) is empty.
    pub fn from_loaded(members: Vec<T>) -> Self {
        Self {
            originals: members.clone(),
            members,
            tombstones: Vec::new(),
        }
    }

    /// Appends a member.
    pub fn add(&mut self, member: T) {
        self.members.push(member);
    }

    /// Returns the member at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.members.get(index)
    }

    /// Returns the member at `index` for mutation.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.members.get_mut(index)
    }

    /// Returns the number of current members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true when the list has no current members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over current members in current order.
    ///
    /// The iterator is restartable: call `iter` again for a fresh pass.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    /// Iterates over current members for mutation.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.members.iter_mut()
    }

    /// Removes the member at `index`, tombstoning it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.members.len() {
            return Err(CoreError::invalid_argument(format!(
                "remove index {index} out of range for list of {}",
                self.members.len()
            )));
        }
        let mut member = self.members.remove(index);
        member.ident_mut().mark_deleted();
        self.tombstones.push(member);
        Ok(())
    }

    /// Removes the member matching `key` by shallow equality.
    ///
    /// Returns true when a member was removed.
    pub fn remove_by_key(&mut self, key: &ComponentKey) -> bool {
        match self.members.iter().position(|m| m.key() == key) {
            Some(index) => {
                // index came from the scan above
                self.remove(index).is_ok()
            }
            None => false,
        }
    }

    /// Removes every member matching the predicate, tombstoning each.
    ///
    /// Returns the number of members removed.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.members.len() {
            if predicate(&self.members[index]) {
                let mut member = self.members.remove(index);
                member.ident_mut().mark_deleted();
                self.tombstones.push(member);
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Returns the tombstoned members awaiting the next reconcile.
    pub fn tombstones(&self) -> &[T] {
        &self.tombstones
    }

    /// Computes the minimal persistence operations against the snapshot.
    ///
    /// Current members and snapshot members are paired one-to-one by
    /// shallow equality, so duplicate shallow-equal members (which
    /// multi-valued containers permit) each count once:
    ///
    /// - *inserted*: current members left unpaired, in current order;
    /// - *updated*: paired members whose values changed
    ///   ([`DiffMember::needs_update`]), in current order;
    /// - *deleted*: snapshot members left unpaired, in snapshot order.
    ///   The tombstoned instance is returned when one matches, so delete
    ///   operations see the data as last mutated.
    ///
    /// Tombstoned members that were never in the snapshot (added and
    /// removed within one cycle) appear nowhere.
    ///
    /// Computing a diff does not change the snapshot; a failed persist
    /// attempt can recompute the same diff.
    pub fn diff(&self) -> ComponentDiff<T> {
        let mut diff = ComponentDiff::default();
        let mut paired = vec![false; self.originals.len()];

        for member in &self.members {
            let matched = self
                .originals
                .iter()
                .enumerate()
                .find(|(i, o)| !paired[*i] && o.shallow_eq(member));
            match matched {
                None => diff.inserted.push(member.clone()),
                Some((i, original)) => {
                    paired[i] = true;
                    if member.needs_update(original) {
                        diff.updated.push(member.clone());
                    }
                }
            }
        }

        let mut tombstone_taken = vec![false; self.tombstones.len()];
        for (i, original) in self.originals.iter().enumerate() {
            if paired[i] {
                continue;
            }
            let deleted = match self
                .tombstones
                .iter()
                .enumerate()
                .find(|(j, t)| !tombstone_taken[*j] && t.shallow_eq(original))
            {
                Some((j, tombstone)) => {
                    tombstone_taken[j] = true;
                    tombstone
                }
                None => original,
            };
            diff.deleted.push(deleted.clone());
        }

        debug!(
            inserted = diff.inserted.len(),
            updated = diff.updated.len(),
            deleted = diff.deleted.len(),
            "computed collection diff"
        );
        diff
    }

    /// Replaces the snapshot with the current state after a successful
    /// persist.
    ///
    /// Tombstones are discarded and every member is marked persisted.
    /// This is never implicit: the owner calls it exactly when the
    /// persistence collaborator reports success, so a failure leaves the
    /// old baseline diffable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when a member's key still has
    /// unassigned parts; the snapshot is left untouched in that case.
    pub fn reconcile(&mut self) -> CoreResult<()> {
        if let Some(member) = self.members.iter().find(|m| !m.key().is_assigned()) {
            return Err(CoreError::invalid_argument(format!(
                "cannot reconcile: key parts {:?} are unassigned",
                member.key().unassigned_parts()
            )));
        }
        for member in &mut self.members {
            member.ident_mut().mark_persisted()?;
        }
        self.originals = self.members.clone();
        let dropped = self.tombstones.len();
        self.tombstones.clear();
        debug!(members = self.members.len(), dropped, "reconciled collection");
        Ok(())
    }
}

impl<T: DiffMember> Default for ComponentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: DiffMember> IntoIterator for &'a ComponentList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
