//! Keyed component collection with natural-key uniqueness.

use crate::collection::{ComponentDiff, ComponentList, DiffMember};
use crate::component::Component;
use crate::error::{CoreError, CoreResult};

/// Capability for components with a natural lookup key.
///
/// The natural key (typically a name) identifies a member within its
/// owning [`ComponentSet`]; comparison is case-insensitive.
pub trait NaturalKey {
    /// Returns the natural lookup key.
    fn natural_key(&self) -> &str;
}

/// A [`ComponentList`] that additionally enforces natural-key
/// uniqueness at insertion and offers name/id lookup.
///
/// Uniqueness is enforced when members enter the set, not at lookup:
/// `find_by_name` simply returns the first case-insensitive match.
#[derive(Debug, Clone)]
pub struct ComponentSet<T: DiffMember + NaturalKey> {
    list: ComponentList<T>,
}

impl<T: DiffMember + NaturalKey> Default for ComponentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DiffMember + NaturalKey> ComponentSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            list: ComponentList::new(),
        }
    }

    /// Creates a set from members loaded out of the backing store.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` when two loaded members share a natural
    /// key; a store that produced such data must not load successfully.
    pub fn from_loaded(members: Vec<T>) -> CoreResult<Self> {
        for (index, member) in members.iter().enumerate() {
            let duplicate = members[..index]
                .iter()
                .any(|m| m.natural_key().eq_ignore_ascii_case(member.natural_key()));
            if duplicate {
                return Err(CoreError::duplicate_key(member.natural_key()));
            }
        }
        Ok(Self {
            list: ComponentList::from_loaded(members),
        })
    }

    /// Inserts a member.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` when the natural key is already present.
    pub fn insert(&mut self, member: T) -> CoreResult<()> {
        if self.find_by_name(member.natural_key()).is_some() {
            return Err(CoreError::duplicate_key(member.natural_key()));
        }
        self.list.add(member);
        Ok(())
    }

    /// Returns the first member whose natural key matches `name`,
    /// case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.list
            .iter()
            .find(|m| m.natural_key().eq_ignore_ascii_case(name))
    }

    /// Returns the first member with the given storage id.
    pub fn find_by_id(&self, id: u64) -> Option<&T> {
        self.list.iter().find(|m| m.id() == id)
    }

    /// Removes the member whose natural key matches `name`,
    /// tombstoning it. Returns true when a member was removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        self.list
            .remove_where(|m| m.natural_key().eq_ignore_ascii_case(name))
            > 0
    }

    /// Returns the number of current members.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true when the set has no current members.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Iterates over current members in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.list.iter()
    }

    /// Computes the persistence diff. See [`ComponentList::diff`].
    pub fn diff(&self) -> ComponentDiff<T> {
        self.list.diff()
    }

    /// Replaces the snapshot after a successful persist.
    /// See [`ComponentList::reconcile`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when a member's key is unassigned.
    pub fn reconcile(&mut self) -> CoreResult<()> {
        self.list.reconcile()
    }

    /// Returns the underlying list.
    pub fn as_list(&self) -> &ComponentList<T> {
        &self.list
    }

    /// Returns the underlying list for mutation.
    ///
    /// Mutations through the list bypass the natural-key uniqueness
    /// check.
    pub fn as_list_mut(&mut self) -> &mut ComponentList<T> {
        &mut self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::tests::Slot;

    impl NaturalKey for Slot {
        fn natural_key(&self) -> &str {
            &self.label
        }
    }

    #[test]
    fn insert_enforces_uniqueness() {
        let mut set = ComponentSet::new();
        set.insert(Slot::new("1", "body")).unwrap();
        let err = set.insert(Slot::new("2", "BODY")).unwrap_err();
        assert_eq!(err, CoreError::duplicate_key("BODY"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let mut set = ComponentSet::new();
        set.insert(Slot::new("1", "Sidebar")).unwrap();
        assert!(set.find_by_name("sidebar").is_some());
        assert!(set.find_by_name("SIDEBAR").is_some());
        assert!(set.find_by_name("other").is_none());
    }

    #[test]
    fn find_by_id() {
        let mut set = ComponentSet::new();
        let mut slot = Slot::loaded("1", "body");
        slot.ident_mut().set_id(42);
        set.insert(slot).unwrap();

        assert!(set.find_by_id(42).is_some());
        assert!(set.find_by_id(7).is_none());
    }

    #[test]
    fn from_loaded_rejects_duplicates() {
        let err =
            ComponentSet::from_loaded(vec![Slot::loaded("1", "a"), Slot::loaded("2", "A")])
                .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
    }

    #[test]
    fn remove_by_name_tombstones() {
        let mut set =
            ComponentSet::from_loaded(vec![Slot::loaded("1", "a"), Slot::loaded("2", "b")])
                .unwrap();
        assert!(set.remove_by_name("A"));
        assert!(!set.remove_by_name("A"));
        assert_eq!(set.diff().deleted.len(), 1);
    }

    #[test]
    fn set_diff_and_reconcile_delegate() {
        let mut set = ComponentSet::from_loaded(vec![Slot::loaded("1", "a")]).unwrap();
        set.insert(Slot::new("2", "b")).unwrap();
        assert_eq!(set.diff().inserted.len(), 1);

        set.reconcile().unwrap();
        assert!(set.diff().is_empty());
    }

    #[test]
    fn reinserting_after_removal_is_allowed() {
        let mut set = ComponentSet::from_loaded(vec![Slot::loaded("1", "a")]).unwrap();
        set.remove_by_name("a");
        set.insert(Slot::new("1", "a")).unwrap();
        // same key removed and re-added: net effect is no change
        let diff = set.diff();
        assert!(diff.deleted.is_empty());
        assert!(diff.inserted.is_empty());
    }
}
