//! Component capabilities: identity, lifecycle state, two-tier equality.

use crate::error::CoreResult;
use crate::key::ComponentKey;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lifecycle state of a persisted component.
///
/// Transitions: `New` components gain a persisted key and become
/// `Persisted` on the first successful persistence cycle; any setter on
/// a `Persisted` component makes it `Modified`; removal from an owning
/// collection makes it `Deleted` (the data is retained in the
/// collection's tombstone list until the next reconcile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Never persisted; needs an insert.
    New,
    /// Matches the stored row.
    Persisted,
    /// Persisted, but changed since load; needs an update.
    Modified,
    /// Removed from its owning collection; needs a delete.
    Deleted,
}

impl ComponentState {
    /// Returns true when the component requires a persistence action
    /// other than delete.
    pub fn is_dirty(&self) -> bool {
        matches!(self, ComponentState::New | ComponentState::Modified)
    }
}

/// The identity core every concrete component embeds.
///
/// Components are assembled by composition rather than inheritance: a
/// concrete type owns a `ComponentIdent` (id, key, lifecycle state) and
/// implements the capability traits that apply to it ([`Component`],
/// [`ComponentEq`], and optionally `Versioned`, `Sequenced`).
#[derive(Debug, Clone)]
pub struct ComponentIdent {
    /// Opaque storage id; 0 means unset.
    id: u64,
    key: ComponentKey,
    state: ComponentState,
}

impl ComponentIdent {
    /// Creates the identity of a brand-new component.
    pub fn new(key: ComponentKey) -> Self {
        Self {
            id: 0,
            key,
            state: ComponentState::New,
        }
    }

    /// Creates the identity of a component reconstructed from the store.
    ///
    /// The key is marked persisted and the state starts at `Persisted`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the key has unassigned parts.
    pub fn loaded(mut key: ComponentKey, id: u64) -> CoreResult<Self> {
        key.mark_persisted()?;
        Ok(Self {
            id,
            key,
            state: ComponentState::Persisted,
        })
    }

    /// Returns the opaque storage id (0 = unset).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sets the opaque storage id.
    ///
    /// Changing the id marks the component's identity changed.
    pub fn set_id(&mut self, id: u64) {
        if self.id != id {
            self.id = id;
            self.touch();
        }
    }

    /// Returns the composite key.
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Returns the composite key for mutation.
    ///
    /// Callers changing key parts should follow up with [`touch`](Self::touch).
    pub fn key_mut(&mut self) -> &mut ComponentKey {
        &mut self.key
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Returns true when the component is `New` or `Modified`.
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Records that a persisted attribute changed.
    ///
    /// `Persisted` becomes `Modified`; `New`, `Modified`, and `Deleted`
    /// are unchanged.
    pub fn touch(&mut self) {
        if self.state == ComponentState::Persisted {
            self.state = ComponentState::Modified;
        }
    }

    /// Records removal from the owning collection.
    pub fn mark_deleted(&mut self) {
        self.state = ComponentState::Deleted;
    }

    /// Records a successful persistence cycle: the key now names a
    /// stored row and the state returns to `Persisted`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the key still has unassigned parts.
    pub fn mark_persisted(&mut self) -> CoreResult<()> {
        self.key.mark_persisted()?;
        self.state = ComponentState::Persisted;
        Ok(())
    }
}

/// Base capability of every persisted entity.
pub trait Component: Clone {
    /// Fixed XML element name of this concrete variant.
    const NODE_NAME: &'static str;

    /// Returns the identity core.
    fn ident(&self) -> &ComponentIdent;

    /// Returns the identity core for mutation.
    fn ident_mut(&mut self) -> &mut ComponentIdent;

    /// Returns the composite key.
    fn key(&self) -> &ComponentKey {
        self.ident().key()
    }

    /// Returns the opaque storage id (0 = unset).
    fn id(&self) -> u64 {
        self.ident().id()
    }

    /// Returns the lifecycle state.
    fn state(&self) -> ComponentState {
        self.ident().state()
    }

    /// Returns true when the component needs an insert or update.
    fn is_dirty(&self) -> bool {
        self.ident().is_dirty()
    }
}

/// Two-tier equality for components.
///
/// The two levels are deliberately separate named functions rather than
/// a single overridable `eq`:
///
/// - **shallow**: same concrete variant (guaranteed by `Self`) and equal
///   key. Detects "same logical row" regardless of attribute values.
/// - **full**: shallow equality plus every persisted attribute, and the
///   version counter where the type is versioned. Detects "needs update".
///
/// Each implementation documents exactly which fields its full level
/// includes. Position metadata of sequenced components is excluded from
/// both levels.
///
/// The hash functions must be consistent with the matching equality
/// level: values equal under a level hash equal under that level's
/// function.
pub trait ComponentEq: Component {
    /// Identity-level equality: key only.
    fn shallow_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// Value-level equality: shallow equality plus all persisted
    /// attributes.
    fn full_eq(&self, other: &Self) -> bool;

    /// Hash consistent with [`shallow_eq`](Self::shallow_eq).
    fn shallow_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.key().hash(&mut hasher);
        hasher.finish()
    }

    /// Hash consistent with [`full_eq`](Self::full_eq).
    fn full_hash(&self) -> u64;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::key::ComponentKey;

    /// Minimal concrete component used across the crate's tests.
    #[derive(Debug, Clone)]
    pub(crate) struct Slot {
        pub(crate) ident: ComponentIdent,
        pub(crate) label: String,
    }

    impl Slot {
        pub(crate) fn new(id_part: &str, label: &str) -> Self {
            let key = ComponentKey::with_values(&["SLOTID"], &[id_part], false).unwrap();
            Self {
                ident: ComponentIdent::new(key),
                label: label.to_string(),
            }
        }

        pub(crate) fn loaded(id_part: &str, label: &str) -> Self {
            let key = ComponentKey::with_values(&["SLOTID"], &[id_part], false).unwrap();
            Self {
                ident: ComponentIdent::loaded(key, 0).unwrap(),
                label: label.to_string(),
            }
        }

        pub(crate) fn set_label(&mut self, label: &str) {
            if self.label != label {
                self.label = label.to_string();
                self.ident.touch();
            }
        }
    }

    impl Component for Slot {
        const NODE_NAME: &'static str = "Slot";

        fn ident(&self) -> &ComponentIdent {
            &self.ident
        }

        fn ident_mut(&mut self) -> &mut ComponentIdent {
            &mut self.ident
        }
    }

    // Full equality covers: key, label.
    impl ComponentEq for Slot {
        fn full_eq(&self, other: &Self) -> bool {
            self.shallow_eq(other) && self.label == other.label
        }

        fn full_hash(&self) -> u64 {
            let mut hasher = DefaultHasher::new();
            self.key().hash(&mut hasher);
            self.label.hash(&mut hasher);
            hasher.finish()
        }
    }

    #[test]
    fn new_component_is_dirty() {
        let slot = Slot::new("1", "body");
        assert_eq!(slot.state(), ComponentState::New);
        assert!(slot.is_dirty());
        assert_eq!(slot.id(), 0);
    }

    #[test]
    fn loaded_component_is_clean() {
        let slot = Slot::loaded("1", "body");
        assert_eq!(slot.state(), ComponentState::Persisted);
        assert!(!slot.is_dirty());
        assert!(slot.key().is_persisted());
    }

    #[test]
    fn loaded_requires_assigned_key() {
        let key = ComponentKey::new(&["SLOTID"]).unwrap();
        assert!(ComponentIdent::loaded(key, 0).is_err());
    }

    #[test]
    fn setter_marks_modified() {
        let mut slot = Slot::loaded("1", "body");
        slot.set_label("sidebar");
        assert_eq!(slot.state(), ComponentState::Modified);
        assert!(slot.is_dirty());
    }

    #[test]
    fn setter_with_same_value_is_a_noop() {
        let mut slot = Slot::loaded("1", "body");
        slot.set_label("body");
        assert_eq!(slot.state(), ComponentState::Persisted);
    }

    #[test]
    fn new_stays_new_when_touched() {
        let mut slot = Slot::new("1", "body");
        slot.set_label("sidebar");
        assert_eq!(slot.state(), ComponentState::New);
    }

    #[test]
    fn set_id_marks_identity_changed() {
        let mut slot = Slot::loaded("1", "body");
        slot.ident_mut().set_id(42);
        assert_eq!(slot.id(), 42);
        assert_eq!(slot.state(), ComponentState::Modified);

        // same id again: no-op
        let mut clean = Slot::loaded("1", "body");
        clean.ident_mut().set_id(0);
        assert_eq!(clean.state(), ComponentState::Persisted);
    }

    #[test]
    fn mark_persisted_clears_dirty() {
        let mut slot = Slot::new("1", "body");
        slot.ident_mut().mark_persisted().unwrap();
        assert_eq!(slot.state(), ComponentState::Persisted);
        assert!(slot.key().is_persisted());
    }

    #[test]
    fn clone_is_equal_at_both_levels() {
        let slot = Slot::loaded("1", "body");
        let copy = slot.clone();
        assert!(slot.shallow_eq(&copy));
        assert!(slot.full_eq(&copy));
        assert_eq!(slot.shallow_hash(), copy.shallow_hash());
        assert_eq!(slot.full_hash(), copy.full_hash());
    }

    #[test]
    fn clone_is_independent() {
        let slot = Slot::loaded("1", "body");
        let mut copy = slot.clone();
        copy.set_label("other");
        assert_eq!(slot.label, "body");
    }

    #[test]
    fn mutation_breaks_full_but_not_shallow() {
        let slot = Slot::loaded("1", "body");
        let mut copy = slot.clone();
        copy.set_label("sidebar");
        assert!(slot.shallow_eq(&copy));
        assert!(!slot.full_eq(&copy));
        assert_eq!(slot.shallow_hash(), copy.shallow_hash());
    }

    #[test]
    fn different_keys_are_shallow_unequal() {
        let a = Slot::loaded("1", "body");
        let b = Slot::loaded("2", "body");
        assert!(!a.shallow_eq(&b));
        assert!(!a.full_eq(&b));
    }

    #[test]
    fn deleted_state_is_terminal_for_touch() {
        let mut slot = Slot::loaded("1", "body");
        slot.ident_mut().mark_deleted();
        slot.set_label("x");
        assert_eq!(slot.state(), ComponentState::Deleted);
    }
}
