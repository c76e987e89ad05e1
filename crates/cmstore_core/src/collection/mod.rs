//! Ordered component collections with snapshot diffing.

mod list;
mod set;

pub use list::ComponentList;
pub use set::{ComponentSet, NaturalKey};

use crate::component::ComponentEq;

/// Membership comparison used by collection diffing.
///
/// Membership identity is shallow (key-based) equality; whether a
/// shallow-matched member "needs update" defaults to full inequality.
/// Sequenced member types override [`needs_update`](Self::needs_update)
/// to also compare positions, since position is excluded from full
/// equality but a changed position still requires a store operation.
pub trait DiffMember: ComponentEq {
    /// Returns true when this member, shallow-equal to `baseline`,
    /// requires an update operation.
    fn needs_update(&self, baseline: &Self) -> bool {
        !self.full_eq(baseline)
    }
}

/// The minimal persistence operations between a collection's original
/// snapshot and its current state.
///
/// `inserted` and `updated` follow current list order; `deleted` follows
/// original snapshot order.
#[derive(Debug, Clone)]
pub struct ComponentDiff<T> {
    /// Members present now but absent at load time.
    pub inserted: Vec<T>,
    /// Members present in both, with changed values.
    pub updated: Vec<T>,
    /// Members present at load time but gone or tombstoned now.
    pub deleted: Vec<T>,
}

impl<T> ComponentDiff<T> {
    /// Returns true when no persistence operation is required.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Returns the total number of operations.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }
}

impl<T> Default for ComponentDiff<T> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}
