//! Sibling-ordering capability.

use crate::component::Component;

/// Position value meaning "unordered, placed last".
pub const UNORDERED: i32 = -1;

/// Capability for components carrying a position among their siblings.
///
/// Positions are metadata for the persistence collaborator to
/// reconstruct server-side ordering; they are not a live sort key.
/// Values need not be sequential or unique, and collection iteration
/// stays in list order regardless of position.
///
/// Position is deliberately excluded from both equality levels and both
/// hashes. Collections still treat a changed position as "needs update":
/// sequenced member types override [`DiffMember::needs_update`] to
/// compare positions alongside full equality.
///
/// [`DiffMember::needs_update`]: crate::collection::DiffMember::needs_update
pub trait Sequenced: Component {
    /// Returns the zero-based position, or [`UNORDERED`].
    fn position(&self) -> i32;

    /// Sets the position.
    ///
    /// Setting the current value is a no-op; any other change marks the
    /// component modified.
    fn set_position(&mut self, position: i32);
}
