//! Field-lookup capability boundary.

use crate::collection::ComponentList;
use crate::error::CoreResult;
use crate::property::Property;

/// Read-only access to named fields of a foreign object.
///
/// Domain objects outside this core (field-bearing items, definition
/// carriers) expose their data through this narrow capability instead of
/// a visitor: the lookup is passed as an explicit parameter wherever
/// definition data decorates another object, so there is no hidden
/// mutation path into the target.
pub trait FieldLookup {
    /// Returns the value of the named field, or `None` when absent.
    fn field_by_name(&self, name: &str) -> Option<&str>;
}

/// Copies named fields from a lookup into a property list.
///
/// For each requested name present in `source`, an existing property of
/// that name (case-insensitive) is updated in place; otherwise a new
/// name-as-key property is appended. Names absent from the source are
/// skipped. Returns the number of properties written.
///
/// # Errors
///
/// Propagates property construction and mutation failures; a failure
/// leaves earlier merges applied (callers diff against the snapshot, so
/// partial merges are still persisted correctly).
pub fn merge_fields(
    source: &dyn FieldLookup,
    names: &[&str],
    target: &mut ComponentList<Property>,
) -> CoreResult<usize> {
    let mut written = 0;
    for name in names {
        let Some(value) = source.field_by_name(name) else {
            continue;
        };
        match target
            .iter_mut()
            .find(|p| p.name().eq_ignore_ascii_case(name))
        {
            Some(existing) => {
                if existing.value() != value {
                    existing.set_value(value)?;
                    written += 1;
                }
            }
            None => {
                target.add(Property::new(name, value)?);
                written += 1;
            }
        }
    }
    Ok(written)
}
