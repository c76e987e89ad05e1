//! Name/value properties, the smallest persisted entities.

use crate::collection::{ComponentDiff, ComponentList, DiffMember, NaturalKey};
use crate::component::{Component, ComponentEq, ComponentIdent};
use crate::error::{CoreError, CoreResult};
use crate::key::ComponentKey;
use crate::persist::GeneratedKey;
use cmstore_xml::{FromXml, ToXml, XmlElement, XmlError, XmlResult};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Key part holding the property name.
pub const PROP_NAME_PART: &str = "PROPNAME";
/// Key part holding the property value under [`KeyAssignment::NameAndValue`].
pub const PROP_VALUE_PART: &str = "PROPVALUE";

/// How a property's fields participate in its key.
///
/// The strategy is configured per concrete use and fixed for the life of
/// the instance. Whenever the value participates in key identity
/// (everything except `NameOnly`), it is immutable after construction:
/// changing it would silently re-identify the stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAssignment {
    /// Only the name is a key part; value and description stay mutable.
    NameOnly,
    /// Name and value are key parts.
    NameAndValue,
    /// Name and a server-generated row id are key parts; the id part is
    /// unassigned until allocation.
    NameAndId {
        /// Name of the generated key part, doubling as the id-sequence
        /// lookup name (e.g. `ACTIONID`).
        id_part: String,
    },
}

/// A persisted name/value pair with an optional description.
///
/// Full equality covers: key, id, name, value, description.
#[derive(Debug, Clone)]
pub struct Property {
    ident: ComponentIdent,
    name: String,
    value: String,
    description: String,
    assignment: KeyAssignment,
}

impl Property {
    /// Creates a name-as-key property.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank name.
    pub fn new(name: &str, value: &str) -> CoreResult<Self> {
        Self::with_key_assignment(name, value, KeyAssignment::NameOnly)
    }

    /// Creates a property under the given key-assignment strategy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank name or a blank/clashing
    /// generated id part.
    pub fn with_key_assignment(
        name: &str,
        value: &str,
        assignment: KeyAssignment,
    ) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("property name must not be blank"));
        }
        let key = match &assignment {
            KeyAssignment::NameOnly => {
                ComponentKey::with_values(&[PROP_NAME_PART], &[name], false)?
            }
            KeyAssignment::NameAndValue => ComponentKey::with_values(
                &[PROP_NAME_PART, PROP_VALUE_PART],
                &[name, value],
                false,
            )?,
            KeyAssignment::NameAndId { id_part } => {
                if id_part == PROP_NAME_PART {
                    return Err(CoreError::invalid_argument(
                        "generated id part may not shadow the name part",
                    ));
                }
                let mut key = ComponentKey::new(&[PROP_NAME_PART, id_part.as_str()])?;
                key.set_part(PROP_NAME_PART, name)?;
                key
            }
        };
        Ok(Self {
            ident: ComponentIdent::new(key),
            name: name.to_string(),
            value: value.to_string(),
            description: String::new(),
            assignment,
        })
    }

    /// Sets the description, builder style.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the property value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the description (empty when none was given).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the key-assignment strategy.
    pub fn key_assignment(&self) -> &KeyAssignment {
        &self.assignment
    }

    /// Sets the value.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMutation` when the value participates in key
    /// assignment (any strategy except `NameOnly`).
    pub fn set_value(&mut self, value: &str) -> CoreResult<()> {
        if self.assignment != KeyAssignment::NameOnly {
            return Err(CoreError::unsupported_mutation(format!(
                "value of property '{}' participates in its key",
                self.name
            )));
        }
        if self.value != value {
            self.value = value.to_string();
            self.ident.touch();
        }
        Ok(())
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: &str) {
        if self.description != description {
            self.description = description.to_string();
            self.ident.touch();
        }
    }
}

impl Component for Property {
    const NODE_NAME: &'static str = "Property";

    fn ident(&self) -> &ComponentIdent {
        &self.ident
    }

    fn ident_mut(&mut self) -> &mut ComponentIdent {
        &mut self.ident
    }
}

// Full equality covers: key, id, name, value, description.
impl ComponentEq for Property {
    fn full_eq(&self, other: &Self) -> bool {
        self.shallow_eq(other)
            && self.id() == other.id()
            && self.name == other.name
            && self.value == other.value
            && self.description == other.description
    }

    fn full_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.key().hash(&mut hasher);
        self.id().hash(&mut hasher);
        self.name.hash(&mut hasher);
        self.value.hash(&mut hasher);
        self.description.hash(&mut hasher);
        hasher.finish()
    }
}

impl DiffMember for Property {}

impl NaturalKey for Property {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

impl GeneratedKey for Property {
    fn id_lookup(&self) -> Option<&str> {
        match &self.assignment {
            KeyAssignment::NameAndId { id_part } => Some(id_part),
            _ => None,
        }
    }

    fn apply_generated_id(&mut self, id: u64) -> CoreResult<()> {
        let part = match &self.assignment {
            KeyAssignment::NameAndId { id_part } => id_part.clone(),
            _ => {
                return Err(CoreError::unsupported_mutation(format!(
                    "property '{}' has no generated key part",
                    self.name
                )));
            }
        };
        self.ident.key_mut().set_part(&part, id.to_string())?;
        self.ident.set_id(id);
        Ok(())
    }
}

impl ToXml for Property {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::NODE_NAME)
            .with_attribute("name", &self.name)
            .with_attribute("id", self.id().to_string())
            .with_child(self.key().to_xml())
            .with_child(XmlElement::new("Value").with_text(&self.value));
        if !self.description.is_empty() {
            element.add_child(XmlElement::new("Description").with_text(&self.description));
        }
        element
    }
}

impl FromXml for Property {
    fn from_xml(element: &XmlElement) -> XmlResult<Self> {
        element.expect_name(Self::NODE_NAME)?;
        let name = element.require_attribute("name")?;
        if name.trim().is_empty() {
            return Err(XmlError::invalid_value(Self::NODE_NAME, "name", name));
        }
        let id: u64 = element.parse_attribute_or("id", 0)?;
        let key = ComponentKey::from_xml(element.require_child("Key")?)?;

        let part_names: Vec<&str> = key.part_names().collect();
        let assignment = match part_names.as_slice() {
            [PROP_NAME_PART] => KeyAssignment::NameOnly,
            [PROP_NAME_PART, PROP_VALUE_PART] => KeyAssignment::NameAndValue,
            [PROP_NAME_PART, other] => KeyAssignment::NameAndId {
                id_part: (*other).to_string(),
            },
            _ => {
                return Err(XmlError::invalid_value(
                    Self::NODE_NAME,
                    "Key",
                    part_names.join(","),
                ));
            }
        };

        let value = element.child("Value").map(|c| c.text()).unwrap_or_default();
        let description = element
            .child("Description")
            .map(|c| c.text())
            .unwrap_or_default();

        // A record whose key disagrees with its fields must not load.
        if key.part(PROP_NAME_PART).ok().flatten() != Some(name) {
            return Err(XmlError::invalid_value(Self::NODE_NAME, PROP_NAME_PART, name));
        }
        if assignment == KeyAssignment::NameAndValue
            && key.part(PROP_VALUE_PART).ok().flatten() != Some(value.as_str())
        {
            return Err(XmlError::invalid_value(
                Self::NODE_NAME,
                PROP_VALUE_PART,
                value,
            ));
        }

        let mut ident = ComponentIdent::new(key);
        ident.set_id(id);
        if ident.key().is_persisted() {
            // loaded representation of a stored row
            ident
                .mark_persisted()
                .map_err(|_| XmlError::invalid_value(Self::NODE_NAME, "Key", "persisted"))?;
        }

        Ok(Self {
            ident,
            name: name.to_string(),
            value,
            description,
            assignment,
        })
    }
}

/// One name mapped to an ordered sequence of values.
///
/// The container is itself a diffable collection of single-valued
/// [`Property`] entries sharing the multi-property's name. Duplicate
/// values are kept; insertion order is preserved.
#[derive(Debug, Clone)]
pub struct MultiValuedProperty {
    name: String,
    entries: ComponentList<Property>,
}

impl MultiValuedProperty {
    /// Creates an empty multi-valued property.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank name.
    pub fn new(name: &str) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("property name must not be blank"));
        }
        Ok(Self {
            name: name.to_string(),
            entries: ComponentList::new(),
        })
    }

    /// Creates a multi-valued property from entries loaded out of the
    /// backing store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when an entry carries a different name.
    pub fn from_loaded(name: &str, entries: Vec<Property>) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("property name must not be blank"));
        }
        if let Some(stray) = entries.iter().find(|e| e.name() != name) {
            return Err(CoreError::invalid_argument(format!(
                "entry '{}' does not belong to multi-valued property '{name}'",
                stray.name()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            entries: ComponentList::from_loaded(entries),
        })
    }

    /// Returns the shared property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a value.
    ///
    /// The new entry is keyed by name and value so each value is its own
    /// row in the backing store.
    ///
    /// # Errors
    ///
    /// Propagates construction failures from [`Property`].
    pub fn add_value(&mut self, value: &str) -> CoreResult<()> {
        let entry =
            Property::with_key_assignment(&self.name, value, KeyAssignment::NameAndValue)?;
        self.entries.add(entry);
        Ok(())
    }

    /// Iterates over the values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Property::value)
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no values are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the underlying entry list.
    pub fn entries(&self) -> &ComponentList<Property> {
        &self.entries
    }

    /// Returns the underlying entry list for mutation.
    pub fn entries_mut(&mut self) -> &mut ComponentList<Property> {
        &mut self.entries
    }

    /// Computes the persistence diff over the entries.
    pub fn diff(&self) -> ComponentDiff<Property> {
        self.entries.diff()
    }

    /// Replaces the entry snapshot after a successful persist.
    ///
    /// # Errors
    ///
    /// See [`ComponentList::reconcile`].
    pub fn reconcile(&mut self) -> CoreResult<()> {
        self.entries.reconcile()
    }
}

impl ToXml for MultiValuedProperty {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("MultiProperty").with_attribute("name", &self.name);
        for entry in self.entries.iter() {
            element.add_child(entry.to_xml());
        }
        element
    }
}

impl FromXml for MultiValuedProperty {
    fn from_xml(element: &XmlElement) -> XmlResult<Self> {
        element.expect_name("MultiProperty")?;
        let name = element.require_attribute("name")?;
        let mut entries = Vec::new();
        for child in element.children_named(Property::NODE_NAME) {
            entries.push(Property::from_xml(child)?);
        }
        Self::from_loaded(name, entries).map_err(|_| {
            XmlError::invalid_value("MultiProperty", "name", name)
        })
    }
}
