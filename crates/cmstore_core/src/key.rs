//! Composite component keys.

use crate::error::{CoreError, CoreResult};
use cmstore_xml::{FromXml, ToXml, XmlElement, XmlError, XmlResult};
use std::hash::{Hash, Hasher};

/// One named part of a composite key.
#[derive(Debug, Clone)]
struct KeyPart {
    /// Part name, fixed at construction.
    name: String,
    /// Current value; `None` until assigned.
    value: Option<String>,
}

/// An ordered, named composite identifier for a persisted component.
///
/// A key separates its declared shape (part names, fixed at construction
/// and never reordered) from its current values (mutable until the key is
/// marked persisted). The same instance can therefore represent a row
/// before and after persistence without reallocation.
///
/// Two keys are equal iff their part names (order-sensitive) and part
/// values match. The persisted marker is excluded from equality and
/// hashing, so a collection can recognize the same logical row before it
/// has a stored identity.
#[derive(Debug, Clone)]
pub struct ComponentKey {
    parts: Vec<KeyPart>,
    /// Whether all parts currently hold stored values.
    persisted: bool,
}

impl ComponentKey {
    /// Creates an all-unassigned key with the given ordered part names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty part list, a blank part
    /// name, or a duplicate part name.
    pub fn new(part_names: &[&str]) -> CoreResult<Self> {
        Self::build(part_names, None, false)
    }

    /// Creates a key with initial values bound to every part.
    ///
    /// `persisted` declares whether the values represent a stored row
    /// (true when a loader reconstructs a key from the backing store).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the names are invalid or the value
    /// count does not match the part count.
    pub fn with_values(part_names: &[&str], values: &[&str], persisted: bool) -> CoreResult<Self> {
        if part_names.len() != values.len() {
            return Err(CoreError::invalid_argument(format!(
                "key has {} parts but {} values were supplied",
                part_names.len(),
                values.len()
            )));
        }
        Self::build(part_names, Some(values), persisted)
    }

    fn build(part_names: &[&str], values: Option<&[&str]>, persisted: bool) -> CoreResult<Self> {
        if part_names.is_empty() {
            return Err(CoreError::invalid_argument(
                "a key requires at least one part",
            ));
        }
        let mut parts: Vec<KeyPart> = Vec::with_capacity(part_names.len());
        for (index, name) in part_names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(CoreError::invalid_argument("blank key part name"));
            }
            if parts.iter().any(|p| p.name == *name) {
                return Err(CoreError::invalid_argument(format!(
                    "duplicate key part name '{name}'"
                )));
            }
            parts.push(KeyPart {
                name: (*name).to_string(),
                value: values.map(|v| v[index].to_string()),
            });
        }
        Ok(Self { parts, persisted })
    }

    /// Returns the declared part names in order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Returns the number of declared parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns the current value of a part.
    ///
    /// `Ok(None)` means the part is declared but not yet assigned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPartName` for an undeclared part name.
    pub fn part(&self, name: &str) -> CoreResult<Option<&str>> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_deref())
            .ok_or_else(|| CoreError::invalid_part_name(name))
    }

    /// Assigns a value to a part.
    ///
    /// Assignment is idempotent: setting the value a part already holds
    /// is a no-op. Setting a different value clears the persisted marker,
    /// since the key no longer names the stored row it used to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPartName` for an undeclared part name.
    pub fn set_part(&mut self, name: &str, value: impl Into<String>) -> CoreResult<()> {
        let value = value.into();
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::invalid_part_name(name))?;
        if part.value.as_deref() == Some(value.as_str()) {
            return Ok(());
        }
        part.value = Some(value);
        self.persisted = false;
        Ok(())
    }

    /// Returns true when every part holds a value.
    pub fn is_assigned(&self) -> bool {
        self.parts.iter().all(|p| p.value.is_some())
    }

    /// Returns the names of parts still awaiting a value, in order.
    pub fn unassigned_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.value.is_none())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Returns true when this key names a stored row.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Marks this key as naming a stored row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any part is still unassigned.
    pub fn mark_persisted(&mut self) -> CoreResult<()> {
        if !self.is_assigned() {
            return Err(CoreError::invalid_argument(format!(
                "cannot mark key persisted: parts {:?} are unassigned",
                self.unassigned_parts()
            )));
        }
        self.persisted = true;
        Ok(())
    }
}

// Equality and hashing cover part names (order-sensitive) and values
// only. The persisted marker is deliberately excluded.
impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(other.parts.iter())
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for part in &self.parts {
            part.name.hash(state);
            part.value.hash(state);
        }
    }
}

impl ToXml for ComponentKey {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Key")
            .with_attribute("persisted", if self.persisted { "yes" } else { "no" });
        for part in &self.parts {
            let child = match &part.value {
                Some(value) => XmlElement::new(&part.name).with_text(value),
                None => XmlElement::new(&part.name).with_attribute("assigned", "no"),
            };
            element.add_child(child);
        }
        element
    }
}

impl FromXml for ComponentKey {
    fn from_xml(element: &XmlElement) -> XmlResult<Self> {
        element.expect_name("Key")?;
        let persisted = match element.attribute("persisted").unwrap_or("no") {
            "yes" => true,
            "no" => false,
            other => {
                return Err(XmlError::invalid_value("Key", "persisted", other));
            }
        };
        let mut parts = Vec::new();
        for child in element.child_elements() {
            if parts.iter().any(|p: &KeyPart| p.name == child.name()) {
                return Err(XmlError::invalid_value("Key", "part", child.name()));
            }
            let value = if child.attribute("assigned") == Some("no") {
                None
            } else {
                Some(child.text())
            };
            parts.push(KeyPart {
                name: child.name().to_string(),
                value,
            });
        }
        if parts.is_empty() {
            return Err(XmlError::missing_child("Key", "part"));
        }
        let key = Self { parts, persisted };
        if persisted && !key.is_assigned() {
            return Err(XmlError::invalid_value("Key", "persisted", "yes"));
        }
        Ok(key)
    }
}
