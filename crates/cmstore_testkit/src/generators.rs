//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys, properties, and property
//! lists that maintain the core crate's invariants.

use cmstore_core::{ComponentKey, ComponentList, Property};
use proptest::prelude::*;

/// Strategy for generating valid key part names.
pub fn part_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9]{2,11}").expect("Invalid regex")
}

/// Strategy for generating valid property names.
pub fn property_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_.-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating property values, including characters the
/// XML writer must escape and whitespace-only values.
pub fn property_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,40}").expect("Invalid regex")
}

/// Strategy for generating fully assigned, unpersisted keys with
/// distinct part names.
pub fn key_strategy() -> impl Strategy<Value = ComponentKey> {
    prop::collection::btree_map(part_name_strategy(), "[a-z0-9]{1,12}", 1..4).prop_map(|parts| {
        let names: Vec<&str> = parts.keys().map(String::as_str).collect();
        let values: Vec<&str> = parts.values().map(String::as_str).collect();
        ComponentKey::with_values(&names, &values, false).expect("distinct assigned parts")
    })
}

/// Strategy for generating name-as-key properties.
pub fn property_strategy() -> impl Strategy<Value = Property> {
    (property_name_strategy(), property_value_strategy())
        .prop_map(|(name, value)| Property::new(&name, &value).expect("valid property"))
}

/// Strategy for generating new (never persisted) property lists with
/// distinct names.
pub fn property_list_strategy() -> impl Strategy<Value = ComponentList<Property>> {
    prop::collection::btree_map(property_name_strategy(), property_value_strategy(), 0..8)
        .prop_map(|entries| {
            let mut list = ComponentList::new();
            for (name, value) in entries {
                list.add(Property::new(&name, &value).expect("valid property"));
            }
            list
        })
}
