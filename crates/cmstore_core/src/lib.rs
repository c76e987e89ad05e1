//! # CMStore Core
//!
//! Object-persistence substrate for content-management applications.
//!
//! This crate provides:
//! - Composite keys with deferred, store-generated part assignment
//! - A block-caching id allocator over a pluggable [`IdSource`]
//! - The [`Component`] identity model with shallow and full equality
//! - Versioning and ordering capabilities for persisted objects
//! - Diffing collections (list and natural-key set) with explicit
//!   snapshot reconciliation
//! - Name/value properties, single- and multi-valued, with XML
//!   round-trip support
//! - A persistence cycle that batches key allocation and hands the
//!   collection diff to a [`PersistenceBackend`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod allocator;
pub mod collection;
pub mod component;
pub mod error;
pub mod fields;
pub mod key;
pub mod persist;
pub mod property;
pub mod sequence;
pub mod version;

pub use allocator::{CachingAllocator, IdSource};
pub use collection::{ComponentDiff, ComponentList, ComponentSet, DiffMember, NaturalKey};
pub use component::{Component, ComponentEq, ComponentIdent, ComponentState};
pub use error::{CoreError, CoreResult};
pub use fields::{merge_fields, FieldLookup};
pub use key::ComponentKey;
pub use persist::{persist_list, GeneratedKey, PersistenceBackend};
pub use property::{KeyAssignment, MultiValuedProperty, Property};
pub use sequence::{Sequenced, UNORDERED};
pub use version::Versioned;
