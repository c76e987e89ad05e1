//! # CMStore Testkit
//!
//! Test utilities for cmstore.
//!
//! This crate provides:
//! - Canned [`IdSource`](cmstore_core::IdSource) and
//!   [`PersistenceBackend`](cmstore_core::PersistenceBackend) doubles
//! - Sample component builders
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cmstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_fixtures() {
//!     let mut allocator = CachingAllocator::new(SequentialIdSource::new(1));
//!     // ... test operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use cmstore_core::{CachingAllocator, ComponentList, ComponentSet, Property};
}

pub use fixtures::*;
pub use generators::*;
