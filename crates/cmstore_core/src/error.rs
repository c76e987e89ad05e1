//! Error types for cmstore core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in cmstore core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A required argument was blank, zero, or otherwise out of range.
    ///
    /// Raised at the call that receives the bad value; nothing is
    /// partially applied.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// A key part name outside the key's declared shape.
    #[error("invalid key part: {name}")]
    InvalidPartName {
        /// The undeclared part name.
        name: String,
    },

    /// Insertion under a natural key that is already present.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// The natural key that collided.
        key: String,
    },

    /// Attempt to change a value that participates in key assignment.
    #[error("unsupported mutation: {message}")]
    UnsupportedMutation {
        /// Description of the rejected mutation.
        message: String,
    },

    /// The id-allocation collaborator failed.
    ///
    /// A short block is not a failure; this is for lookups that do not
    /// exist or a generator that is unavailable. The core never retries.
    #[error("id allocation failed for '{lookup}': {message}")]
    AllocationFailed {
        /// The id-sequence lookup name.
        lookup: String,
        /// Description of the failure.
        message: String,
    },

    /// XML serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Xml(#[from] cmstore_xml::XmlError),
}

impl CoreError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid-part-name error.
    pub fn invalid_part_name(name: impl Into<String>) -> Self {
        Self::InvalidPartName { name: name.into() }
    }

    /// Creates a duplicate-key error.
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Creates an unsupported-mutation error.
    pub fn unsupported_mutation(message: impl Into<String>) -> Self {
        Self::UnsupportedMutation {
            message: message.into(),
        }
    }

    /// Creates an allocation-failed error.
    pub fn allocation_failed(lookup: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AllocationFailed {
            lookup: lookup.into(),
            message: message.into(),
        }
    }
}
