//! Error types for setting up a parser.
//!
//! Parsing itself never fails: unresolvable input surfaces as an
//! [`Intent`](crate::Intent) rather than an error. The errors here cover the
//! surrounding setup, i.e. loading fixtures and configuration and populating
//! an in-memory store.

use thiserror::Error;

/// Errors produced while preparing a knowledge store or parser configuration.
#[derive(Debug, Error)]
pub enum NlqpError {
    /// A knowledge-store fixture could not be decoded
    #[error("invalid knowledge store fixture: {0}")]
    Fixture(#[source] serde_json::Error),

    /// A parser configuration document could not be decoded
    #[error("invalid parser configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// A membership or fact referenced a collection that was never declared
    #[error("collection {collection:?} is not known to the store")]
    UnknownCollection {
        /// The collection id that failed to resolve
        collection: String,
    },

    /// A membership or fact referenced an entity that was never declared
    #[error("entity {entity:?} is not known to the store")]
    UnknownEntity {
        /// The entity id that failed to resolve
        entity: String,
    },

    /// An entity or collection id was declared twice
    #[error("id {id:?} is already declared")]
    DuplicateId {
        /// The id that was declared more than once
        id: String,
    },
}

/// Result type for fallible setup operations.
pub type NlqpResult<T> = Result<T, NlqpError>;
