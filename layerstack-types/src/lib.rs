//! Core type definitions for layerstack.
//!
//! This crate defines the small, domain-agnostic values shared by every
//! collection in the workspace:
//! - Item keys (the value of a collection's unique key field)
//! - Module identifiers (the owner of a batch of configuration items)
//! - Serialized records (the plain-data form of an item)
//!
//! The stored item types themselves (map layers, styles, viewpoints, ...)
//! belong to the host application, not here.

mod key;
mod module;

pub use key::ItemKey;
pub use module::ModuleId;

/// The plain-data form of a serialized item.
///
/// Shadowed items, module exports and configuration input all travel as
/// JSON values.
pub type Record = serde_json::Value;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid item key: {0}")]
    InvalidKey(String),

    #[error("invalid module id: {0}")]
    InvalidModuleId(String),
}
