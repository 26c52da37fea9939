//! Collections for layerstack.
//!
//! This crate provides the containers the application keeps its
//! configuration-derived objects in:
//!
//! - [`Collection<T>`]: sequence with optional uniqueness by key
//! - [`IndexedCollection<T>`]: order-preserving collection with reordering
//! - [`OverrideCollection<T, C>`]: module overlay over either of them, with
//!   per-key shadow stacks and module-scoped load, unload and export
//! - [`EventNotifier<P>`]: synchronous notification of every mutation
//!
//! All collections satisfy the following properties:
//! - **Unique**: no two members share a key (unless uniqueness is disabled)
//! - **Counted**: size equals successful adds minus successful removes
//! - **Restorable**: removing an overriding item brings back exactly what it
//!   displaced, newest shadow first
//!
//! Everything is in memory and single-threaded.

mod codec;
mod collection;
mod config;
mod error;
mod event;
mod indexed;
mod item_collection;
mod override_collection;
mod unique_key;

pub use codec::{ItemCodec, JsonCodec};
pub use collection::Collection;
pub use config::CollectionConfig;
pub use error::{CollectionError, CollectionResult};
pub use event::{EventNotifier, ItemMoved, ItemRemoved, ItemReplaced, ListenerId};
pub use indexed::IndexedCollection;
pub use item_collection::ItemCollection;
pub use override_collection::{OverrideCollection, ShadowEntry};
pub use unique_key::{DEFAULT_KEY_FIELD, Keyed, UniqueKey};

pub use layerstack_types::{ItemKey, ModuleId, Record};
