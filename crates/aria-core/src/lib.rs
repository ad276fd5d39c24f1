//! Shared types and the persistence contract for the Aria integration layer.
//!
//! Everything the background components touch goes through the [`Store`]
//! trait; the store's schema and query engine live outside this workspace.

pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{MemoryStore, Store};
pub use types::{
    clamp_confidence, DataSource, KnowledgeItem, PeerAi, PendingUpdate, UpdateKind,
};
