//! Entity/reference graph: the database contract, the indexes built over
//! it, and the query session.
//!
//! A [`Session`] indexes an open [`CodeDatabase`] once and answers kind
//! filtering, one-hop reference traversal and dependency aggregation.

pub mod database;
pub mod depends;
pub mod engine;
pub mod filter;
pub mod index;
pub mod persistence;
pub mod store;
pub mod types;

pub use database::{CodeDatabase, DatabaseBuilder, FileLexemes, MemoryDatabase, Snapshot};
pub use depends::DependencyMap;
pub use engine::Session;
pub use filter::KindFilter;
pub use index::{Ref, ReferenceIndex};
pub use store::EntityStore;
pub use types::{Entity, EntityId, Kind, Reference, Token, TokenCategory};
