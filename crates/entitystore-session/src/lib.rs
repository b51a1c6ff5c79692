//! Session layer for entitystore.
//!
//! Holds the pieces that give a store its session semantics:
//!
//! - the identity cache (`cache`): one in-memory instance per logical row
//! - the serializer (`serializer`): row → entity materialization through
//!   the cache
//! - the orchestrator (`store`): the insert/update/delete/select surface

pub mod cache;
pub mod serializer;
pub mod store;

pub use cache::{CacheMode, EntityCache, EntityRef, NoCache};
pub use serializer::EntitySerializer;
pub use store::SqlStore;
