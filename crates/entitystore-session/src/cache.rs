//! Identity map over materialized entities.
//!
//! A per-type map keyed by primary-key value holding shared references, so
//! one logical row materializes as exactly one in-memory instance per
//! session. Removal by instance matches on reference identity, not on key:
//! a caller may hold a stale instance whose key was mutated after caching,
//! and identity removal still evicts it.
//!
//! The map is not internally synchronized; the store serializes access
//! behind its own lock.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use entitystore_core::{Entity, Value};

/// A shared reference to a cached entity.
pub type EntityRef<E> = Arc<RwLock<E>>;

/// Hash a primary-key value for use as the inner map key.
fn hash_key(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    match value {
        Value::Null => 0u8.hash(&mut hasher),
        Value::Bool(v) => {
            1u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::Int(v) => {
            2u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::BigInt(v) => {
            3u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::Double(v) => {
            4u8.hash(&mut hasher);
            v.to_bits().hash(&mut hasher);
        }
        Value::Text(v) => {
            5u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::Bytes(v) => {
            6u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::DateTime(v) => {
            7u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        Value::Guid(v) => {
            8u8.hash(&mut hasher);
            v.hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// One cached entry: the type-erased shared reference plus its key.
struct CacheEntry {
    /// Actually an `Arc<RwLock<E>>`; the Arc itself is type-erased so
    /// lookups can hand out clones of the same Arc.
    shared: Box<dyn Any + Send + Sync>,
    key: Value,
}

/// The identity map: `(entity type, primary-key value)` → shared reference.
#[derive(Default)]
pub struct EntityCache {
    entries: HashMap<(TypeId, u64), CacheEntry>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a key.
    pub fn insert<E: Entity>(&mut self, key: Value, entity: EntityRef<E>) {
        let map_key = (TypeId::of::<E>(), hash_key(&key));
        self.entries.insert(
            map_key,
            CacheEntry {
                shared: Box::new(entity),
                key,
            },
        );
    }

    /// Return the cached shared reference for a key; never constructs.
    pub fn lookup<E: Entity>(&self, key: &Value) -> Option<EntityRef<E>> {
        let map_key = (TypeId::of::<E>(), hash_key(key));
        let entry = self.entries.get(&map_key)?;
        let shared = entry.shared.downcast_ref::<EntityRef<E>>()?;
        Some(Arc::clone(shared))
    }

    /// Remove an entry by reference identity, scanning the type's entries.
    ///
    /// Deliberately not a key-based removal: the instance is matched by
    /// `Arc::ptr_eq` even when its key no longer matches the cached one.
    pub fn invalidate_entity<E: Entity>(&mut self, entity: &EntityRef<E>) -> bool {
        let type_id = TypeId::of::<E>();
        let found = self.entries.iter().find_map(|(map_key, entry)| {
            if map_key.0 != type_id {
                return None;
            }
            let shared = entry.shared.downcast_ref::<EntityRef<E>>()?;
            if Arc::ptr_eq(shared, entity) {
                Some((*map_key, entry.key.clone()))
            } else {
                None
            }
        });

        match found {
            Some((map_key, key)) => {
                self.entries.remove(&map_key);
                tracing::trace!(key = ?key, "evicted cache entry by identity");
                true
            }
            None => false,
        }
    }

    /// Remove every entry of a type whose value matches the predicate.
    pub fn invalidate_where<E: Entity>(&mut self, predicate: impl Fn(&E) -> bool) {
        let type_id = TypeId::of::<E>();
        self.entries.retain(|map_key, entry| {
            if map_key.0 != type_id {
                return true;
            }
            let Some(shared) = entry.shared.downcast_ref::<EntityRef<E>>() else {
                return true;
            };
            let guard = shared.read().expect("entity lock poisoned");
            !predicate(&guard)
        });
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The no-op cache for callers that opt out of identity mapping.
#[derive(Debug, Default)]
pub struct NoCache;

/// Cache capability selected per store.
pub enum CacheMode {
    /// Identity-map caching
    Identity(EntityCache),
    /// No caching; every row materializes a fresh instance
    Off(NoCache),
}

impl CacheMode {
    pub fn identity() -> Self {
        CacheMode::Identity(EntityCache::new())
    }

    pub fn off() -> Self {
        CacheMode::Off(NoCache)
    }

    /// Insert or replace; no-op when caching is off.
    pub fn insert<E: Entity>(&mut self, key: Value, entity: EntityRef<E>) {
        match self {
            CacheMode::Identity(cache) => cache.insert(key, entity),
            CacheMode::Off(_) => {}
        }
    }

    /// Cached shared reference, or `None` (always `None` when off).
    pub fn lookup<E: Entity>(&self, key: &Value) -> Option<EntityRef<E>> {
        match self {
            CacheMode::Identity(cache) => cache.lookup(key),
            CacheMode::Off(_) => None,
        }
    }

    /// Remove by reference identity; `false` when off or absent.
    pub fn invalidate_entity<E: Entity>(&mut self, entity: &EntityRef<E>) -> bool {
        match self {
            CacheMode::Identity(cache) => cache.invalidate_entity(entity),
            CacheMode::Off(_) => false,
        }
    }

    /// Remove matching entries of a type; no-op when off.
    pub fn invalidate_where<E: Entity>(&mut self, predicate: impl Fn(&E) -> bool) {
        match self {
            CacheMode::Identity(cache) => cache.invalidate_where(predicate),
            CacheMode::Off(_) => {}
        }
    }

    /// Drop everything; no-op when off.
    pub fn clear(&mut self) {
        match self {
            CacheMode::Identity(cache) => cache.clear(),
            CacheMode::Off(_) => {}
        }
    }
}
