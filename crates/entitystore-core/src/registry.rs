//! Registered entity metadata, keyed by type and by store name.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::entity::{Entity, EntityInfo};
use crate::error::{Error, MetadataErrorKind, Result};

/// The set of entity types registered with one store.
///
/// Cloneable handle over shared state; registration and lookup are guarded by
/// an interior lock so metadata can be read from multiple threads while types
/// are still being registered. Insertion order is preserved for schema
/// reconciliation; lookups don't depend on it.
#[derive(Debug, Clone, Default)]
pub struct EntityInfoCollection {
    inner: Arc<RwLock<Registry>>,
}

#[derive(Debug, Default)]
struct Registry {
    by_type: HashMap<TypeId, Arc<EntityInfo>>,
    by_name: HashMap<String, TypeId>,
    order: Vec<TypeId>,
}

impl EntityInfoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type, validating its declaration.
    ///
    /// Registering an already-known type is a no-op returning the existing
    /// metadata. A declaration failure registers nothing.
    pub fn register<E: Entity>(&self) -> Result<Arc<EntityInfo>> {
        let type_id = TypeId::of::<E>();

        {
            let registry = self.inner.read().expect("registry lock poisoned");
            if let Some(existing) = registry.by_type.get(&type_id) {
                return Ok(Arc::clone(existing));
            }
        }

        // Validate outside the lock; only a clean declaration is inserted.
        let info = Arc::new(E::declare().build()?);

        let mut registry = self.inner.write().expect("registry lock poisoned");
        // Lost a race: another thread registered the same type meanwhile.
        if let Some(existing) = registry.by_type.get(&type_id) {
            return Ok(Arc::clone(existing));
        }

        let name_key = info.entity_name().to_ascii_lowercase();
        if registry.by_name.contains_key(&name_key) {
            return Err(Error::metadata(
                MetadataErrorKind::DuplicateEntityName,
                info.entity_name(),
                "another entity type already uses this store name",
            ));
        }

        tracing::debug!(entity = info.entity_name(), "registered entity type");
        registry.by_name.insert(name_key, type_id);
        registry.by_type.insert(type_id, Arc::clone(&info));
        registry.order.push(type_id);
        Ok(info)
    }

    /// Look up metadata by entity type.
    pub fn get<E: Entity>(&self) -> Option<Arc<EntityInfo>> {
        let registry = self.inner.read().expect("registry lock poisoned");
        registry.by_type.get(&TypeId::of::<E>()).cloned()
    }

    /// Look up metadata by entity type, failing with an unknown-entity error.
    pub fn require<E: Entity>(&self) -> Result<Arc<EntityInfo>> {
        self.get::<E>().ok_or_else(|| {
            Error::metadata(
                MetadataErrorKind::UnknownEntity,
                std::any::type_name::<E>(),
                "type was not registered with this store",
            )
        })
    }

    /// Look up metadata by store name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<Arc<EntityInfo>> {
        let registry = self.inner.read().expect("registry lock poisoned");
        let type_id = registry.by_name.get(&name.to_ascii_lowercase())?;
        registry.by_type.get(type_id).cloned()
    }

    /// Is an entity with this store name registered?
    pub fn contains_name(&self, name: &str) -> bool {
        let registry = self.inner.read().expect("registry lock poisoned");
        registry.by_name.contains_key(&name.to_ascii_lowercase())
    }

    /// All registered metadata, in registration order.
    pub fn infos(&self) -> Vec<Arc<EntityInfo>> {
        let registry = self.inner.read().expect("registry lock poisoned");
        registry
            .order
            .iter()
            .filter_map(|id| registry.by_type.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
