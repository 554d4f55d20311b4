//! In-memory injection container and resource dictionaries

use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::discovery::{InstanceResolver, ResourceKey, ResourceLookup};
use crate::model::{NodeRef, ObjectRef, TypeInfo, UiNode, Value};

/// Instances keyed by full type name, optionally narrowed by a key.
#[derive(Default)]
pub struct MemoryContainer {
    instances: FxHashMap<String, ObjectRef>,
    keyed: FxHashMap<(String, String), ObjectRef>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_info: &TypeInfo, instance: ObjectRef) -> &mut Self {
        self.instances.insert(type_info.full_name(), instance);
        self
    }

    pub fn insert_keyed(&mut self, type_info: &TypeInfo, key: &str, instance: ObjectRef) -> &mut Self {
        self.keyed.insert((type_info.full_name(), key.to_string()), instance);
        self
    }
}

impl InstanceResolver for MemoryContainer {
    fn resolve(&self, type_info: &TypeInfo, key: Option<&str>) -> Option<ObjectRef> {
        let full_name = type_info.full_name();
        key.and_then(|k| self.keyed.get(&(full_name.clone(), k.to_string())))
            .or_else(|| self.instances.get(&full_name))
            .cloned()
    }
}

struct ScopedEntry {
    scope: Weak<dyn UiNode>,
    key: ResourceKey,
    value: Value,
}

/// Global dictionary plus per-node dictionaries.
///
/// Scopes are held weakly; entries of dropped nodes are never returned.
#[derive(Default)]
pub struct MemoryResources {
    global: FxHashMap<ResourceKey, Value>,
    scoped: Vec<ScopedEntry>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_global(&mut self, key: ResourceKey, value: Value) -> &mut Self {
        self.global.insert(key, value);
        self
    }

    pub fn insert_scoped(&mut self, scope: &NodeRef, key: ResourceKey, value: Value) -> &mut Self {
        self.scoped.push(ScopedEntry {
            scope: Rc::downgrade(scope),
            key,
            value,
        });
        self
    }
}

impl ResourceLookup for MemoryResources {
    fn lookup(&self, scope: &NodeRef, key: &ResourceKey) -> Option<Value> {
        self.scoped
            .iter()
            .rev()
            .find(|entry| {
                entry.key == *key
                    && entry
                        .scope
                        .upgrade()
                        .is_some_and(|owner| crate::model::same_node(&owner, scope))
            })
            .map(|entry| entry.value.clone())
    }

    fn lookup_global(&self, key: &ResourceKey) -> Option<Value> {
        self.global.get(key).cloned()
    }
}
