//! Instance-resolution back ends handed to discovery per call

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::model::{NodeRef, ObjectRef, TypeInfo, Value};

/// Default constructor of a registered type.
pub type Factory = Rc<dyn Fn() -> ObjectRef>;

/// A type visible to discovery.
#[derive(Clone)]
pub struct TypeEntry {
    pub info: TypeInfo,
    factory: Option<Factory>,
}

impl TypeEntry {
    pub fn construct(&self) -> Option<ObjectRef> {
        self.factory.as_ref().map(|f| f())
    }

    pub fn is_constructible(&self) -> bool {
        self.factory.is_some()
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("info", &self.info.full_name())
            .field("constructible", &self.is_constructible())
            .finish()
    }
}

/// Candidate type pool, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: TypeInfo, factory: impl Fn() -> ObjectRef + 'static) -> &mut Self {
        self.entries.push(TypeEntry {
            info,
            factory: Some(Rc::new(factory)),
        });
        self
    }

    /// Register a type without a default constructor.
    pub fn register_abstract(&mut self, info: TypeInfo) -> &mut Self {
        self.entries.push(TypeEntry { info, factory: None });
        self
    }

    pub fn types_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a TypeEntry> + 'a {
        self.entries.iter().filter(move |e| e.info.namespace == namespace)
    }

    pub fn get(&self, full_name: &str) -> Option<&TypeEntry> {
        self.entries.iter().find(|e| e.info.full_name() == full_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Injection container. `None` means "try the next strategy".
pub trait InstanceResolver {
    fn resolve(&self, type_info: &TypeInfo, key: Option<&str>) -> Option<ObjectRef>;
}

/// Key of a resource dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "by", content = "key", rename_all = "snake_case")]
pub enum ResourceKey {
    Name(String),
    Type(TypeInfo),
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Name(name) => write!(f, "'{name}'"),
            ResourceKey::Type(info) => write!(f, "type {info}"),
        }
    }
}

/// Resource dictionaries: one per node scope plus a global one.
pub trait ResourceLookup {
    /// Entry stored on `scope` itself; ancestors are walked by the caller.
    fn lookup(&self, scope: &NodeRef, key: &ResourceKey) -> Option<Value>;

    fn lookup_global(&self, key: &ResourceKey) -> Option<Value>;
}

/// Back ends for one discovery call.
#[derive(Clone, Copy)]
pub struct DiscoveryContext<'a> {
    pub registry: &'a TypeRegistry,
    pub container: Option<&'a dyn InstanceResolver>,
    pub resources: Option<&'a dyn ResourceLookup>,
}

impl<'a> DiscoveryContext<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            container: None,
            resources: None,
        }
    }

    pub fn with_container(mut self, container: &'a dyn InstanceResolver) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_resources(mut self, resources: &'a dyn ResourceLookup) -> Self {
        self.resources = Some(resources);
        self
    }
}
