//! Explicit metadata model shared by the engine and its hosts
//!
//! The engine never inspects host objects directly. Hosts expose:
//! - [`UiNode`]: named nodes of the UI tree and their members
//! - [`BindableObject`]: target objects (view-models) and their members
//!
//! Both hand out [`MemberDescriptor`]s carrying function handles.

mod annotation;
mod descriptor;
mod notify;
mod value;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use annotation::Annotation;
pub use descriptor::{
    EventDescriptor, FieldDescriptor, Getter, Handler, Invoker, Linker, MemberDescriptor,
    MemberKind, MethodDescriptor, PropertyDescriptor, Setter, Subscribe, SubscriptionId,
    Unsubscribe,
};
pub use notify::{Listener, Notifier};
pub use value::{Value, ValueKind};

use crate::command::Command;

pub type ObjectRef = Rc<dyn BindableObject>;
pub type NodeRef = Rc<dyn UiNode>;
pub type CommandRef = Rc<dyn Command>;

/// Name, namespace and declared name aliases of a host type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Type-name-alias annotation
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TypeInfo {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            aliases: Vec::new(),
        }
    }

    /// Parse a dotted full name: the last segment is the type name.
    pub fn parse(full_name: &str) -> Self {
        match full_name.rsplit_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("", full_name),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// A target object whose members are candidates for binding.
pub trait BindableObject {
    fn type_info(&self) -> TypeInfo;

    /// Every property, method and field, with annotations.
    fn members(&self) -> Vec<MemberDescriptor>;

    /// Property change notification, when the object supports it.
    /// Handlers receive the changed property name.
    fn property_changed(&self) -> Option<&Notifier<str>> {
        None
    }
}

/// A node of the host UI tree.
pub trait UiNode {
    fn type_info(&self) -> TypeInfo;

    fn declared_name(&self) -> Option<String>;

    /// Structural ("visual") children.
    fn visual_children(&self) -> Vec<NodeRef>;

    /// Auxiliary ("logical") children.
    fn logical_children(&self) -> Vec<NodeRef> {
        Vec::new()
    }

    /// Scope-local named entries outside the primary hierarchy.
    fn scope_names(&self) -> Vec<(String, NodeRef)> {
        Vec::new()
    }

    fn parent(&self) -> Option<NodeRef>;

    /// Property or event named `name`, if the node exposes one.
    fn member(&self, name: &str) -> Option<MemberDescriptor>;
}

/// Identity comparison for objects behind trait objects.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Identity comparison for nodes behind trait objects.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    node_key(a) == node_key(b)
}

/// Address of a node, usable as a visited-set key.
pub(crate) fn node_key(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as *const () as usize
}

pub(crate) fn object_key(object: &ObjectRef) -> usize {
    Rc::as_ptr(object) as *const () as usize
}
