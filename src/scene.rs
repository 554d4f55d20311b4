//! Scene files: a UI tree, view-model types and configuration in YAML
//!
//! ```yaml
//! schema: autowire/scene@0.1
//! types:
//!   - name: App.ViewModels.MainPageViewModel
//!     properties:
//!       - { name: Title_Text, value: "Orders" }
//!     methods:
//!       - { name: Save_Click }
//! tree:
//!   type: App.Views.MainPage
//!   children:
//!     - { type: Controls.TextBlock, name: Title, properties: [{ name: Text, kind: text }] }
//!     - { type: Controls.Button, name: Save, events: [Click] }
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::warn;

use crate::config::AutoWireConfig;
use crate::discovery::{ResourceKey, TypeRegistry};
use crate::error::{Result, WireError};
use crate::host::{MemoryContainer, MemoryNode, MemoryNodeBuilder, MemoryObject, MemoryResources, MethodBody};
use crate::model::{Annotation, NodeRef, ObjectRef, TypeInfo, Value, ValueKind};
use crate::wiring::ExplicitBinding;

pub const SCENE_SCHEMA: &str = "autowire/scene@0.1";

/// Nested object properties deeper than this are left empty.
const MAX_OBJECT_DEPTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub schema: String,
    #[serde(default)]
    pub config: AutoWireConfig,
    /// Full name of the type bound to the root; discovery runs when absent
    #[serde(default)]
    pub bound: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default)]
    pub container: Vec<ContainerEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    pub tree: NodeSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Full type name
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_true")]
    pub constructible: bool,
    #[serde(default = "default_true")]
    pub observable: bool,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub value: Json,
    /// Full type name of a nested object held by the property
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub arity: usize,
    #[serde(default)]
    pub returns: Option<Json>,
    #[serde(default)]
    pub returns_property: Option<String>,
    #[serde(default)]
    pub assigns: Option<AssignSpec>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignSpec {
    pub property: String,
    pub value: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Dictionary key; the instance type itself when absent
    #[serde(default)]
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Declared name of the node owning the dictionary; global when absent
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Full type name
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Vec<NodePropertySpec>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    #[serde(default)]
    pub logical_children: Vec<NodeSpec>,
    /// Named entries outside the hierarchy, keyed by their `name`
    #[serde(default)]
    pub scope: Vec<NodeSpec>,
    #[serde(default)]
    pub bindings: Vec<ExplicitBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePropertySpec {
    pub name: String,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub value: Json,
}

fn default_true() -> bool {
    true
}

/// A scene turned into live in-memory hosts.
pub struct LoadedScene {
    pub root: Rc<MemoryNode>,
    pub registry: TypeRegistry,
    pub container: MemoryContainer,
    pub resources: MemoryResources,
    /// Explicit bindings with the node declaring them
    pub bindings: Vec<(Rc<MemoryNode>, ExplicitBinding)>,
    /// Every object constructed so far, in construction order
    pub instances: Rc<RefCell<Vec<Rc<MemoryObject>>>>,
}

impl LoadedScene {
    pub fn root_ref(&self) -> NodeRef {
        Rc::clone(&self.root) as NodeRef
    }

    pub fn node(&self, name: &str) -> Result<Rc<MemoryNode>> {
        self.root.find(name).ok_or_else(|| WireError::NodeNotFound { node: name.to_string() })
    }

    /// Construct an instance of a registered type.
    pub fn construct(&self, full_name: &str) -> Result<ObjectRef> {
        self.registry
            .get(full_name)
            .and_then(|entry| entry.construct())
            .ok_or_else(|| WireError::UnknownType {
                name: full_name.to_string(),
            })
    }
}

impl Scene {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scene: Scene = serde_yaml::from_str(yaml)?;
        if scene.schema != SCENE_SCHEMA {
            return Err(WireError::InvalidSchema {
                expected: SCENE_SCHEMA.to_string(),
                found: scene.schema,
            });
        }
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    fn type_spec(&self, full_name: &str) -> Option<&TypeSpec> {
        self.types.iter().find(|t| t.name == full_name)
    }

    fn require_type(&self, full_name: &str) -> Result<&TypeSpec> {
        self.type_spec(full_name).ok_or_else(|| WireError::UnknownType {
            name: full_name.to_string(),
        })
    }

    /// Check configuration and every type and node reference.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if let Some(bound) = &self.bound {
            self.require_type(bound)?;
        }
        for spec in &self.types {
            for property in &spec.properties {
                if let Some(object) = &property.object {
                    self.require_type(object)?;
                }
            }
        }
        for entry in &self.container {
            self.require_type(&entry.type_name)?;
        }
        for entry in &self.resources {
            self.require_type(&entry.type_name)?;
            if let Some(scope) = &entry.scope {
                if !self.tree.contains(scope) {
                    return Err(WireError::NodeNotFound { node: scope.clone() });
                }
            }
        }
        Ok(())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn node_count(&self) -> usize {
        self.tree.count()
    }

    /// Build the hosts: node tree, type registry, container and resources.
    pub fn instantiate(&self) -> Result<LoadedScene> {
        self.validate()?;

        let specs = Rc::new(self.types.clone());
        let instances: Rc<RefCell<Vec<Rc<MemoryObject>>>> = Rc::new(RefCell::new(Vec::new()));

        let mut registry = TypeRegistry::new();
        for spec in self.types.iter() {
            let info = TypeInfo::parse(&spec.name).with_aliases(&spec.aliases.iter().map(String::as_str).collect::<Vec<_>>());
            if !spec.constructible {
                registry.register_abstract(info);
                continue;
            }
            let (specs, instances, name) = (Rc::clone(&specs), Rc::clone(&instances), spec.name.clone());
            registry.register(info, move || build_object(&name, &specs, &instances, 0) as ObjectRef);
        }

        let mut bindings = Vec::new();
        let root = build_node(&self.tree, &mut bindings);

        let mut container = MemoryContainer::new();
        for entry in &self.container {
            let info = TypeInfo::parse(&entry.type_name);
            let instance: ObjectRef = build_object(&entry.type_name, &specs, &instances, 0);
            match &entry.key {
                Some(key) => container.insert_keyed(&info, key, instance),
                None => container.insert(&info, instance),
            };
        }

        let mut resources = MemoryResources::new();
        for entry in &self.resources {
            let info = TypeInfo::parse(&entry.type_name);
            let key = match &entry.key {
                Some(key) => ResourceKey::Name(key.clone()),
                None => ResourceKey::Type(info),
            };
            let value = Value::Object(build_object(&entry.type_name, &specs, &instances, 0));
            match &entry.scope {
                Some(scope) => {
                    let owner = root.find(scope).ok_or_else(|| WireError::NodeNotFound { node: scope.clone() })?;
                    resources.insert_scoped(&(owner as NodeRef), key, value)
                }
                None => resources.insert_global(key, value),
            };
        }

        Ok(LoadedScene {
            root,
            registry,
            container,
            resources,
            bindings,
            instances,
        })
    }
}

impl NodeSpec {
    fn contains(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
            || self.children.iter().chain(&self.logical_children).any(|c| c.contains(name))
    }

    fn count(&self) -> usize {
        1 + self
            .children
            .iter()
            .chain(&self.logical_children)
            .map(NodeSpec::count)
            .sum::<usize>()
    }
}

fn node_builder(spec: &NodeSpec) -> MemoryNodeBuilder {
    let info = TypeInfo::parse(&spec.type_name);
    let mut builder = MemoryNode::builder(&info.namespace, &info.name);
    if let Some(name) = &spec.name {
        builder = builder.name(name);
    }
    for property in &spec.properties {
        builder = builder.property(&property.name, property.kind, data(&property.value));
    }
    for event in &spec.events {
        builder = builder.event(event);
    }
    builder
}

fn build_node(spec: &NodeSpec, bindings: &mut Vec<(Rc<MemoryNode>, ExplicitBinding)>) -> Rc<MemoryNode> {
    let mut builder = node_builder(spec);
    for child in &spec.children {
        builder = builder.child_node(build_node(child, bindings));
    }
    for child in &spec.logical_children {
        builder = builder.logical_child_node(build_node(child, bindings));
    }
    for entry in &spec.scope {
        match &entry.name {
            Some(name) => builder = builder.scope_name(name, node_builder(entry)),
            None => warn!(node_type = %entry.type_name, "scope entry without a name ignored"),
        }
    }

    let node = builder.build_rc();
    bindings.extend(spec.bindings.iter().map(|b| (Rc::clone(&node), b.clone())));
    node
}

/// Build an object of a declared type. Unknown nested types leave the
/// property empty; `Scene::validate` reports them.
fn build_object(
    full_name: &str,
    specs: &[TypeSpec],
    instances: &Rc<RefCell<Vec<Rc<MemoryObject>>>>,
    depth: usize,
) -> Rc<MemoryObject> {
    let info = TypeInfo::parse(full_name);
    let mut builder = MemoryObject::builder(&info.namespace, &info.name);

    let Some(spec) = specs.iter().find(|t| t.name == full_name) else {
        warn!(type_name = full_name, "building undeclared type as an empty object");
        return builder.build_rc();
    };

    builder = builder.aliases(&spec.aliases.iter().map(String::as_str).collect::<Vec<_>>());
    if !spec.observable {
        builder = builder.unobservable();
    }

    for property in &spec.properties {
        let value = match &property.object {
            Some(nested) if depth < MAX_OBJECT_DEPTH => {
                Value::Object(build_object(nested, specs, instances, depth + 1))
            }
            Some(nested) => {
                warn!(type_name = %nested, "object nesting too deep, property left empty");
                Value::Null
            }
            None => data(&property.value),
        };
        builder = if property.read_only {
            builder.read_only_property_with(&property.name, value, property.annotations.clone())
        } else {
            builder.property_with(&property.name, value, property.annotations.clone())
        };
    }

    for method in &spec.methods {
        let body = if let Some(assign) = &method.assigns {
            MethodBody::Assign {
                property: assign.property.clone(),
                value: data(&assign.value),
            }
        } else if let Some(property) = &method.returns_property {
            MethodBody::ReturnProperty(property.clone())
        } else if let Some(value) = &method.returns {
            MethodBody::Return(data(value))
        } else {
            MethodBody::Record
        };
        builder = builder.method_body(&method.name, method.arity, body, method.annotations.clone());
    }

    for field in &spec.fields {
        builder = builder.field_with(&field.name, field.annotations.clone());
    }

    let object = builder.build_rc();
    instances.borrow_mut().push(Rc::clone(&object));
    object
}

fn data(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        other => Value::Data(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindableObject, UiNode};

    const SCENE: &str = r#"
schema: autowire/scene@0.1
bound: App.ViewModels.MainPageViewModel
types:
  - name: App.ViewModels.MainPageViewModel
    aliases: [Main]
    properties:
      - { name: Title_Text, value: "Orders" }
      - { name: Details, object: App.ViewModels.DetailsViewModel, annotations: [{ kind: append }] }
    methods:
      - { name: Save_Click }
  - name: App.ViewModels.DetailsViewModel
    properties:
      - { name: Name_Text, value: "n/a" }
tree:
  type: App.Views.MainPage
  name: Root
  children:
    - { type: Controls.TextBlock, name: Title, properties: [{ name: Text, kind: text }] }
    - type: Controls.Button
      name: Save
      events: [Click]
      bindings:
        - { ui_member: Content, property_name: Title_Text }
"#;

    #[test]
    fn parses_and_instantiates() {
        let scene = Scene::from_yaml(SCENE).unwrap();
        assert_eq!(scene.type_count(), 2);
        assert_eq!(scene.node_count(), 3);

        let loaded = scene.instantiate().unwrap();
        assert_eq!(loaded.root.name(), Some("Root"));
        assert_eq!(loaded.bindings.len(), 1);
        assert_eq!(loaded.node("Save").unwrap().type_info().name, "Button");

        let vm = loaded.construct("App.ViewModels.MainPageViewModel").unwrap();
        assert_eq!(vm.type_info().aliases, ["Main"]);
        assert_eq!(loaded.instances.borrow().len(), 2);
    }

    #[test]
    fn rejects_wrong_schema() {
        let yaml = SCENE.replace("autowire/scene@0.1", "autowire/scene@9");
        assert!(matches!(Scene::from_yaml(&yaml), Err(WireError::InvalidSchema { .. })));
    }

    #[test]
    fn unknown_bound_type_fails_validation() {
        let yaml = SCENE.replace("bound: App.ViewModels.MainPageViewModel", "bound: App.Missing");
        let scene = Scene::from_yaml(&yaml).unwrap();
        assert!(matches!(scene.validate(), Err(WireError::UnknownType { .. })));
    }

    #[test]
    fn missing_node_lookup() {
        let loaded = Scene::from_yaml(SCENE).unwrap().instantiate().unwrap();
        assert!(matches!(loaded.node("Nope"), Err(WireError::NodeNotFound { .. })));
    }
}
