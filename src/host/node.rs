//! In-memory UI node

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::binder::{BindingMode, SyncLink};
use crate::error::BindError;
use crate::model::{
    EventDescriptor, Handler, MemberDescriptor, NodeRef, PropertyDescriptor, SubscriptionId,
    TypeInfo, UiNode, Value, ValueKind,
};

/// Members every node carries regardless of its declaration.
pub const CONTEXT_PROPERTY: &str = "DataContext";
pub const CONTEXT_CHANGED_EVENT: &str = "DataContextChanged";
pub const AUTO_WIRED_PROPERTY: &str = "AutoWiredObject";
pub const LOADED_EVENT: &str = "Loaded";

enum PropertyState {
    Local(Value),
    Linked(SyncLink),
}

struct NodeProperty {
    kind: ValueKind,
    state: PropertyState,
    /// Event raised after a successful write
    changed_event: Option<String>,
}

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
    handled_events_too: bool,
}

#[derive(Default)]
struct NodeEvent {
    subscriptions: Vec<Subscription>,
}

pub struct MemoryNode {
    type_info: TypeInfo,
    name: Option<String>,
    self_ref: Weak<MemoryNode>,
    parent: RefCell<Weak<MemoryNode>>,
    children: RefCell<Vec<Rc<MemoryNode>>>,
    logical_children: RefCell<Vec<Rc<MemoryNode>>>,
    scope: RefCell<Vec<(String, Rc<MemoryNode>)>>,
    properties: RefCell<FxHashMap<String, NodeProperty>>,
    events: RefCell<FxHashMap<String, NodeEvent>>,
    next_subscription: Cell<u64>,
}

impl MemoryNode {
    pub fn builder(namespace: &str, type_name: &str) -> MemoryNodeBuilder {
        MemoryNodeBuilder::new(TypeInfo::new(namespace, type_name))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn as_node_ref(&self) -> Option<NodeRef> {
        self.self_ref.upgrade().map(|rc| rc as NodeRef)
    }

    /// Current value of a property; linked properties read their source.
    pub fn property(&self, name: &str) -> Value {
        let link = match self.properties.borrow().get(name) {
            Some(NodeProperty { state: PropertyState::Local(value), .. }) => return value.clone(),
            Some(NodeProperty { state: PropertyState::Linked(link), .. }) => link.clone(),
            None => return Value::Null,
        };
        link.read()
    }

    /// Write a property as the UI would.
    ///
    /// Two-way links write back to their source; any other link is replaced
    /// by the local value.
    pub fn set_property(&self, name: &str, value: Value) -> Result<(), BindError> {
        let (changed_event, link) = {
            let mut properties = self.properties.borrow_mut();
            let property = properties.get_mut(name).ok_or_else(|| BindError::Unsupported {
                member: name.to_string(),
                operation: "assignment".to_string(),
            })?;
            if !property.kind.accepts(&value) {
                return Err(BindError::TypeMismatch {
                    member: name.to_string(),
                    expected: property.kind,
                    actual: value.kind(),
                });
            }
            let link = match &property.state {
                PropertyState::Linked(link) if link.mode == BindingMode::TwoWay => Some(link.clone()),
                _ => None,
            };
            if link.is_none() {
                property.state = PropertyState::Local(value.clone());
            }
            (property.changed_event.clone(), link)
        };

        if let Some(link) = link {
            link.write(value.clone())?;
        }
        if let Some(event) = changed_event {
            self.raise(&event, &value);
        }
        Ok(())
    }

    fn link_property(&self, name: &str, link: SyncLink) -> Result<(), BindError> {
        let mut properties = self.properties.borrow_mut();
        let property = properties.get_mut(name).ok_or_else(|| BindError::Unsupported {
            member: name.to_string(),
            operation: "persistent synchronization".to_string(),
        })?;
        let current = link.read();
        if !property.kind.accepts(&current) {
            return Err(BindError::TypeMismatch {
                member: name.to_string(),
                expected: property.kind,
                actual: current.kind(),
            });
        }
        property.state = PropertyState::Linked(link);
        Ok(())
    }

    /// Binding mode of a linked property.
    pub fn link_mode(&self, name: &str) -> Option<BindingMode> {
        match self.properties.borrow().get(name) {
            Some(NodeProperty { state: PropertyState::Linked(link), .. }) => Some(link.mode),
            _ => None,
        }
    }

    fn subscribe(&self, event: &str, handler: Handler, handled_events_too: bool) -> Result<SubscriptionId, BindError> {
        let mut events = self.events.borrow_mut();
        let slot = events.get_mut(event).ok_or_else(|| BindError::Unsupported {
            member: event.to_string(),
            operation: "subscription".to_string(),
        })?;
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        slot.subscriptions.push(Subscription {
            id,
            handler,
            handled_events_too,
        });
        Ok(id)
    }

    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(slot) = events.get_mut(event) else {
            return false;
        };
        let before = slot.subscriptions.len();
        slot.subscriptions.retain(|s| s.id != id);
        slot.subscriptions.len() != before
    }

    /// Raise an event; returns the number of handlers invoked.
    pub fn raise(&self, event: &str, args: &Value) -> usize {
        self.dispatch(event, args, false)
    }

    /// Raise an event already marked handled: only handlers subscribed with
    /// `handled_events_too` run.
    pub fn raise_handled(&self, event: &str, args: &Value) -> usize {
        self.dispatch(event, args, true)
    }

    fn dispatch(&self, event: &str, args: &Value, handled: bool) -> usize {
        let handlers: Vec<Handler> = match self.events.borrow().get(event) {
            Some(slot) => slot
                .subscriptions
                .iter()
                .filter(|s| !handled || s.handled_events_too)
                .map(|s| Rc::clone(&s.handler))
                .collect(),
            None => return 0,
        };
        let sender = self.as_node_ref().map(Value::Node).unwrap_or_default();
        for handler in &handlers {
            handler(&sender, args);
        }
        handlers.len()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .get(event)
            .map(|slot| slot.subscriptions.len())
            .unwrap_or(0)
    }

    /// Depth-first search of the visual and logical subtree by declared name.
    pub fn find(&self, name: &str) -> Option<Rc<MemoryNode>> {
        let root = self.self_ref.upgrade()?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.name.as_deref() == Some(name) {
                return Some(node);
            }
            stack.extend(node.logical_children.borrow().iter().rev().cloned());
            stack.extend(node.children.borrow().iter().rev().cloned());
        }
        None
    }

    pub fn add_child(&self, child: Rc<MemoryNode>) {
        *child.parent.borrow_mut() = self.self_ref.clone();
        self.children.borrow_mut().push(child);
    }

    pub fn add_logical_child(&self, child: Rc<MemoryNode>) {
        *child.parent.borrow_mut() = self.self_ref.clone();
        self.logical_children.borrow_mut().push(child);
    }

    pub fn define_property(&self, name: &str, kind: ValueKind, value: Value) {
        self.properties.borrow_mut().insert(
            name.to_string(),
            NodeProperty {
                kind,
                state: PropertyState::Local(value),
                changed_event: None,
            },
        );
    }

    pub fn define_event(&self, name: &str) {
        self.events.borrow_mut().entry(name.to_string()).or_default();
    }
}

impl UiNode for MemoryNode {
    fn type_info(&self) -> TypeInfo {
        self.type_info.clone()
    }

    fn declared_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn visual_children(&self) -> Vec<NodeRef> {
        self.children.borrow().iter().map(|c| Rc::clone(c) as NodeRef).collect()
    }

    fn logical_children(&self) -> Vec<NodeRef> {
        self.logical_children
            .borrow()
            .iter()
            .map(|c| Rc::clone(c) as NodeRef)
            .collect()
    }

    fn scope_names(&self) -> Vec<(String, NodeRef)> {
        self.scope
            .borrow()
            .iter()
            .map(|(name, node)| (name.clone(), Rc::clone(node) as NodeRef))
            .collect()
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade().map(|p| p as NodeRef)
    }

    fn member(&self, name: &str) -> Option<MemberDescriptor> {
        if let Some(property) = self.properties.borrow().get(name) {
            let (get_ref, set_ref, link_ref) = (self.self_ref.clone(), self.self_ref.clone(), self.self_ref.clone());
            let (get_name, set_name, link_name) = (name.to_string(), name.to_string(), name.to_string());
            let descriptor = PropertyDescriptor::new(name, property.kind, move || {
                get_ref.upgrade().map(|n| n.property(&get_name)).unwrap_or_default()
            })
            .with_setter(move |value| match set_ref.upgrade() {
                Some(node) => node.set_property(&set_name, value),
                None => Ok(()),
            })
            .with_linker(move |link| match link_ref.upgrade() {
                Some(node) => node.link_property(&link_name, link),
                None => Ok(()),
            });
            return Some(MemberDescriptor::Property(descriptor));
        }

        if self.events.borrow().contains_key(name) {
            let (sub_ref, unsub_ref) = (self.self_ref.clone(), self.self_ref.clone());
            let (sub_name, unsub_name) = (name.to_string(), name.to_string());
            let descriptor = EventDescriptor::new(
                name,
                move |handler, handled_events_too| match sub_ref.upgrade() {
                    Some(node) => node.subscribe(&sub_name, handler, handled_events_too),
                    None => Err(BindError::Unsupported {
                        member: sub_name.clone(),
                        operation: "subscription on a dropped node".to_string(),
                    }),
                },
                move |id| unsub_ref.upgrade().map(|n| n.unsubscribe(&unsub_name, id)).unwrap_or(false),
            );
            return Some(MemberDescriptor::Event(descriptor));
        }

        None
    }
}

pub struct MemoryNodeBuilder {
    type_info: TypeInfo,
    name: Option<String>,
    properties: Vec<(String, ValueKind, Value)>,
    events: Vec<String>,
    children: Vec<Rc<MemoryNode>>,
    logical_children: Vec<Rc<MemoryNode>>,
    scope: Vec<(String, Rc<MemoryNode>)>,
}

impl MemoryNodeBuilder {
    fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            name: None,
            properties: Vec::new(),
            events: Vec::new(),
            children: Vec::new(),
            logical_children: Vec::new(),
            scope: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn property(mut self, name: &str, kind: ValueKind, value: impl Into<Value>) -> Self {
        self.properties.push((name.to_string(), kind, value.into()));
        self
    }

    pub fn event(mut self, name: &str) -> Self {
        self.events.push(name.to_string());
        self
    }

    pub fn child(self, child: MemoryNodeBuilder) -> Self {
        self.child_node(child.build_rc())
    }

    pub fn child_node(mut self, child: Rc<MemoryNode>) -> Self {
        self.children.push(child);
        self
    }

    pub fn logical_child(self, child: MemoryNodeBuilder) -> Self {
        self.logical_child_node(child.build_rc())
    }

    pub fn logical_child_node(mut self, child: Rc<MemoryNode>) -> Self {
        self.logical_children.push(child);
        self
    }

    pub fn scope_name(mut self, name: &str, entry: MemoryNodeBuilder) -> Self {
        self.scope.push((name.to_string(), entry.build_rc()));
        self
    }

    pub fn build(self) -> NodeRef {
        self.build_rc()
    }

    pub fn build_rc(self) -> Rc<MemoryNode> {
        let mut properties: FxHashMap<String, NodeProperty> = FxHashMap::default();
        properties.insert(
            CONTEXT_PROPERTY.to_string(),
            NodeProperty {
                kind: ValueKind::Any,
                state: PropertyState::Local(Value::Null),
                changed_event: Some(CONTEXT_CHANGED_EVENT.to_string()),
            },
        );
        properties.insert(
            AUTO_WIRED_PROPERTY.to_string(),
            NodeProperty {
                kind: ValueKind::Any,
                state: PropertyState::Local(Value::Null),
                changed_event: None,
            },
        );
        for (name, kind, value) in self.properties {
            properties.insert(
                name,
                NodeProperty {
                    kind,
                    state: PropertyState::Local(value),
                    changed_event: None,
                },
            );
        }

        let mut events: FxHashMap<String, NodeEvent> = FxHashMap::default();
        for name in [CONTEXT_CHANGED_EVENT, LOADED_EVENT]
            .into_iter()
            .map(str::to_string)
            .chain(self.events)
        {
            events.entry(name).or_default();
        }

        let node = Rc::new_cyclic(|self_ref| MemoryNode {
            type_info: self.type_info,
            name: self.name,
            self_ref: self_ref.clone(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            logical_children: RefCell::new(Vec::new()),
            scope: RefCell::new(Vec::new()),
            properties: RefCell::new(properties),
            events: RefCell::new(events),
            next_subscription: Cell::new(1),
        });

        for child in self.children {
            node.add_child(child);
        }
        for child in self.logical_children {
            node.add_logical_child(child);
        }
        for (name, entry) in self.scope {
            *entry.parent.borrow_mut() = Rc::downgrade(&node);
            node.scope.borrow_mut().push((name, entry));
        }

        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryObject;
    use serde_json::json;
    use std::cell::Cell;

    fn button() -> Rc<MemoryNode> {
        MemoryNode::builder("Controls", "Button")
            .name("SaveButton")
            .property("Content", ValueKind::Text, "Save")
            .property("IsEnabled", ValueKind::Bool, true)
            .event("Click")
            .build_rc()
    }

    #[test]
    fn property_type_is_checked() {
        let node = button();
        assert!(node.set_property("Content", Value::from("Store")).is_ok());
        assert!(matches!(
            node.set_property("IsEnabled", Value::from("yes")),
            Err(BindError::TypeMismatch { .. })
        ));
        assert_eq!(node.property("Content"), Value::from("Store"));
    }

    #[test]
    fn subscribe_raise_unsubscribe() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);

        let Some(MemberDescriptor::Event(click)) = node.member("Click") else {
            panic!("Click should be an event");
        };
        let id = click
            .subscribe(Rc::new(move |_, _| counter.set(counter.get() + 1)), false)
            .unwrap();

        assert_eq!(node.raise("Click", &Value::Null), 1);
        assert_eq!(node.raise_handled("Click", &Value::Null), 0);
        assert!(click.unsubscribe(id));
        assert_eq!(node.raise("Click", &Value::Null), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn linked_property_reads_and_writes_source() {
        let node = button();
        let vm = MemoryObject::builder("App", "Vm").property("Caption", json!("Go")).build_rc();
        let source: crate::model::ObjectRef = vm.clone();
        let Some(MemberDescriptor::Property(caption)) =
            source.members().into_iter().find(|m| m.name() == "Caption")
        else {
            panic!("Caption should be a property");
        };

        node.link_property(
            "Content",
            SyncLink {
                mode: BindingMode::TwoWay,
                source: Rc::clone(&source),
                property: caption,
            },
        )
        .unwrap();

        assert_eq!(node.property("Content"), Value::from("Go"));
        vm.set("Caption", json!("Run"));
        assert_eq!(node.property("Content"), Value::from("Run"));
        node.set_property("Content", Value::from("Stop")).unwrap();
        assert_eq!(vm.get("Caption"), Value::from("Stop"));
        assert_eq!(node.link_mode("Content"), Some(BindingMode::TwoWay));
    }

    #[test]
    fn context_change_raises_event() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        node.subscribe(
            CONTEXT_CHANGED_EVENT,
            Rc::new(move |_, _| counter.set(counter.get() + 1)),
            false,
        )
        .unwrap();

        let vm = MemoryObject::builder("App", "Vm").build();
        node.set_property(CONTEXT_PROPERTY, Value::Object(vm)).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn parent_and_find() {
        let root = MemoryNode::builder("Views", "MainPage")
            .child(MemoryNode::builder("Controls", "Panel").child(MemoryNode::builder("Controls", "Button").name("Deep")))
            .build_rc();
        let deep = root.find("Deep").unwrap();
        let parent = deep.parent().unwrap();
        assert_eq!(parent.type_info().name, "Panel");
        assert!(root.find("Missing").is_none());
    }
}
