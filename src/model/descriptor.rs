//! Member descriptors: capability-tagged metadata with function handles
//!
//! Handles are captured once when a host hands out its members, so a
//! resolution pass never re-queries the host per pairing attempt.

use std::fmt;
use std::rc::Rc;

use super::{Annotation, Value, ValueKind};
use crate::binder::SyncLink;
use crate::error::BindError;

pub type Getter = Rc<dyn Fn() -> Value>;
pub type Setter = Rc<dyn Fn(Value) -> Result<(), BindError>>;
pub type Linker = Rc<dyn Fn(SyncLink) -> Result<(), BindError>>;
pub type Invoker = Rc<dyn Fn(&[Value]) -> Result<Value, BindError>>;

/// Event handler: `(sender, args)`.
pub type Handler = Rc<dyn Fn(&Value, &Value)>;

pub type Subscribe = Rc<dyn Fn(Handler, bool) -> Result<SubscriptionId, BindError>>;
pub type Unsubscribe = Rc<dyn Fn(SubscriptionId) -> bool>;

/// Token returned by an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Which capability a member exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Event,
    Method,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Property => "property",
            MemberKind::Event => "event",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub enum MemberDescriptor {
    Property(PropertyDescriptor),
    Event(EventDescriptor),
    Method(MethodDescriptor),
    Field(FieldDescriptor),
}

impl MemberDescriptor {
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Property(p) => &p.name,
            MemberDescriptor::Event(e) => &e.name,
            MemberDescriptor::Method(m) => &m.name,
            MemberDescriptor::Field(f) => &f.name,
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDescriptor::Property(_) => MemberKind::Property,
            MemberDescriptor::Event(_) => MemberKind::Event,
            MemberDescriptor::Method(_) => MemberKind::Method,
            MemberDescriptor::Field(_) => MemberKind::Field,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            MemberDescriptor::Property(p) => &p.annotations,
            MemberDescriptor::Event(e) => &e.annotations,
            MemberDescriptor::Method(m) => &m.annotations,
            MemberDescriptor::Field(f) => &f.annotations,
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.name())
    }
}

#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value_kind: ValueKind,
    pub annotations: Vec<Annotation>,
    get: Getter,
    set: Option<Setter>,
    link: Option<Linker>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value_kind: ValueKind, get: impl Fn() -> Value + 'static) -> Self {
        Self {
            name: name.into(),
            value_kind,
            annotations: Vec::new(),
            get: Rc::new(get),
            set: None,
            link: None,
        }
    }

    pub fn with_setter(mut self, set: impl Fn(Value) -> Result<(), BindError> + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }

    /// Persistent synchronization hook (UI-side properties).
    pub fn with_linker(mut self, link: impl Fn(SyncLink) -> Result<(), BindError> + 'static) -> Self {
        self.link = Some(Rc::new(link));
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn get(&self) -> Value {
        (self.get)()
    }

    pub fn set(&self, value: Value) -> Result<(), BindError> {
        match &self.set {
            Some(set) => set(value),
            None => Err(BindError::ReadOnly {
                member: self.name.clone(),
            }),
        }
    }

    pub fn link(&self, link: SyncLink) -> Result<(), BindError> {
        match &self.link {
            Some(linker) => linker(link),
            None => Err(BindError::Unsupported {
                member: self.name.clone(),
                operation: "persistent synchronization".to_string(),
            }),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    pub fn is_linkable(&self) -> bool {
        self.link.is_some()
    }
}

#[derive(Clone)]
pub struct EventDescriptor {
    pub name: String,
    /// Kind of the event args value
    pub args_kind: ValueKind,
    pub annotations: Vec<Annotation>,
    subscribe: Subscribe,
    unsubscribe: Unsubscribe,
}

impl EventDescriptor {
    pub fn new(
        name: impl Into<String>,
        subscribe: impl Fn(Handler, bool) -> Result<SubscriptionId, BindError> + 'static,
        unsubscribe: impl Fn(SubscriptionId) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            args_kind: ValueKind::Any,
            annotations: Vec::new(),
            subscribe: Rc::new(subscribe),
            unsubscribe: Rc::new(unsubscribe),
        }
    }

    pub fn subscribe(&self, handler: Handler, handled_events_too: bool) -> Result<SubscriptionId, BindError> {
        (self.subscribe)(handler, handled_events_too)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (self.unsubscribe)(id)
    }
}

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub arity: usize,
    pub is_static: bool,
    pub returns: ValueKind,
    pub annotations: Vec<Annotation>,
    invoke: Invoker,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        invoke: impl Fn(&[Value]) -> Result<Value, BindError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            is_static: false,
            returns: ValueKind::Any,
            annotations: Vec::new(),
            invoke: Rc::new(invoke),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn returning(mut self, returns: ValueKind) -> Self {
        self.returns = returns;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Invoke with at most `arity` leading arguments; missing ones are `Null`.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, BindError> {
        if args.len() == self.arity {
            return (self.invoke)(args);
        }
        let mut fitted: Vec<Value> = args.iter().take(self.arity).cloned().collect();
        fitted.resize(self.arity, Value::Null);
        (self.invoke)(&fitted)
    }
}

#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub value_kind: ValueKind,
    pub annotations: Vec<Annotation>,
    get: Getter,
    set: Setter,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        value_kind: ValueKind,
        get: impl Fn() -> Value + 'static,
        set: impl Fn(Value) -> Result<(), BindError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            value_kind,
            annotations: Vec::new(),
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn get(&self) -> Value {
        (self.get)()
    }

    pub fn set(&self, value: Value) -> Result<(), BindError> {
        (self.set)(value)
    }
}
