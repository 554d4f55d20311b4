//! In-memory bindable object

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::BindError;
use crate::model::{
    Annotation, BindableObject, FieldDescriptor, MemberDescriptor, MethodDescriptor, Notifier,
    ObjectRef, PropertyDescriptor, TypeInfo, Value, ValueKind,
};

/// What a method does besides recording its invocation.
#[derive(Clone)]
pub enum MethodBody {
    /// Return null
    Record,
    Return(Value),
    /// Return the current value of a property
    ReturnProperty(String),
    /// Write a property, return null
    Assign { property: String, value: Value },
    Custom(Rc<dyn Fn(&MemoryObject, &[Value]) -> Value>),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Record => write!(f, "Record"),
            MethodBody::Return(value) => write!(f, "Return({value:?})"),
            MethodBody::ReturnProperty(name) => write!(f, "ReturnProperty({name})"),
            MethodBody::Assign { property, value } => write!(f, "Assign({property} = {value:?})"),
            MethodBody::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// One recorded method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Value>,
}

struct ObjectProperty {
    name: String,
    kind: ValueKind,
    value: Value,
    writable: bool,
    annotations: Vec<Annotation>,
}

struct ObjectMethod {
    name: String,
    arity: usize,
    is_static: bool,
    body: MethodBody,
    annotations: Vec<Annotation>,
}

struct ObjectField {
    name: String,
    value: Value,
    annotations: Vec<Annotation>,
}

pub struct MemoryObject {
    type_info: TypeInfo,
    self_ref: Weak<MemoryObject>,
    properties: RefCell<Vec<ObjectProperty>>,
    methods: Vec<ObjectMethod>,
    fields: RefCell<Vec<ObjectField>>,
    changed: Option<Notifier<str>>,
    calls: RefCell<Vec<Call>>,
}

impl MemoryObject {
    pub fn builder(namespace: &str, name: &str) -> MemoryObjectBuilder {
        MemoryObjectBuilder::new(TypeInfo::new(namespace, name))
    }

    pub fn get(&self, name: &str) -> Value {
        self.properties
            .borrow()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
            .unwrap_or_default()
    }

    /// Write a property from the object's own logic, bypassing writability,
    /// and raise the change notification. Returns false for unknown names.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        let found = {
            let mut properties = self.properties.borrow_mut();
            match properties.iter_mut().find(|p| p.name == name) {
                Some(property) => {
                    property.value = value.into();
                    true
                }
                None => false,
            }
        };
        if found {
            if let Some(changed) = &self.changed {
                changed.notify(name);
            }
        }
        found
    }

    fn set_checked(&self, name: &str, value: Value) -> Result<(), BindError> {
        let kind = self
            .properties
            .borrow()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
            .unwrap_or_default();
        if !kind.accepts(&value) {
            return Err(BindError::TypeMismatch {
                member: name.to_string(),
                expected: kind,
                actual: value.kind(),
            });
        }
        self.set(name, value);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Value {
        self.fields
            .borrow()
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }

    fn set_field(&self, name: &str, value: Value) {
        if let Some(field) = self.fields.borrow_mut().iter_mut().find(|f| f.name == name) {
            field.value = value;
        }
    }

    /// Add or replace a writable property after construction.
    pub fn define_property_with(&self, name: &str, value: impl Into<Value>, annotations: Vec<Annotation>) {
        let value = value.into();
        let property = ObjectProperty {
            name: name.to_string(),
            kind: value.kind(),
            value,
            writable: true,
            annotations,
        };
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = property,
            None => properties.push(property),
        }
    }

    /// Run a method by name, recording the call.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Option<Value> {
        let body = self.methods.iter().find(|m| m.name == name)?.body.clone();
        self.calls.borrow_mut().push(Call {
            method: name.to_string(),
            args: args.to_vec(),
        });
        let result = match body {
            MethodBody::Record => Value::Null,
            MethodBody::Return(value) => value,
            MethodBody::ReturnProperty(property) => self.get(&property),
            MethodBody::Assign { property, value } => {
                self.set(&property, value);
                Value::Null
            }
            MethodBody::Custom(f) => f(self, args),
        };
        Some(result)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.method == method).count()
    }

    fn property_descriptor(&self, property: &ObjectProperty) -> PropertyDescriptor {
        let getter = self.self_ref.clone();
        let name = property.name.clone();
        let descriptor = PropertyDescriptor::new(&property.name, property.kind, move || {
            getter.upgrade().map(|o| o.get(&name)).unwrap_or_default()
        })
        .with_annotations(property.annotations.clone());

        if !property.writable {
            return descriptor;
        }
        let setter = self.self_ref.clone();
        let name = property.name.clone();
        descriptor.with_setter(move |value| match setter.upgrade() {
            Some(object) => object.set_checked(&name, value),
            None => Ok(()),
        })
    }

    fn method_descriptor(&self, method: &ObjectMethod) -> MethodDescriptor {
        let owner = self.self_ref.clone();
        let name = method.name.clone();
        let descriptor = MethodDescriptor::new(&method.name, method.arity, move |args: &[Value]| {
            let object = owner.upgrade().ok_or_else(|| BindError::Invocation {
                member: name.clone(),
                reason: "owner dropped".to_string(),
            })?;
            object.invoke(&name, args).ok_or_else(|| BindError::Invocation {
                member: name.clone(),
                reason: "no such method".to_string(),
            })
        })
        .with_annotations(method.annotations.clone());
        if method.is_static {
            descriptor.as_static()
        } else {
            descriptor
        }
    }

    fn field_descriptor(&self, field: &ObjectField) -> FieldDescriptor {
        let (getter, setter) = (self.self_ref.clone(), self.self_ref.clone());
        let (get_name, set_name) = (field.name.clone(), field.name.clone());
        FieldDescriptor::new(
            &field.name,
            ValueKind::Any,
            move || getter.upgrade().map(|o| o.field(&get_name)).unwrap_or_default(),
            move |value| {
                if let Some(object) = setter.upgrade() {
                    object.set_field(&set_name, value);
                }
                Ok(())
            },
        )
        .with_annotations(field.annotations.clone())
    }
}

impl BindableObject for MemoryObject {
    fn type_info(&self) -> TypeInfo {
        self.type_info.clone()
    }

    /// Properties, then methods, then fields, each in declaration order.
    fn members(&self) -> Vec<MemberDescriptor> {
        let mut members: Vec<MemberDescriptor> = self
            .properties
            .borrow()
            .iter()
            .map(|p| MemberDescriptor::Property(self.property_descriptor(p)))
            .collect();
        members.extend(self.methods.iter().map(|m| MemberDescriptor::Method(self.method_descriptor(m))));
        members.extend(
            self.fields
                .borrow()
                .iter()
                .map(|f| MemberDescriptor::Field(self.field_descriptor(f))),
        );
        members
    }

    fn property_changed(&self) -> Option<&Notifier<str>> {
        self.changed.as_ref()
    }
}

impl fmt::Debug for MemoryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryObject")
            .field("type", &self.type_info.full_name())
            .field("properties", &self.properties.borrow().len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

pub struct MemoryObjectBuilder {
    type_info: TypeInfo,
    properties: Vec<ObjectProperty>,
    methods: Vec<ObjectMethod>,
    fields: Vec<ObjectField>,
    observable: bool,
}

impl MemoryObjectBuilder {
    fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            properties: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            observable: true,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.type_info = self.type_info.with_aliases(aliases);
        self
    }

    pub fn property(self, name: &str, value: impl Into<Value>) -> Self {
        self.property_with(name, value, Vec::new())
    }

    pub fn property_with(mut self, name: &str, value: impl Into<Value>, annotations: Vec<Annotation>) -> Self {
        let value = value.into();
        self.properties.push(ObjectProperty {
            name: name.to_string(),
            kind: value.kind(),
            value,
            writable: true,
            annotations,
        });
        self
    }

    pub fn read_only_property(self, name: &str, value: impl Into<Value>) -> Self {
        self.read_only_property_with(name, value, Vec::new())
    }

    pub fn read_only_property_with(
        mut self,
        name: &str,
        value: impl Into<Value>,
        annotations: Vec<Annotation>,
    ) -> Self {
        let value = value.into();
        self.properties.push(ObjectProperty {
            name: name.to_string(),
            kind: value.kind(),
            value,
            writable: false,
            annotations,
        });
        self
    }

    pub fn method(self, name: &str, arity: usize) -> Self {
        self.method_body(name, arity, MethodBody::Record, Vec::new())
    }

    pub fn method_with(self, name: &str, arity: usize, annotations: Vec<Annotation>) -> Self {
        self.method_body(name, arity, MethodBody::Record, annotations)
    }

    pub fn method_returning(self, name: &str, arity: usize, value: impl Into<Value>) -> Self {
        self.method_body(name, arity, MethodBody::Return(value.into()), Vec::new())
    }

    pub fn method_body(mut self, name: &str, arity: usize, body: MethodBody, annotations: Vec<Annotation>) -> Self {
        self.methods.push(ObjectMethod {
            name: name.to_string(),
            arity,
            is_static: false,
            body,
            annotations,
        });
        self
    }

    /// Mark the last declared method static.
    pub fn static_method(mut self) -> Self {
        if let Some(method) = self.methods.last_mut() {
            method.is_static = true;
        }
        self
    }

    pub fn field(self, name: &str) -> Self {
        self.field_with(name, Vec::new())
    }

    pub fn field_with(mut self, name: &str, annotations: Vec<Annotation>) -> Self {
        self.fields.push(ObjectField {
            name: name.to_string(),
            value: Value::Null,
            annotations,
        });
        self
    }

    /// Drop change notification support.
    pub fn unobservable(mut self) -> Self {
        self.observable = false;
        self
    }

    pub fn build(self) -> ObjectRef {
        self.build_rc()
    }

    pub fn build_rc(self) -> Rc<MemoryObject> {
        Rc::new_cyclic(|self_ref| MemoryObject {
            type_info: self.type_info,
            self_ref: self_ref.clone(),
            properties: RefCell::new(self.properties),
            methods: self.methods,
            fields: RefCell::new(self.fields),
            changed: self.observable.then(Notifier::new),
            calls: RefCell::new(Vec::new()),
        })
    }
}
