//! Binder: the invocation contract between the engine and the host's
//! binding primitives
//!
//! The engine decides *what* to bind; the binder performs the copy, the
//! persistent synchronization, the event subscription or the command
//! assignment. Failures surface as [`BindError`] and the engine logs them
//! without aborting the pass.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BindError;
use crate::model::{
    CommandRef, EventDescriptor, FieldDescriptor, Handler, MethodDescriptor, ObjectRef,
    PropertyDescriptor, SubscriptionId, Value,
};

/// Direction of a property synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    OneTime,
    OneWay,
    TwoWay,
}

impl BindingMode {
    /// Explicit mode wins; otherwise two-way for writable sources, one-way
    /// for read-only ones.
    pub fn resolve(explicit: Option<BindingMode>, source_writable: bool) -> BindingMode {
        match explicit {
            Some(mode) => mode,
            None if source_writable => BindingMode::TwoWay,
            None => BindingMode::OneWay,
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingMode::OneTime => "one-time",
            BindingMode::OneWay => "one-way",
            BindingMode::TwoWay => "two-way",
        };
        f.write_str(name)
    }
}

/// Persistent link from a UI property to a source property.
#[derive(Clone)]
pub struct SyncLink {
    pub mode: BindingMode,
    pub source: ObjectRef,
    pub property: PropertyDescriptor,
}

impl SyncLink {
    /// Current source value.
    pub fn read(&self) -> Value {
        self.property.get()
    }

    /// Write back to the source. Only two-way links write back.
    pub fn write(&self, value: Value) -> Result<(), BindError> {
        match self.mode {
            BindingMode::TwoWay => self.property.set(value),
            _ => Err(BindError::ReadOnly {
                member: self.property.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for SyncLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncLink({} {} {})",
            self.source.type_info().name,
            self.property.name,
            self.mode
        )
    }
}

/// Binding primitives provided by the host UI framework.
pub trait Binder {
    /// One-time value copy, never re-evaluated.
    fn bind_property_copy(&self, ui: &PropertyDescriptor, value: Value) -> Result<(), BindError>;

    /// Persistent synchronization between a UI property and a source property.
    fn bind_property_sync(
        &self,
        ui: &PropertyDescriptor,
        source: &ObjectRef,
        property: &PropertyDescriptor,
        mode: BindingMode,
    ) -> Result<(), BindError>;

    /// Subscribe a handler delegate to a UI event.
    fn bind_event(
        &self,
        ui: &EventDescriptor,
        handler: Handler,
        handled_events_too: bool,
    ) -> Result<SubscriptionId, BindError>;

    /// Assign a command object to a UI command property.
    fn bind_command(&self, ui: &PropertyDescriptor, command: CommandRef) -> Result<(), BindError>;

    /// Source-reference wiring: assign a UI-side value to a target field.
    fn bind_field(&self, field: &FieldDescriptor, value: Value) -> Result<(), BindError>;
}

/// Binder driving the descriptor handles directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorBinder;

impl Binder for DescriptorBinder {
    fn bind_property_copy(&self, ui: &PropertyDescriptor, value: Value) -> Result<(), BindError> {
        ui.set(value)
    }

    fn bind_property_sync(
        &self,
        ui: &PropertyDescriptor,
        source: &ObjectRef,
        property: &PropertyDescriptor,
        mode: BindingMode,
    ) -> Result<(), BindError> {
        if mode == BindingMode::OneTime {
            return ui.set(property.get());
        }
        if !ui.is_linkable() {
            warn!(
                ui = %ui.name,
                source = %property.name,
                "UI property cannot link, falling back to one-time copy"
            );
            return ui.set(property.get());
        }
        debug!(ui = %ui.name, source = %property.name, %mode, "linking property");
        ui.link(SyncLink {
            mode,
            source: Rc::clone(source),
            property: property.clone(),
        })
    }

    fn bind_event(
        &self,
        ui: &EventDescriptor,
        handler: Handler,
        handled_events_too: bool,
    ) -> Result<SubscriptionId, BindError> {
        ui.subscribe(handler, handled_events_too)
    }

    fn bind_command(&self, ui: &PropertyDescriptor, command: CommandRef) -> Result<(), BindError> {
        ui.set(Value::Command(command))
    }

    fn bind_field(&self, field: &FieldDescriptor, value: Value) -> Result<(), BindError> {
        field.set(value)
    }
}

/// Build an event handler delegate from a method descriptor.
///
/// Arity 0 receives nothing, arity 1 the event args, arity 2 and more the
/// sender followed by the args.
pub fn method_handler(method: &MethodDescriptor) -> Handler {
    let method = method.clone();
    Rc::new(move |sender: &Value, args: &Value| {
        let result = match method.arity {
            0 => method.invoke(&[]),
            1 => method.invoke(std::slice::from_ref(args)),
            _ => method.invoke(&[sender.clone(), args.clone()]),
        };
        if let Err(e) = result {
            warn!(method = %method.name, error = %e, "event handler failed");
        }
    })
}
