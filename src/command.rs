//! Command objects assembled at resolution time
//!
//! A [`CompositeCommand`] joins an execute half and a can-execute half that
//! were resolved independently from the bound object.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::model::{
    Listener, MethodDescriptor, Notifier, ObjectRef, PropertyDescriptor, Value,
};

/// Command interface assigned to UI command properties.
pub trait Command {
    fn execute(&self, parameter: &Value);

    fn can_execute(&self, parameter: &Value) -> bool;

    fn can_execute_changed(&self) -> &Notifier<()>;
}

/// One half of a composite command.
#[derive(Clone)]
pub enum CommandPart {
    Method(MethodDescriptor),
    Property {
        owner: ObjectRef,
        property: PropertyDescriptor,
    },
}

impl CommandPart {
    pub fn name(&self) -> &str {
        match self {
            CommandPart::Method(method) => &method.name,
            CommandPart::Property { property, .. } => &property.name,
        }
    }
}

impl fmt::Debug for CommandPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandPart::Method(m) => write!(f, "Method({})", m.name),
            CommandPart::Property { property, .. } => write!(f, "Property({})", property.name),
        }
    }
}

pub struct CompositeCommand {
    execute: Option<CommandPart>,
    can_execute: Option<CommandPart>,
    changed: Rc<Notifier<()>>,
    /// Keeps the property watch alive as long as the command lives
    _watch: Option<Listener<str>>,
}

impl CompositeCommand {
    pub fn new(execute: Option<CommandPart>, can_execute: Option<CommandPart>) -> Self {
        let changed: Rc<Notifier<()>> = Rc::new(Notifier::new());

        let watch = match &can_execute {
            Some(CommandPart::Property { owner, property }) => owner.property_changed().map(|notifier| {
                let watched = property.name.clone();
                let changed = Rc::clone(&changed);
                notifier.listen(move |name: &str| {
                    if name == watched {
                        changed.notify(&());
                    }
                })
            }),
            _ => None,
        };

        Self {
            execute,
            can_execute,
            changed,
            _watch: watch,
        }
    }

    pub fn execute_part(&self) -> Option<&CommandPart> {
        self.execute.as_ref()
    }

    pub fn can_execute_part(&self) -> Option<&CommandPart> {
        self.can_execute.as_ref()
    }

    /// Raise `can_execute_changed` manually.
    pub fn raise_can_execute_changed(&self) {
        self.changed.notify(&());
    }
}

impl Command for CompositeCommand {
    fn execute(&self, parameter: &Value) {
        match &self.execute {
            Some(CommandPart::Method(method)) => {
                if let Err(e) = method.invoke(std::slice::from_ref(parameter)) {
                    warn!(method = %method.name, error = %e, "command execute failed");
                }
            }
            Some(CommandPart::Property { property, .. }) => match property.get() {
                Value::Command(inner) => inner.execute(parameter),
                other => warn!(
                    property = %property.name,
                    value = ?other,
                    "execute property does not hold a command"
                ),
            },
            None => {}
        }
    }

    fn can_execute(&self, parameter: &Value) -> bool {
        match &self.can_execute {
            Some(CommandPart::Method(method)) => match method.invoke(std::slice::from_ref(parameter)) {
                Ok(value) => value.is_truthy(),
                Err(e) => {
                    warn!(method = %method.name, error = %e, "can-execute failed");
                    false
                }
            },
            Some(CommandPart::Property { property, .. }) => match property.get() {
                Value::Command(inner) => inner.can_execute(parameter),
                value => value.is_truthy(),
            },
            None => true,
        }
    }

    fn can_execute_changed(&self) -> &Notifier<()> {
        &self.changed
    }
}

impl fmt::Debug for CompositeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeCommand")
            .field("execute", &self.execute)
            .field("can_execute", &self.can_execute)
            .finish()
    }
}

/// Closure-backed command for hosts exposing ready-made command properties.
pub struct RelayCommand {
    execute: Box<dyn Fn(&Value)>,
    can_execute: Option<Box<dyn Fn(&Value) -> bool>>,
    changed: Notifier<()>,
}

impl RelayCommand {
    pub fn new(execute: impl Fn(&Value) + 'static) -> Self {
        Self {
            execute: Box::new(execute),
            can_execute: None,
            changed: Notifier::new(),
        }
    }

    pub fn with_can_execute(mut self, can_execute: impl Fn(&Value) -> bool + 'static) -> Self {
        self.can_execute = Some(Box::new(can_execute));
        self
    }

    pub fn raise_can_execute_changed(&self) {
        self.changed.notify(&());
    }
}

impl Command for RelayCommand {
    fn execute(&self, parameter: &Value) {
        (self.execute)(parameter)
    }

    fn can_execute(&self, parameter: &Value) -> bool {
        self.can_execute.as_ref().map(|f| f(parameter)).unwrap_or(true)
    }

    fn can_execute_changed(&self) -> &Notifier<()> {
        &self.changed
    }
}
