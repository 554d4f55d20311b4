//! Deferred entry: wait for the bound object before wiring
//!
//! When the root carries no bound object yet, the engine subscribes once to
//! the root's context-changed event. The first notification that finds an
//! object unsubscribes and runs the pass; later notifications are ignored.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::binder::Binder;
use crate::error::{Result, WireError};
use crate::model::{EventDescriptor, Handler, MemberDescriptor, NodeRef, SubscriptionId, Value};
use crate::report::WiringReport;
use crate::wiring::AutoWire;

/// Result of [`AutoWire::attach`].
#[derive(Debug)]
pub enum Attachment {
    /// The object was available; the pass already ran
    Wired(WiringReport),
    /// Waiting for the context-changed event
    Pending(PendingResolution),
}

/// One-shot subscription that runs a pass on the first notification
/// carrying a bound object.
pub struct PendingResolution {
    event: EventDescriptor,
    subscription: Rc<Cell<Option<SubscriptionId>>>,
    report: Rc<RefCell<Option<WiringReport>>>,
}

impl PendingResolution {
    /// Whether the deferred pass has run.
    pub fn is_resolved(&self) -> bool {
        self.report.borrow().is_some()
    }

    /// Whether the one-shot subscription is still in place.
    pub fn is_waiting(&self) -> bool {
        self.subscription.get().is_some()
    }

    pub fn take_report(&self) -> Option<WiringReport> {
        self.report.borrow_mut().take()
    }

    /// Drop the subscription without running the pass.
    pub fn cancel(&self) -> bool {
        match self.subscription.take() {
            Some(id) => self.event.unsubscribe(id),
            None => false,
        }
    }
}

impl std::fmt::Debug for PendingResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResolution")
            .field("event", &self.event.name)
            .field("waiting", &self.is_waiting())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<B: Binder + 'static> AutoWire<B> {
    /// Wire `root` now if it holds a bound object, otherwise once it gets one.
    pub fn attach(self: &Rc<Self>, root: &NodeRef) -> Result<Attachment> {
        if let Some(object) = self.context_object(root) {
            return Ok(Attachment::Wired(self.wire_object(root, &object)));
        }

        let event_name = &self.config().context_changed_event;
        let Some(MemberDescriptor::Event(event)) = root.member(event_name) else {
            return Err(WireError::Configuration {
                reason: format!("root has no bound object and no '{event_name}' event to wait on"),
            });
        };

        let subscription: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let report: Rc<RefCell<Option<WiringReport>>> = Rc::new(RefCell::new(None));

        let handler: Handler = {
            let engine = Rc::clone(self);
            let root = Rc::downgrade(root);
            let event = event.clone();
            let subscription = Rc::clone(&subscription);
            let report = Rc::clone(&report);
            Rc::new(move |_sender: &Value, _args: &Value| {
                let Some(root) = root.upgrade() else {
                    return;
                };
                let Some(object) = engine.context_object(&root) else {
                    debug!("context changed without a bound object, still waiting");
                    return;
                };
                let Some(id) = subscription.take() else {
                    return;
                };
                event.unsubscribe(id);
                let pass = engine.wire_object(&root, &object);
                *report.borrow_mut() = Some(pass);
            })
        };

        let id = event.subscribe(handler, false).map_err(|e| WireError::Configuration {
            reason: format!("cannot wait on '{event_name}': {e}"),
        })?;
        subscription.set(Some(id));
        debug!(event = %event_name, "bound object missing, wiring deferred");

        Ok(Attachment::Pending(PendingResolution {
            event,
            subscription,
            report,
        }))
    }
}
