//! Multicast notification over non-owning handler tokens
//!
//! The notifier never keeps a handler alive. Subscribers hold the returned
//! [`Listener`]; dropping it unsubscribes, and dead tokens are pruned on the
//! next notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Strong handle to a subscribed handler.
pub type Listener<T> = Rc<dyn Fn(&T)>;

pub struct Notifier<T: ?Sized + 'static> {
    handlers: RefCell<Vec<Weak<dyn Fn(&T)>>>,
}

impl<T: ?Sized + 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Register a handler without taking ownership of it.
    pub fn subscribe(&self, listener: &Listener<T>) {
        self.handlers.borrow_mut().push(Rc::downgrade(listener));
    }

    /// Wrap a closure into a listener, subscribe it and hand it back.
    pub fn listen(&self, handler: impl Fn(&T) + 'static) -> Listener<T> {
        let listener: Listener<T> = Rc::new(handler);
        self.subscribe(&listener);
        listener
    }

    /// Invoke every live handler, pruning dead tokens first.
    ///
    /// Returns the number of handlers invoked. Handlers may subscribe
    /// during notification; new handlers are called from the next round.
    pub fn notify(&self, arg: &T) -> usize {
        let live: Vec<Listener<T>> = {
            let mut handlers = self.handlers.borrow_mut();
            handlers.retain(|weak| weak.strong_count() > 0);
            handlers.iter().filter_map(Weak::upgrade).collect()
        };
        for handler in &live {
            handler(arg);
        }
        live.len()
    }

    /// Number of live handlers (prunes dead tokens).
    pub fn len(&self) -> usize {
        let mut handlers = self.handlers.borrow_mut();
        handlers.retain(|weak| weak.strong_count() > 0);
        handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}
