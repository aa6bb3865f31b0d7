use std::fmt;
use std::rc::Rc;

use crate::Host;

/// A shared callback handle. The host is passed as the receiver of every call.
///
/// The handle is also the callback's identity: `remove` matches on the allocation, so keep the
/// `Rc` you passed to `add` if you want to remove it later.
pub type Handler<E> = Rc<dyn Fn(&dyn Host, &E)>;

/// Wraps a closure into a [`Handler`].
pub fn handler<E>(f: impl Fn(&dyn Host, &E) + 'static) -> Handler<E> {
    Rc::new(f)
}

/// An ordered callback list.
///
/// Handlers fire in insertion order. Adding the same handle twice registers it twice. `fire_with`
/// iterates a snapshot, so handlers added or removed while firing only affect later passes. A
/// panicking handler is not isolated.
pub struct Callbacks<E> {
    list: Vec<Handler<E>>,
}

impl<E> Callbacks<E> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn add(&mut self, handler: Handler<E>) {
        self.list.push(handler);
    }

    /// Removes the first registration of `handler`. Returns whether one was found.
    pub fn remove(&mut self, handler: &Handler<E>) -> bool {
        let Some(pos) = self.list.iter().position(|h| same_handler(h, handler)) else {
            return false;
        };
        self.list.remove(pos);
        true
    }

    pub fn has(&self) -> bool {
        !self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// A copy of the current registrations, for firing outside of a borrow.
    pub fn snapshot(&self) -> Vec<Handler<E>> {
        self.list.clone()
    }

    pub fn fire_with(&self, host: &dyn Host, event: &E) {
        fire_all(&self.snapshot(), host, event);
    }
}

pub(crate) fn fire_all<E>(handlers: &[Handler<E>], host: &dyn Host, event: &E) {
    for handler in handlers {
        handler(host, event);
    }
}

fn same_handler<E>(a: &Handler<E>, b: &Handler<E>) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl<E> Default for Callbacks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Callbacks<E> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<E> fmt::Debug for Callbacks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("len", &self.list.len())
            .finish()
    }
}
