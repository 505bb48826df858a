//! Signals: mutable reactive cells.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{Runtime, SignalId, WeakRuntime};

/// A reactive cell. Reads inside an effect subscribe it; writes with a
/// changed value notify every subscriber before returning.
///
/// Clones share the same value.
pub struct Signal<T: 'static> {
    id: SignalId,
    value: Rc<RefCell<T>>,
    runtime: WeakRuntime,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*self.value.borrow())
            .finish()
    }
}

impl Runtime {
    /// Create a signal owned by the current scope or effect.
    pub fn signal<T: 'static>(&self, value: T) -> Signal<T> {
        Signal {
            id: self.create_signal_node(),
            value: Rc::new(RefCell::new(value)),
            runtime: self.downgrade(),
        }
    }
}

impl<T: 'static> Signal<T> {
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Subscribe the current observer, if any.
    pub fn track(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.track(self.id);
        }
    }

    fn notify(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.notify(self.id);
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.track();
        self.get_untracked()
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Borrow the value, subscribing the current observer.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        self.with_untracked(f)
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value. Returns false, and notifies nobody, when the new
    /// value equals the current one.
    pub fn set(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        if *self.value.borrow() == value {
            return false;
        }
        *self.value.borrow_mut() = value;
        self.notify();
        true
    }

    /// Mutate the value in place. Subscribers are notified only if the value
    /// actually changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool
    where
        T: Clone + PartialEq,
    {
        let changed = {
            let mut value = self.value.borrow_mut();
            let before = value.clone();
            f(&mut value);
            *value != before
        };
        if changed {
            self.notify();
        }
        changed
    }
}
