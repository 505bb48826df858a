//! Computed cells: signals derived from other signals.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::effect::EffectHandle;
use crate::runtime::{EffectFn, Runtime};
use crate::signal::Signal;

/// A signal kept up to date by an internal effect that re-evaluates its
/// function whenever something it read last time changes.
pub struct Computed<T: 'static> {
    signal: Signal<T>,
    effect: EffectHandle,
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("signal", &self.signal)
            .field("effect", &self.effect.id())
            .finish()
    }
}

impl Runtime {
    /// Create a derived cell. The function runs once now and again whenever
    /// a signal it read changes; subscribers of the cell are only notified
    /// when the recomputed value differs.
    pub fn computed<T>(&self, compute: impl Fn() -> T + 'static) -> Computed<T>
    where
        T: Clone + PartialEq + 'static,
    {
        let id = self.create_effect_node(None);
        // First evaluation subscribes the effect before the cell exists
        let initial = self.run_tracked(id, &compute);
        let signal = self.signal(initial);

        let target = signal.clone();
        let body: EffectFn = Rc::new(RefCell::new(move || {
            target.set(compute());
            Ok(())
        }));
        self.set_effect_body(id, body);

        Computed {
            signal,
            effect: EffectHandle::new(id, self),
        }
    }
}

impl<T: 'static> Computed<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.signal.get()
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.signal.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// The underlying cell, for APIs that accept plain signals.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_recomputes_on_change() {
        let runtime = Runtime::new();
        let count = runtime.signal(2);
        let c = count.clone();
        let double = runtime.computed(move || c.get() * 2);
        assert_eq!(double.get(), 4);

        count.set(5);
        assert_eq!(double.get(), 10);
    }

    #[test]
    fn test_computes_once_at_creation() {
        let runtime = Runtime::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let value = runtime.computed(move || {
            counter.set(counter.get() + 1);
            1
        });
        assert_eq!(value.get(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unchanged_result_does_not_notify() {
        let runtime = Runtime::new();
        let count = runtime.signal(1);
        let c = count.clone();
        let parity = runtime.computed(move || c.get() % 2);

        let runs = Rc::new(Cell::new(0));
        let (p, r) = (parity.clone(), runs.clone());
        runtime.effect(move || {
            p.get();
            r.set(r.get() + 1);
            Ok(())
        });

        count.set(3);
        assert_eq!(runs.get(), 1);
        count.set(4);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_dispose_freezes_value() {
        let runtime = Runtime::new();
        let count = runtime.signal(1);
        let c = count.clone();
        let plus_one = runtime.computed(move || c.get() + 1);
        plus_one.dispose();
        count.set(10);
        assert_eq!(plus_one.get(), 2);
    }
}
