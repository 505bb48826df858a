//! Effects: callbacks re-run when the signals they read change.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::EffectError;
use crate::runtime::{EffectFn, EffectId, Runtime, WeakRuntime};

/// Disposal handle returned by [`Runtime::effect`].
///
/// Dropping the handle does not stop the effect; it lives until it is
/// disposed directly or through the scope or effect that owns it.
#[derive(Debug, Clone)]
pub struct EffectHandle {
    id: EffectId,
    runtime: WeakRuntime,
}

impl Runtime {
    /// Register an effect and run it immediately.
    ///
    /// Each run first drops the subscriptions and disposes the effects,
    /// signals and scopes created by the previous run. A failing run is
    /// reported on the error channel; the effect stays subscribed to what it
    /// read before failing.
    pub fn effect(
        &self,
        body: impl FnMut() -> Result<(), EffectError> + 'static,
    ) -> EffectHandle {
        let body: EffectFn = Rc::new(RefCell::new(body));
        let id = self.create_effect_node(Some(body));
        self.run_effect(id);
        EffectHandle {
            id,
            runtime: self.downgrade(),
        }
    }
}

impl EffectHandle {
    pub(crate) fn new(id: EffectId, runtime: &Runtime) -> Self {
        Self {
            id,
            runtime: runtime.downgrade(),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Stop the effect and dispose everything it owns. Idempotent.
    pub fn dispose(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.dispose_effect(self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.runtime
            .upgrade()
            .map_or(true, |runtime| !runtime.has_effect(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_runs_immediately_and_on_change() {
        let runtime = Runtime::new();
        let count = runtime.signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (c, s) = (count.clone(), seen.clone());
        runtime.effect(move || {
            s.borrow_mut().push(c.get());
            Ok(())
        });

        count.set(1);
        count.set(1);
        count.set(2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dispose_stops_reruns() {
        let runtime = Runtime::new();
        let count = runtime.signal(0);
        let runs = Rc::new(Cell::new(0));

        let (c, r) = (count.clone(), runs.clone());
        let handle = runtime.effect(move || {
            c.track();
            r.set(r.get() + 1);
            Ok(())
        });
        assert!(!handle.is_disposed());

        handle.dispose();
        handle.dispose();
        count.set(1);
        assert_eq!(runs.get(), 1);
        assert!(handle.is_disposed());
        assert_eq!(runtime.subscriber_count(count.id()), 0);
    }
}
