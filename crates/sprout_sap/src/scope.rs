//! Disposal scopes.

use crate::runtime::{Runtime, ScopeId, WeakRuntime};

/// Groups every signal, effect and nested scope created while it runs, so a
/// mounted component can be torn down in one call.
#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    runtime: WeakRuntime,
}

impl Runtime {
    /// Create a scope. A scope created inside an effect run or another scope
    /// is disposed together with it.
    pub fn scope(&self) -> Scope {
        Scope {
            id: self.create_scope_node(),
            runtime: self.downgrade(),
        }
    }
}

impl Scope {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Run `f` with this scope as the owner of everything it creates.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.runtime.upgrade() {
            Some(runtime) => runtime.run_in_scope(self.id, f),
            None => f(),
        }
    }

    /// Dispose everything the scope owns. Idempotent.
    pub fn dispose(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.dispose_scope(self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.runtime
            .upgrade()
            .map_or(true, |runtime| !runtime.has_scope(self.id))
    }
}
