//! Reactive runtime.
//!
//! The runtime owns the dependency graph between signals and effects. An
//! effect subscribes to every signal it reads while it is the current
//! observer; a write with a changed value re-runs the subscribers
//! synchronously, each exactly once, before the write returns.
//!
//! The observer and owner stacks are only ever pushed through
//! [`StackGuard`], which pops on drop, so an effect that fails or panics
//! cannot leave a stale observer behind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{EffectError, ReactiveError};

/// Re-runs an effect may trigger on itself before it is reported as runaway.
pub const RUNAWAY_LIMIT: usize = 100;

/// Identifier of a signal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u32);

/// Identifier of an effect node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u32);

/// Identifier of a disposal scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type EffectFn = Rc<RefCell<dyn FnMut() -> Result<(), EffectError>>>;
type ErrorHandler = Rc<dyn Fn(&ReactiveError)>;

/// Nodes created while an effect run or a scope was the current owner.
#[derive(Debug, Default)]
pub(crate) struct Owned {
    effects: Vec<EffectId>,
    signals: Vec<SignalId>,
    scopes: Vec<ScopeId>,
}

#[derive(Debug, Default)]
struct SignalNode {
    /// In subscription order
    subscribers: Vec<EffectId>,
}

struct EffectNode {
    body: Option<EffectFn>,
    /// Signals read during the latest run
    sources: Vec<SignalId>,
    owned: Owned,
    running: bool,
    /// Set when a source changed while the effect was running
    rerun: bool,
}

#[derive(Debug, Clone, Copy)]
enum Observer {
    Effect(EffectId),
    /// Reads inside `untrack`
    Untracked,
}

#[derive(Debug, Clone, Copy)]
enum Owner {
    Effect(EffectId),
    Scope(ScopeId),
}

#[derive(Default)]
pub(crate) struct RuntimeInner {
    next_id: Cell<u32>,
    signals: RefCell<FxHashMap<SignalId, SignalNode>>,
    effects: RefCell<FxHashMap<EffectId, EffectNode>>,
    scopes: RefCell<FxHashMap<ScopeId, Owned>>,
    observers: RefCell<Vec<Observer>>,
    owners: RefCell<Vec<Owner>>,
    batch_depth: Cell<usize>,
    /// Effects queued while a batch is open, deduplicated
    pending: RefCell<Vec<EffectId>>,
    error_handler: RefCell<Option<ErrorHandler>>,
}

/// Pops the stack it pushed onto when dropped.
struct StackGuard<'r, T> {
    stack: &'r RefCell<Vec<T>>,
}

impl<'r, T> StackGuard<'r, T> {
    fn push(stack: &'r RefCell<Vec<T>>, item: T) -> Self {
        stack.borrow_mut().push(item);
        Self { stack }
    }
}

impl<T> Drop for StackGuard<'_, T> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

struct BatchGuard<'r> {
    depth: &'r Cell<usize>,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Handle to a reactive runtime. Clones share the same graph.
///
/// The runtime is single threaded: every propagation happens synchronously
/// on the thread that performs the write.
#[derive(Clone, Default)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

/// Non-owning runtime handle, held by signals, effect handles and scopes so
/// that closures stored inside the runtime do not keep it alive.
#[derive(Clone, Default)]
pub struct WeakRuntime {
    inner: Weak<RuntimeInner>,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        self.inner.upgrade().map(|inner| Runtime { inner })
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("signals", &self.inner.signals.borrow().len())
            .field("effects", &self.inner.effects.borrow().len())
            .field("scopes", &self.inner.scopes.borrow().len())
            .finish()
    }
}

impl fmt::Debug for WeakRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRuntime")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn next_id(&self) -> u32 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }

    /// Record a node under the current owner so it is disposed with it.
    fn adopt(&self, record: impl FnOnce(&mut Owned)) {
        let owner = self.inner.owners.borrow().last().copied();
        match owner {
            Some(Owner::Effect(id)) => {
                if let Some(node) = self.inner.effects.borrow_mut().get_mut(&id) {
                    record(&mut node.owned);
                }
            }
            Some(Owner::Scope(id)) => {
                if let Some(owned) = self.inner.scopes.borrow_mut().get_mut(&id) {
                    record(owned);
                }
            }
            None => {}
        }
    }

    pub(crate) fn create_signal_node(&self) -> SignalId {
        let id = SignalId(self.next_id());
        self.inner
            .signals
            .borrow_mut()
            .insert(id, SignalNode::default());
        self.adopt(|owned| owned.signals.push(id));
        id
    }

    pub(crate) fn create_effect_node(&self, body: Option<EffectFn>) -> EffectId {
        let id = EffectId(self.next_id());
        self.inner.effects.borrow_mut().insert(
            id,
            EffectNode {
                body,
                sources: Vec::new(),
                owned: Owned::default(),
                running: false,
                rerun: false,
            },
        );
        self.adopt(|owned| owned.effects.push(id));
        id
    }

    pub(crate) fn set_effect_body(&self, id: EffectId, body: EffectFn) {
        if let Some(node) = self.inner.effects.borrow_mut().get_mut(&id) {
            node.body = Some(body);
        }
    }

    pub(crate) fn create_scope_node(&self) -> ScopeId {
        let id = ScopeId(self.next_id());
        self.inner.scopes.borrow_mut().insert(id, Owned::default());
        self.adopt(|owned| owned.scopes.push(id));
        id
    }

    /// Subscribe the current observer to `signal`.
    pub(crate) fn track(&self, signal: SignalId) {
        let observer = self.inner.observers.borrow().last().copied();
        let Some(Observer::Effect(effect)) = observer else {
            return;
        };

        let mut effects = self.inner.effects.borrow_mut();
        let Some(node) = effects.get_mut(&effect) else {
            return;
        };
        if node.sources.contains(&signal) {
            return;
        }
        node.sources.push(signal);
        self.inner
            .signals
            .borrow_mut()
            .entry(signal)
            .or_default()
            .subscribers
            .push(effect);
    }

    /// Re-run every subscriber of `signal`, or queue them while batching.
    pub(crate) fn notify(&self, signal: SignalId) {
        let subscribers: SmallVec<[EffectId; 8]> = match self.inner.signals.borrow().get(&signal) {
            Some(node) => node.subscribers.iter().copied().collect(),
            None => return,
        };
        tracing::trace!(signal = signal.0, subscribers = subscribers.len(), "signal changed");

        if self.inner.batch_depth.get() > 0 {
            let mut pending = self.inner.pending.borrow_mut();
            for id in subscribers {
                if !pending.contains(&id) {
                    pending.push(id);
                }
            }
            return;
        }

        for id in subscribers {
            self.run_effect(id);
        }
    }

    /// Evaluate `f` with `effect` as observer and owner, without cleanup.
    pub(crate) fn run_tracked<R>(&self, effect: EffectId, f: impl FnOnce() -> R) -> R {
        let _observer = StackGuard::push(&self.inner.observers, Observer::Effect(effect));
        let _owner = StackGuard::push(&self.inner.owners, Owner::Effect(effect));
        f()
    }

    pub(crate) fn run_effect(&self, id: EffectId) {
        {
            let mut effects = self.inner.effects.borrow_mut();
            let Some(node) = effects.get_mut(&id) else {
                return;
            };
            if node.running {
                node.rerun = true;
                return;
            }
            node.running = true;
        }

        let mut runs = 0;
        loop {
            runs += 1;
            self.cleanup(id);
            tracing::trace!(effect = id.0, run = runs, "running effect");

            let body = self
                .inner
                .effects
                .borrow()
                .get(&id)
                .and_then(|node| node.body.clone());
            let result = match body {
                Some(body) => self.run_tracked(id, || {
                    let mut call = body.borrow_mut();
                    let result = (&mut *call)();
                    result
                }),
                None => Ok(()),
            };
            if let Err(error) = result {
                self.report(ReactiveError::Effect { effect: id, error });
            }

            let rerun = {
                let mut effects = self.inner.effects.borrow_mut();
                // Disposed by its own run
                let Some(node) = effects.get_mut(&id) else {
                    return;
                };
                let rerun = std::mem::take(&mut node.rerun);
                if !rerun || runs >= RUNAWAY_LIMIT {
                    node.running = false;
                }
                rerun
            };

            if !rerun {
                return;
            }
            if runs >= RUNAWAY_LIMIT {
                self.report(ReactiveError::Runaway {
                    effect: id,
                    limit: RUNAWAY_LIMIT,
                });
                return;
            }
        }
    }

    /// Drop the subscriptions and owned nodes of the previous run.
    fn cleanup(&self, id: EffectId) {
        let (sources, owned) = {
            let mut effects = self.inner.effects.borrow_mut();
            let Some(node) = effects.get_mut(&id) else {
                return;
            };
            (
                std::mem::take(&mut node.sources),
                std::mem::take(&mut node.owned),
            )
        };
        self.unsubscribe(id, &sources);
        self.dispose_owned(owned);
    }

    fn unsubscribe(&self, id: EffectId, sources: &[SignalId]) {
        let mut signals = self.inner.signals.borrow_mut();
        for source in sources {
            if let Some(node) = signals.get_mut(source) {
                node.subscribers.retain(|subscriber| *subscriber != id);
            }
        }
    }

    fn dispose_owned(&self, owned: Owned) {
        for effect in owned.effects {
            self.dispose_effect(effect);
        }
        for scope in owned.scopes {
            self.dispose_scope(scope);
        }
        let mut signals = self.inner.signals.borrow_mut();
        for signal in owned.signals {
            signals.remove(&signal);
        }
    }

    pub(crate) fn dispose_effect(&self, id: EffectId) {
        let Some(node) = self.inner.effects.borrow_mut().remove(&id) else {
            return;
        };
        self.unsubscribe(id, &node.sources);
        self.inner.pending.borrow_mut().retain(|pending| *pending != id);
        self.dispose_owned(node.owned);
    }

    pub(crate) fn dispose_scope(&self, id: ScopeId) {
        let Some(owned) = self.inner.scopes.borrow_mut().remove(&id) else {
            return;
        };
        self.dispose_owned(owned);
    }

    pub(crate) fn run_in_scope<R>(&self, id: ScopeId, f: impl FnOnce() -> R) -> R {
        let _owner = StackGuard::push(&self.inner.owners, Owner::Scope(id));
        f()
    }

    pub(crate) fn has_effect(&self, id: EffectId) -> bool {
        self.inner.effects.borrow().contains_key(&id)
    }

    pub(crate) fn has_scope(&self, id: ScopeId) -> bool {
        self.inner.scopes.borrow().contains_key(&id)
    }

    /// Run `f` with notifications deferred. Every effect triggered inside
    /// runs once, after the outermost batch closes.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let result = {
            self.inner.batch_depth.set(self.inner.batch_depth.get() + 1);
            let _guard = BatchGuard {
                depth: &self.inner.batch_depth,
            };
            f()
        };
        if self.inner.batch_depth.get() == 0 {
            self.flush();
        }
        result
    }

    fn flush(&self) {
        loop {
            let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
            if pending.is_empty() {
                return;
            }
            tracing::trace!(effects = pending.len(), "flushing batch");
            for id in pending {
                self.run_effect(id);
            }
        }
    }

    /// Run `f` without subscribing the current observer to anything it reads.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let _observer = StackGuard::push(&self.inner.observers, Observer::Untracked);
        f()
    }

    /// Whether a read right now would create a subscription.
    pub fn is_tracking(&self) -> bool {
        matches!(
            self.inner.observers.borrow().last(),
            Some(Observer::Effect(_))
        )
    }

    pub fn is_batching(&self) -> bool {
        self.inner.batch_depth.get() > 0
    }

    /// Install the handler receiving effect failures and async rejections.
    /// Without one, errors are logged with `tracing::error!`.
    pub fn on_error(&self, handler: impl Fn(&ReactiveError) + 'static) {
        *self.inner.error_handler.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn report(&self, error: ReactiveError) {
        let handler = self.inner.error_handler.borrow().clone();
        match handler {
            Some(handler) => handler(&error),
            None => tracing::error!("{error}"),
        }
    }

    /// Report a failure from an asynchronous continuation.
    pub fn report_async(&self, error: impl Into<EffectError>) {
        self.report(ReactiveError::Async(error.into()));
    }

    /// Number of live effects, computed cells included.
    pub fn effect_count(&self) -> usize {
        self.inner.effects.borrow().len()
    }

    /// Number of effects currently subscribed to `signal`.
    pub fn subscriber_count(&self, signal: SignalId) -> usize {
        self.inner
            .signals
            .borrow()
            .get(&signal)
            .map_or(0, |node| node.subscribers.len())
    }
}
