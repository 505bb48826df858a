//! Mounting a [`RenderProgram`] against a [`Host`].
//!
//! Executes the program the way the generated module would run against the
//! rendering primitive library: state cells first, then standing effects,
//! then the view, then the mount-time fetches.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde_json::Value;
use sprout_graft::codegen::to_pascal_case;
use sprout_graft::{
    EffectPlan, ElementPlan, FetchPlan, HandlerAction, PropValue, RenderProgram, StateInit,
    ViewNode,
};
use sprout_sap::{EffectError, ReactiveError, Runtime, Scope, WeakRuntime};

use crate::error::MountError;
use crate::eval::{Env, EvalError, StateCell, States};
use crate::fetch::{apply_stages, describe, FetchResult, Fetcher};
use crate::host::{Event, Host, Listener, NodeId};
use crate::list::{render_list, ListSource};
use crate::value::{bind_item, is_truthy, to_display, type_name};

/// Mounts programs, resolving `::Name` references against the programs
/// registered on it.
pub struct Renderer {
    runtime: Runtime,
    host: Rc<dyn Host>,
    fetcher: Option<Rc<dyn Fetcher>>,
    components: Rc<FxHashMap<String, Rc<RenderProgram>>>,
}

impl Renderer {
    pub fn new(runtime: Runtime, host: Rc<dyn Host>) -> Self {
        Self {
            runtime,
            host,
            fetcher: None,
            components: Rc::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Rc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Make `program` available to `::Name` references.
    pub fn register(&mut self, program: RenderProgram) {
        let name = to_pascal_case(&program.name);
        tracing::debug!(component = %name, "registered component");
        Rc::make_mut(&mut self.components).insert(name, Rc::new(program));
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Mount `program` at the end of `container`.
    pub fn mount(&self, program: &RenderProgram, container: NodeId) -> Result<Mounted, MountError> {
        self.check_components(program, &mut Vec::new())?;

        let alive = Rc::new(Cell::new(true));
        let mount = Context {
            runtime: self.runtime.downgrade(),
            host: Rc::clone(&self.host),
            fetcher: self.fetcher.clone(),
            components: Rc::clone(&self.components),
            alive: Rc::clone(&alive),
            states: States::default(),
            fetches: Rc::default(),
            item: None,
        };

        let scope = self.runtime.scope();
        let instance = scope.run(|| mount.instantiate(program));
        let (states, nodes) = match instance {
            Ok(instance) => instance,
            Err(error) => {
                scope.dispose();
                return Err(error);
            }
        };

        let region = self.host.create_region();
        for node in nodes {
            self.host.append(region, node);
        }
        self.host.append(container, region);
        tracing::debug!(component = %program.name, %region, "mounted");

        Ok(Mounted {
            runtime: self.runtime.clone(),
            scope,
            region,
            host: Rc::clone(&self.host),
            states,
            alive,
        })
    }

    fn check_components(
        &self,
        program: &RenderProgram,
        stack: &mut Vec<String>,
    ) -> Result<(), MountError> {
        stack.push(to_pascal_case(&program.name));
        let mut result = Ok(());
        visit_components(&program.view, &mut |name| {
            if result.is_err() {
                return;
            }
            result = if stack.iter().any(|s| s.as_str() == name) {
                Err(MountError::RecursiveComponent(CompactString::from(name)))
            } else {
                match self.components.get(name) {
                    Some(child) => self.check_components(child, stack),
                    None => Err(MountError::UnknownComponent(CompactString::from(name))),
                }
            };
        });
        stack.pop();
        result
    }
}

fn visit_components(nodes: &[ViewNode], f: &mut dyn FnMut(&str)) {
    for node in nodes {
        match node {
            ViewNode::Component(name) => f(name),
            ViewNode::Element(element) => visit_components(&element.children, f),
            ViewNode::When {
                then, otherwise, ..
            } => {
                visit_components(then, f);
                visit_components(otherwise, f);
            }
            ViewNode::List { template, .. } => visit_components(template, f),
            ViewNode::Text(_) | ViewNode::Live(_) | ViewNode::Once(_) => {}
        }
    }
}

/// A mounted component. Holding it keeps the runtime alive.
pub struct Mounted {
    runtime: Runtime,
    scope: Scope,
    region: NodeId,
    host: Rc<dyn Host>,
    states: States,
    alive: Rc<Cell<bool>>,
}

impl Mounted {
    /// Region holding the component's root nodes.
    pub fn region(&self) -> NodeId {
        self.region
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Current value of a state cell, read without tracking.
    pub fn state(&self, name: &str) -> Option<Value> {
        self.states.get(name).map(|cell| cell.get_untracked())
    }

    /// Write a plain state cell. Returns whether the value changed.
    pub fn set_state(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        Ok(self.states.signal(name)?.set(value))
    }

    /// Dispose every cell and effect of the component and remove its nodes.
    /// Fetch responses arriving later are dropped.
    pub fn unmount(self) {
        self.alive.set(false);
        self.scope.dispose();
        self.host.clear(self.region);
        tracing::debug!(region = %self.region, "unmounted");
    }
}

/// What building one component instance needs.
#[derive(Clone)]
struct Context {
    runtime: WeakRuntime,
    host: Rc<dyn Host>,
    fetcher: Option<Rc<dyn Fetcher>>,
    components: Rc<FxHashMap<String, Rc<RenderProgram>>>,
    /// Cleared when the top-level mount is unmounted
    alive: Rc<Cell<bool>>,
    states: States,
    fetches: Rc<RefCell<FxHashMap<CompactString, Generations>>>,
    item: Option<Rc<Value>>,
}

/// Fetch bookkeeping for one target state. A response is applied only when
/// it is newer than the last one that reached the cell, so an older
/// response never overwrites a newer one and a failed request hides nothing.
#[derive(Debug, Default, Clone, Copy)]
struct Generations {
    issued: u64,
    applied: u64,
}

impl Context {
    fn runtime(&self) -> Result<Runtime, MountError> {
        self.runtime.upgrade().ok_or(MountError::RuntimeDropped)
    }

    fn env(&self) -> Env<'_> {
        let env = Env::new(&self.states).with_host(&*self.host);
        match &self.item {
            Some(item) => env.with_item(item),
            None => env,
        }
    }

    /// Context for a fresh component instance
    fn child(&self) -> Self {
        Self {
            states: States::default(),
            fetches: Rc::default(),
            item: None,
            ..self.clone()
        }
    }

    fn with_item(&self, item: Value) -> Self {
        Self {
            item: Some(Rc::new(item)),
            ..self.clone()
        }
    }

    fn instantiate(&self, program: &RenderProgram) -> Result<(States, Vec<NodeId>), MountError> {
        let runtime = self.runtime()?;

        for state in &program.states {
            let cell = match &state.init {
                StateInit::Value(init) => {
                    let value = runtime.untrack(|| self.env().eval(init)).map_err(|error| {
                        MountError::State {
                            state: state.name.clone(),
                            error,
                        }
                    })?;
                    StateCell::Signal(runtime.signal(value))
                }
                StateInit::Derived(init) => {
                    let ctx = self.clone();
                    let init = init.clone();
                    StateCell::Computed(runtime.computed(move || match ctx.env().eval(&init) {
                        Ok(value) => value,
                        Err(error) => {
                            if let Some(runtime) = ctx.runtime.upgrade() {
                                runtime.report(ReactiveError::Computed(error.into()));
                            }
                            Value::Null
                        }
                    }))
                }
            };
            self.states.insert(state.name.clone(), cell);
        }

        let mut fetches = Vec::new();
        for effect in &program.effects {
            match effect {
                EffectPlan::Standing { guards, action } => {
                    let ctx = self.clone();
                    let guards = guards.clone();
                    let action = action.clone();
                    runtime.effect(move || {
                        let env = ctx.env();
                        for guard in &guards {
                            if !is_truthy(&env.eval(guard)?) {
                                return Ok(());
                            }
                        }
                        env.eval(&action)?;
                        Ok(())
                    });
                }
                EffectPlan::Fetch(plan) => fetches.push(plan),
            }
        }

        let nodes = self.build_all(&program.view)?;

        for plan in fetches {
            self.start_fetch(plan);
        }
        Ok((self.states.clone(), nodes))
    }

    fn build_all(&self, nodes: &[ViewNode]) -> Result<Vec<NodeId>, MountError> {
        nodes.iter().map(|node| self.build(node)).collect()
    }

    fn build(&self, node: &ViewNode) -> Result<NodeId, MountError> {
        match node {
            ViewNode::Element(element) => self.build_element(element),
            ViewNode::Text(text) => Ok(self.host.create_text(text)),
            ViewNode::Once(expr) => {
                let value = self.env().eval(expr)?;
                Ok(self.host.create_text(&to_display(&value)))
            }
            ViewNode::Live(expr) => {
                let node = self.host.create_text("");
                let ctx = self.clone();
                let expr = expr.clone();
                self.runtime()?.effect(move || {
                    let value = ctx.env().eval(&expr)?;
                    ctx.host.set_text(node, &to_display(&value));
                    Ok(())
                });
                Ok(node)
            }
            ViewNode::When {
                condition,
                then,
                otherwise,
            } => {
                let region = self.host.create_region();
                let ctx = self.clone();
                let condition = condition.clone();
                let (then, otherwise) = (then.clone(), otherwise.clone());
                self.runtime()?.effect(move || {
                    let holds = is_truthy(&ctx.env().eval(&condition)?);
                    let branch = if holds { &then } else { &otherwise };
                    let runtime = ctx.runtime()?;
                    // Only the condition is a dependency of the region
                    runtime.untrack(|| -> Result<(), EffectError> {
                        ctx.host.clear(region);
                        for node in ctx.build_all(branch)? {
                            ctx.host.append(region, node);
                        }
                        Ok(())
                    })
                });
                Ok(region)
            }
            ViewNode::List { source, template } => {
                let runtime = self.runtime()?;
                let ctx = self.clone();
                let source = source.clone();
                let items = ListSource::Derived(Box::new(
                    move || -> Result<Vec<Value>, EffectError> {
                        match ctx.env().eval(&source)? {
                            Value::Array(items) => Ok(items),
                            Value::Null => Ok(Vec::new()),
                            other => Err(EffectError::new(format!(
                                "cannot iterate over {}",
                                type_name(&other)
                            ))),
                        }
                    },
                ));
                let ctx = self.clone();
                let template = template.clone();
                let region = render_list(&runtime, &self.host, items, move |item: &Value, index| {
                    let scoped = ctx.with_item(bind_item(item, index));
                    Ok(scoped.build_all(&template)?)
                });
                Ok(region)
            }
            ViewNode::Component(name) => {
                let program = self
                    .components
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| MountError::UnknownComponent(name.clone()))?;
                let region = self.host.create_region();
                let (_, nodes) = self.child().instantiate(&program)?;
                for node in nodes {
                    self.host.append(region, node);
                }
                Ok(region)
            }
        }
    }

    fn build_element(&self, plan: &ElementPlan) -> Result<NodeId, MountError> {
        let node = self.host.create_element(&plan.tag);
        if let Some(class) = &plan.class {
            self.host.set_attribute(node, "class", class);
        }
        if let Some(id) = &plan.id {
            self.host.set_attribute(node, "id", id);
        }

        for (name, value) in &plan.attributes {
            match value {
                PropValue::Static(text) => self.host.set_attribute(node, name, text),
                PropValue::Dynamic(expr) => {
                    let ctx = self.clone();
                    let (name, expr) = (name.clone(), expr.clone());
                    self.runtime()?.effect(move || {
                        let value = ctx.env().eval(&expr)?;
                        ctx.host.set_attribute(node, &name, &to_display(&value));
                        Ok(())
                    });
                }
            }
        }

        // Handlers grouped per event, in order of first appearance
        let mut events: Vec<CompactString> = Vec::new();
        let mut actions: FxHashMap<CompactString, Vec<HandlerAction>> = FxHashMap::default();
        for handler in &plan.handlers {
            if !actions.contains_key(&handler.event) {
                events.push(handler.event.clone());
            }
            actions
                .entry(handler.event.clone())
                .or_default()
                .push(handler.action.clone());
        }

        if let Some(binding) = &plan.binding {
            let ctx = self.clone();
            let (state, property) = (binding.state.clone(), binding.property);
            self.runtime()?.effect(move || {
                let value = ctx
                    .states
                    .get(&state)
                    .ok_or_else(|| EvalError::UnknownState(state.clone()))?
                    .get();
                let value = if property == "checked" {
                    Value::Bool(is_truthy(&value))
                } else {
                    value
                };
                ctx.host.set_property(node, property, value);
                Ok(())
            });
            if !actions.contains_key(binding.event) {
                events.push(CompactString::from(binding.event));
            }
        }

        for event in events {
            let handler = Handler {
                runtime: self.runtime.clone(),
                host: Rc::downgrade(&self.host),
                states: self.states.clone(),
                item: self.item.clone(),
                binding: plan
                    .binding
                    .as_ref()
                    .filter(|b| b.event == event.as_str())
                    .map(|b| (b.state.clone(), b.property)),
                actions: actions.remove(&event).unwrap_or_default(),
            };
            let listener: Listener = Rc::new(move |e: &Event| handler.handle(e));
            self.host.listen(node, &event, listener);
        }

        for child in &plan.children {
            let child = self.build(child)?;
            self.host.append(node, child);
        }
        Ok(node)
    }

    fn start_fetch(&self, plan: &FetchPlan) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        let url = match runtime.untrack(|| self.env().eval(&plan.url)) {
            Ok(url) => to_display(&url),
            Err(error) => {
                runtime.report_async(error);
                return;
            }
        };
        let Some(fetcher) = &self.fetcher else {
            runtime.report_async(format!("no fetcher installed for `{url}`"));
            return;
        };

        let generation = {
            let mut fetches = self.fetches.borrow_mut();
            let generations = fetches.entry(plan.target.clone()).or_default();
            generations.issued += 1;
            generations.issued
        };
        tracing::debug!(%url, state = %plan.target, generation, "fetch started");

        let weak = self.runtime.clone();
        let alive = Rc::clone(&self.alive);
        let fetches = Rc::clone(&self.fetches);
        let states = self.states.clone();
        let target = plan.target.clone();
        let stages = plan.stages.clone();
        fetcher.fetch(
            &url,
            Box::new(move |result: FetchResult| {
                let Some(runtime) = weak.upgrade() else {
                    return;
                };
                if !alive.get() {
                    tracing::debug!(state = %target, "response after unmount dropped");
                    return;
                }
                let applied = fetches.borrow().get(&target).map_or(0, |g| g.applied);
                if generation <= applied {
                    tracing::warn!(
                        state = %target,
                        generation,
                        applied,
                        "stale fetch response discarded"
                    );
                    return;
                }
                let outcome = result
                    .and_then(|response| apply_stages(response, &stages))
                    .map_err(EffectError::from)
                    .and_then(|value| {
                        tracing::debug!(state = %target, value = %describe(&value), "fetch resolved");
                        let signal = states.signal(&target)?;
                        if let Some(generations) = fetches.borrow_mut().get_mut(&target) {
                            generations.applied = generation;
                        }
                        signal.set(value);
                        Ok(())
                    });
                if let Err(error) = outcome {
                    runtime.report_async(error);
                }
            }),
        );
    }
}

/// State captured by an element's listener. Holds the host weakly: the host
/// owns the listener.
struct Handler {
    runtime: WeakRuntime,
    host: Weak<dyn Host>,
    states: States,
    item: Option<Rc<Value>>,
    binding: Option<(CompactString, &'static str)>,
    actions: Vec<HandlerAction>,
}

impl Handler {
    fn handle(&self, event: &Event) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        if let Err(error) = self.run(&*host, event) {
            match self.runtime.upgrade() {
                Some(runtime) => runtime.report(ReactiveError::Handler {
                    event: event.name().to_string(),
                    error,
                }),
                None => tracing::error!(event = event.name(), %error, "handler failed"),
            }
        }
    }

    fn run(&self, host: &dyn Host, event: &Event) -> Result<(), EffectError> {
        if let Some((state, property)) = &self.binding {
            let value = host.property(event.target(), property).unwrap_or(Value::Null);
            self.states.signal(state)?.set(value);
        }

        let mut env = Env::new(&self.states).with_host(host);
        if let Some(item) = &self.item {
            env = env.with_item(item);
        }
        for action in &self.actions {
            match action {
                HandlerAction::Run(expr) => {
                    env.eval(expr)?;
                }
                HandlerAction::Navigate(path) => {
                    event.prevent_default();
                    host.navigate(path);
                }
            }
        }
        Ok(())
    }
}
