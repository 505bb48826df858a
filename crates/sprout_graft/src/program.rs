//! Render program: the lowered, executable form of a component.
//!
//! A `RenderProgram` is what both back ends consume. The JavaScript emitter
//! prints it as a module against the rendering primitive library, and the
//! mount interpreter in `sprout_bloom` executes it directly against a host.
//! Unlike the AST it owns all of its data and carries no arena lifetime.

use compact_str::CompactString;
use sprout_seed::expr::Expr;
use sprout_seed::FetchStage;

/// Field every loop item receives holding its zero-based position.
pub const INDEX_FIELD: &str = "_index";

/// Event intercepted on navigation links.
pub const NAVIGATION_EVENT: &str = "click";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderProgram {
    /// Component name as given to the generator
    pub name: String,
    /// Suffix appended to the component's local classes
    pub scope_tag: String,
    pub states: Vec<StatePlan>,
    pub effects: Vec<EffectPlan>,
    pub view: Vec<ViewNode>,
    /// Referenced components, in order of first use
    pub imports: Vec<CompactString>,
}

impl RenderProgram {
    pub fn state(&self, name: &str) -> Option<&StatePlan> {
        self.states.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatePlan {
    pub name: CompactString,
    pub init: StateInit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateInit {
    /// Seeded once with the initializer's value
    Value(Expr),
    /// Recomputed whenever a state it reads changes
    Derived(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectPlan {
    /// Re-runs when anything it reads changes; performs `action` only while
    /// every guard holds.
    Standing { guards: Vec<Expr>, action: Expr },
    /// Runs once at mount.
    Fetch(FetchPlan),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub url: Expr,
    pub stages: Vec<FetchStage>,
    pub target: CompactString,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewNode {
    Element(ElementPlan),
    Text(CompactString),
    /// Text kept current by its own effect
    Live(Expr),
    /// Text evaluated once when its parent is built
    Once(Expr),
    /// Region rebuilt whenever the condition is re-evaluated
    When {
        condition: Expr,
        then: Vec<ViewNode>,
        otherwise: Vec<ViewNode>,
    },
    /// Handed to the list helper
    List { source: Expr, template: Vec<ViewNode> },
    Component(CompactString),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementPlan {
    pub tag: CompactString,
    /// Space separated, local classes already scoped
    pub class: Option<String>,
    pub id: Option<CompactString>,
    pub attributes: Vec<(CompactString, PropValue)>,
    pub binding: Option<Binding>,
    pub handlers: Vec<Handler>,
    pub children: Vec<ViewNode>,
}

impl ElementPlan {
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
            id: None,
            attributes: Vec::new(),
            binding: None,
            handlers: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&PropValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Static(CompactString),
    Dynamic(Expr),
}

/// Two-way binding between an input-like element and a state cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub state: CompactString,
    /// Element property mirroring the cell
    pub property: &'static str,
    /// Event whose target value is written back
    pub event: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub event: CompactString,
    pub action: HandlerAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandlerAction {
    Run(Expr),
    /// Cancel the default activation and navigate instead
    Navigate(CompactString),
}
