//! Component AST node types.
//!
//! The AST is built once per compile invocation and never mutated
//! afterwards. Node lists are allocated in a bumpalo arena owned by the
//! caller, mirroring how the parser produces them in one pass.

use bumpalo::collections::Vec;
use bumpalo::Bump;
use compact_str::CompactString;
use smallvec::SmallVec;

use crate::expr::Expr;

/// An expression together with the source text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub source: CompactString,
    pub expr: Expr,
}

impl Expression {
    pub fn new(source: impl Into<CompactString>, expr: Expr) -> Self {
        Self {
            source: source.into(),
            expr,
        }
    }
}

/// Root AST node for one component.
#[derive(Debug, PartialEq)]
pub struct Component<'a> {
    pub states: Vec<'a, StateDecl>,
    pub effects: Vec<'a, EffectDecl>,
    pub nodes: Vec<'a, Node<'a>>,
    /// Referenced components, deduplicated, in order of first use
    pub imports: Vec<'a, CompactString>,
}

impl<'a> Component<'a> {
    pub fn new(allocator: &'a Bump) -> Self {
        Self {
            states: Vec::new_in(allocator),
            effects: Vec::new_in(allocator),
            nodes: Vec::new_in(allocator),
            imports: Vec::new_in(allocator),
        }
    }

    /// Look up a state declaration by name.
    pub fn state(&self, name: &str) -> Option<&StateDecl> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Register an implicit import. Returns false if it was already known.
    pub fn register_import(&mut self, name: &str) -> bool {
        if self.imports.iter().any(|i| i == name) {
            return false;
        }
        self.imports.push(CompactString::from(name));
        true
    }
}

/// `$name:initializer` or `$name := expression`
#[derive(Debug, Clone, PartialEq)]
pub struct StateDecl {
    pub name: CompactString,
    pub initializer: Expression,
    /// Derived from other state instead of seeded once
    pub computed: bool,
    pub line: u32,
}

/// `~ action`, optionally guarded by dependency expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDecl {
    pub action: EffectAction,
    /// Every expression must hold for the action to run
    pub dependencies: std::vec::Vec<Expression>,
    pub line: u32,
}

impl EffectDecl {
    pub fn is_fetch(&self) -> bool {
        matches!(self.action, EffectAction::Fetch(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectAction {
    Expr(Expression),
    Fetch(FetchPipeline),
}

impl EffectAction {
    /// The action's source text.
    pub fn source(&self) -> &str {
        match self {
            Self::Expr(e) => &e.source,
            Self::Fetch(f) => &f.source,
        }
    }
}

/// `fetch(url) |> stage |> ... |> $target`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPipeline {
    pub source: CompactString,
    pub url: Expression,
    pub stages: std::vec::Vec<FetchStage>,
    /// State cell receiving the final value
    pub target: CompactString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStage {
    /// Parse the body as JSON
    Json,
    /// Keep the body as text
    Text,
    /// Project a dotted field path out of the current value
    Field(std::vec::Vec<CompactString>),
}

/// Markup node
#[derive(Debug, PartialEq)]
pub enum Node<'a> {
    Element(Element<'a>),
    Text(CompactString),
    /// One line of a fenced block, rendered as a paragraph
    CodeLine(CompactString),
    Variable(CompactString),
    /// Resolved once per render
    StaticInterpolation(Expression),
    /// Kept live by the rendering layer
    ReactiveInterpolation(Expression),
    /// Only valid inside a loop template
    PropertyAccess(CompactString),
    Attribute(Attribute),
    Event(EventBinding),
    Nav(CompactString),
    Conditional(Conditional<'a>),
    Loop(Loop<'a>),
    Component(CompactString),
}

impl Node<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Text(_) => "text",
            Self::CodeLine(_) => "code line",
            Self::Variable(_) => "variable",
            Self::StaticInterpolation(_) => "static interpolation",
            Self::ReactiveInterpolation(_) => "reactive interpolation",
            Self::PropertyAccess(_) => "property access",
            Self::Attribute(_) => "attribute",
            Self::Event(_) => "event",
            Self::Nav(_) => "navigation",
            Self::Conditional(_) => "conditional",
            Self::Loop(_) => "loop",
            Self::Component(_) => "component",
        }
    }

    /// Attributes, events and navigation only make sense on an element.
    pub fn binds_to_element(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::Event(_) | Self::Nav(_))
    }
}

#[derive(Debug, PartialEq)]
pub struct Element<'a> {
    pub tag: CompactString,
    pub classes: SmallVec<[CompactString; 4]>,
    pub id: Option<CompactString>,
    pub attributes: Vec<'a, Attribute>,
    pub children: Vec<'a, Node<'a>>,
    pub line: u32,
}

impl<'a> Element<'a> {
    pub fn new(allocator: &'a Bump, tag: impl Into<CompactString>, line: u32) -> Self {
        Self {
            tag: tag.into(),
            classes: SmallVec::new(),
            id: None,
            attributes: Vec::new_in(allocator),
            children: Vec::new_in(allocator),
            line,
        }
    }

    /// Elements whose value can be bound two ways.
    pub fn is_input_like(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }
}

/// `name{"static"}` or `name{expression}`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: CompactString,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn is_dynamic(&self) -> bool {
        matches!(self.value, AttributeValue::Dynamic(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Static(CompactString),
    Dynamic(Expression),
}

/// `!event(action)` or `!action` (click)
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    pub name: CompactString,
    pub action: Expression,
}

/// `? condition` with its true branch and an optional `? else` branch
#[derive(Debug, PartialEq)]
pub struct Conditional<'a> {
    pub condition: Expression,
    pub true_branch: Vec<'a, Node<'a>>,
    pub false_branch: Vec<'a, Node<'a>>,
}

/// `$items` followed by a template block
#[derive(Debug, PartialEq)]
pub struct Loop<'a> {
    pub array: Expression,
    pub template: Vec<'a, Node<'a>>,
}
