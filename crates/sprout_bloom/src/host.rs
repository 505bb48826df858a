//! The rendering primitive library as seen from Rust.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use serde_json::Value;

/// Handle to a node owned by a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event delivered to listeners.
#[derive(Debug)]
pub struct Event {
    name: CompactString,
    target: NodeId,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(name: impl Into<CompactString>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            default_prevented: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// Operations rendered output needs from its environment.
///
/// Every method takes `&self`: listeners run while the host is in use and
/// may call back into it, so implementations keep their state behind
/// interior mutability and never hold a borrow across a listener call.
pub trait Host {
    fn create_element(&self, tag: &str) -> NodeId;

    fn create_text(&self, text: &str) -> NodeId;

    /// A transparent container. Its children render in its place, which
    /// lets a region be emptied and refilled without touching its siblings.
    fn create_region(&self) -> NodeId;

    fn set_text(&self, node: NodeId, text: &str);

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn set_property(&self, node: NodeId, name: &str, value: Value);

    fn property(&self, node: NodeId, name: &str) -> Option<Value>;

    fn append(&self, parent: NodeId, child: NodeId);

    /// Remove and drop every child of `node`.
    fn clear(&self, node: NodeId);

    fn listen(&self, node: NodeId, event: &str, listener: Listener);

    fn navigate(&self, path: &str);
}
