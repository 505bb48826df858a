//! In-memory [`Host`] implementation.
//!
//! Nodes live in a map keyed by [`NodeId`]. Clearing a node drops its whole
//! subtree, listeners included, so handles to removed nodes stop resolving.

use std::cell::RefCell;

use compact_str::CompactString;
use phf::phf_set;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::host::{Event, Host, Listener, NodeId};

/// Elements serialized without a closing tag
static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
};

#[derive(Default)]
struct ElementData {
    tag: CompactString,
    attributes: Vec<(CompactString, String)>,
    properties: FxHashMap<CompactString, Value>,
    listeners: Vec<(CompactString, Listener)>,
}

enum NodeKind {
    Element(ElementData),
    Text(String),
    Region,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Arena {
    nodes: FxHashMap<NodeId, NodeData>,
    next_id: u32,
    navigations: Vec<String>,
}

impl Arena {
    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NodeData {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(&node).map(|data| &mut data.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }
}

/// In-memory document.
pub struct Document {
    arena: RefCell<Arena>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let root = arena.insert(NodeKind::Region);
        Self {
            arena: RefCell::new(arena),
            root,
        }
    }

    /// The document's top-level container.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `node` is still part of the document's arena.
    pub fn contains(&self, node: NodeId) -> bool {
        self.arena.borrow().nodes.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().nodes.get(&node)?.parent
    }

    pub fn tag(&self, node: NodeId) -> Option<CompactString> {
        match &self.arena.borrow().nodes.get(&node)?.kind {
            NodeKind::Element(element) => Some(element.tag.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.arena.borrow().nodes.get(&node)?.kind {
            NodeKind::Element(element) => element
                .attributes
                .iter()
                .find(|(n, _)| n.as_str() == name)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    /// Elements with `tag`, in document order below `node`.
    pub fn query_all(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = arena.nodes.get(&current) else {
                continue;
            };
            if matches!(&data.kind, NodeKind::Element(element) if element.tag.as_str() == tag)
                && current != node
            {
                found.push(current);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        found
    }

    /// First element with `tag` anywhere in the document.
    pub fn query(&self, tag: &str) -> Option<NodeId> {
        self.query_all(self.root, tag).into_iter().next()
    }

    /// Concatenated text below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        fn collect(arena: &Arena, node: NodeId, out: &mut String) {
            let Some(data) = arena.nodes.get(&node) else {
                return;
            };
            if let NodeKind::Text(text) = &data.kind {
                out.push_str(text);
            }
            for child in &data.children {
                collect(arena, *child, out);
            }
        }

        let mut out = String::new();
        collect(&self.arena.borrow(), node, &mut out);
        out
    }

    /// Serialize the children of `node` as HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if let Some(data) = arena.nodes.get(&node) {
            for child in &data.children {
                write_html(&arena, *child, &mut out);
            }
        }
        out
    }

    /// Deliver `event` to the listeners registered on `target`. Returns
    /// false when a listener cancelled the default action.
    pub fn dispatch(&self, target: NodeId, event: &str) -> bool {
        let listeners: Vec<Listener> = {
            let arena = self.arena.borrow();
            match arena.nodes.get(&target).map(|data| &data.kind) {
                Some(NodeKind::Element(element)) => element
                    .listeners
                    .iter()
                    .filter(|(name, _)| name.as_str() == event)
                    .map(|(_, listener)| listener.clone())
                    .collect(),
                _ => Vec::new(),
            }
        };
        tracing::trace!(%target, event, listeners = listeners.len(), "dispatch");

        let event = Event::new(event, target);
        for listener in listeners {
            listener(&event);
        }
        !event.default_prevented()
    }

    /// Paths passed to [`Host::navigate`], oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.arena.borrow().navigations.clone()
    }
}

fn write_html(arena: &Arena, node: NodeId, out: &mut String) {
    let Some(data) = arena.nodes.get(&node) else {
        return;
    };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(&htmlize::escape_text(text.as_str())),
        NodeKind::Region => {
            for child in &data.children {
                write_html(arena, *child, out);
            }
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&htmlize::escape_attribute(value.as_str()));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(element.tag.as_str()) {
                return;
            }
            for child in &data.children {
                write_html(arena, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

impl Host for Document {
    fn create_element(&self, tag: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .insert(NodeKind::Element(ElementData {
                tag: CompactString::from(tag),
                ..Default::default()
            }))
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .insert(NodeKind::Text(text.to_string()))
    }

    fn create_region(&self) -> NodeId {
        self.arena.borrow_mut().insert(NodeKind::Region)
    }

    fn set_text(&self, node: NodeId, text: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(NodeKind::Text(current)) = arena.nodes.get_mut(&node).map(|data| &mut data.kind)
        {
            current.clear();
            current.push_str(text);
        }
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        let Some(element) = arena.element_mut(node) else {
            return;
        };
        match element.attributes.iter_mut().find(|(n, _)| n.as_str() == name) {
            Some((_, current)) => *current = value.to_string(),
            None => element
                .attributes
                .push((CompactString::from(name), value.to_string())),
        }
    }

    fn set_property(&self, node: NodeId, name: &str, value: Value) {
        if let Some(element) = self.arena.borrow_mut().element_mut(node) {
            element.properties.insert(CompactString::from(name), value);
        }
    }

    fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        match &self.arena.borrow().nodes.get(&node)?.kind {
            NodeKind::Element(element) => element.properties.get(name).cloned(),
            _ => None,
        }
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if !arena.nodes.contains_key(&parent) {
            return;
        }
        let previous = match arena.nodes.get_mut(&child) {
            Some(data) => data.parent.replace(parent),
            None => return,
        };
        if let Some(previous) = previous.and_then(|p| arena.nodes.get_mut(&p)) {
            previous.children.retain(|c| *c != child);
        }
        if let Some(data) = arena.nodes.get_mut(&parent) {
            data.children.push(child);
        }
    }

    fn clear(&self, node: NodeId) {
        // Dropped listeners may own closures that touch the document, so
        // the subtree is released after the borrow ends.
        let removed = {
            let mut arena = self.arena.borrow_mut();
            let children = match arena.nodes.get_mut(&node) {
                Some(data) => std::mem::take(&mut data.children),
                None => return,
            };
            let mut removed = Vec::new();
            let mut stack = children;
            while let Some(current) = stack.pop() {
                if let Some(data) = arena.nodes.remove(&current) {
                    stack.extend(data.children.iter().copied());
                    removed.push(data);
                }
            }
            removed
        };
        drop(removed);
    }

    fn listen(&self, node: NodeId, event: &str, listener: Listener) {
        if let Some(element) = self.arena.borrow_mut().element_mut(node) {
            element
                .listeners
                .push((CompactString::from(event), listener));
        }
    }

    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.arena.borrow_mut().navigations.push(path.to_string());
    }
}
