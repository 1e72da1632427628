//! Inline-markup engine backing the editing surface.
//!
//! The surface content is a flat HTML-subset string at the boundary. Inside the
//! editor it lives in a [`Tree`] of element and text nodes addressed by
//! [`NodeId`]. Every tree gets a fresh epoch when it is built, so ids taken from
//! a tree that was replaced wholesale never resolve against its successor.
//!
//! - `parse`: tolerant markup → tree
//! - `serialize`: tree → canonical markup
//! - `stops`: caret-stop projection between flat offsets and tree points
//! - `edit`: mutation primitives used by the command dispatcher

mod edit;
mod parse;
mod serialize;
mod stops;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU32, Ordering};

use smol_str::SmolStr;

pub use edit::{Alignment, ListKind, Mark};
pub use serialize::{escape_attr, escape_text};
pub use stops::{Atom, AtomKind, CaretMap, CaretStop};

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Identity of a node within one tree generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    epoch: u32,
    index: u32,
}

impl NodeId {
    /// Epoch of the tree that allocated this id.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// A position in the tree, DOM style.
///
/// For text nodes `offset` is a char offset into the text. For elements it is
/// a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<Attribute>,
}

impl Element {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements that never have children.
pub fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "img" | "hr" | "wbr")
}

/// Blocks that hold a line of content and take part in caret separation.
pub fn is_content_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre"
    )
}

pub fn is_list(tag: &str) -> bool {
    matches!(tag, "ol" | "ul")
}

pub fn is_block(tag: &str) -> bool {
    is_content_block(tag) || is_list(tag)
}

const ROOT_TAG: &str = "#root";

/// Arena-backed markup tree.
#[derive(Debug, Clone)]
pub struct Tree {
    epoch: u32,
    slots: Vec<Option<NodeData>>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree with a fresh epoch.
    pub fn new() -> Self {
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        let root = NodeId { epoch, index: 0 };
        Self {
            epoch,
            slots: vec![Some(NodeData {
                kind: NodeKind::Element(Element::new(ROOT_TAG)),
                parent: None,
                children: Vec::new(),
            })],
            root,
        }
    }

    /// Build a tree from markup. Malformed input is handled best-effort.
    pub fn parse(markup: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.root;
        parse::parse_into(&mut tree, root, markup);
        tree
    }

    /// Parse markup into new detached nodes, returned in document order.
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        let holder = self.create_element(Element::new(ROOT_TAG));
        parse::parse_into(self, holder, markup);
        let nodes = self.children(holder).to_vec();
        for &node in &nodes {
            self.detach(node);
        }
        self.remove(holder);
        nodes
    }

    pub fn serialize(&self) -> String {
        serialize::serialize_children(self, self.root)
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        if id.epoch != self.epoch {
            return None;
        }
        self.slots.get(id.index as usize)?.as_ref()
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        if id.epoch != self.epoch {
            return None;
        }
        self.slots.get_mut(id.index as usize)?.as_mut()
    }

    /// Whether the node is alive in this tree generation.
    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Whether the node is alive and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.data(node).and_then(|d| d.parent);
        }
        false
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    /// Length of a node in point units: chars for text, children for elements.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.chars().count(),
            Some(NodeKind::Element(_)) => self.children(id).len(),
            None => 0,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Iterate ancestors from the parent upwards, root included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    pub fn is_descendant_or_self(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Child indices leading from the root to `id`.
    pub fn path_of(&self, id: NodeId) -> Option<Vec<usize>> {
        if !self.is_attached(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |node, &idx| self.children(node).get(idx).copied())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.slots.len() as u32;
        self.slots.push(Some(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        NodeId {
            epoch: self.epoch,
            index,
        }
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Detach `child` from its parent, keeping it alive.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.parent(child) {
            if let Some(data) = self.data_mut(parent) {
                data.children.retain(|&c| c != child);
            }
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = None;
        }
    }

    /// Insert `child` into `parent` at `index`, detaching it first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let Some(data) = self.data_mut(parent) else {
            return;
        };
        let index = index.min(data.children.len());
        data.children.insert(index, child);
        if let Some(child_data) = self.data_mut(child) {
            child_data.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `node` right after `sibling` in the sibling's parent.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        if let (Some(parent), Some(idx)) = (self.parent(sibling), self.index_in_parent(sibling)) {
            self.insert_child(parent, idx + 1, node);
        }
    }

    /// Detach and free a node with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(data) = self.data_mut(node) {
                stack.extend(data.children.drain(..));
            }
            if node.epoch == self.epoch {
                if let Some(slot) = self.slots.get_mut(node.index as usize) {
                    *slot = None;
                }
            }
        }
    }

    /// Replace `element` by its children, in place.
    pub fn unwrap_element(&mut self, element: NodeId) {
        let (Some(parent), Some(idx)) = (self.parent(element), self.index_in_parent(element))
        else {
            return;
        };
        let children = self.children(element).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, idx + 1 + offset, child);
        }
        self.remove(element);
    }

    /// Wrap `node` in a new element placed at its position.
    pub fn wrap(&mut self, node: NodeId, element: Element) -> NodeId {
        let wrapper = self.create_element(element);
        if let (Some(parent), Some(idx)) = (self.parent(node), self.index_in_parent(node)) {
            self.insert_child(parent, idx, wrapper);
        }
        self.append_child(wrapper, node);
        wrapper
    }

    /// Nearest content-block ancestor of `id` (inclusive), excluding the root.
    pub fn content_block_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|&n| n != self.root)
            .find(|&n| self.tag(n).is_some_and(is_content_block))
    }

    /// Caret-stop projection of the current tree.
    pub fn caret_map(&self) -> CaretMap {
        stops::project(self)
    }
}
