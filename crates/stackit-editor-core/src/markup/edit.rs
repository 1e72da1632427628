//! Mutation primitives over the markup tree.
//!
//! Operations take flat caret offsets (see `stops`) and leave the tree
//! normalized: no empty text nodes, no empty formatting elements, adjacent
//! text merged, and adjacent identical formatting elements or lists merged.
//! Normalization never changes flat offsets.

use super::{
    Element, NodeId, Point, Tree, is_block, is_content_block, is_list, is_void, stops::AtomKind,
};

/// Inline formatting toggled by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Strikethrough,
}

impl Mark {
    /// Tag written when the mark is applied.
    pub fn tag(self) -> &'static str {
        match self {
            Mark::Bold => "b",
            Mark::Italic => "i",
            Mark::Strikethrough => "s",
        }
    }

    /// Whether an existing element already carries this mark.
    pub fn matches(self, tag: &str) -> bool {
        match self {
            Mark::Bold => matches!(tag, "b" | "strong"),
            Mark::Italic => matches!(tag, "i" | "em"),
            Mark::Strikethrough => matches!(tag, "s" | "strike" | "del"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn css_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

fn is_formatting(tag: &str) -> bool {
    matches!(
        tag,
        "b" | "strong" | "i" | "em" | "s" | "strike" | "del" | "u" | "code" | "span" | "sub" | "sup"
    )
}

fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

impl Tree {
    fn is_block_node(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(is_block)
    }

    /// Split a text node at a char offset; the right half is inserted after it.
    pub(crate) fn split_text(&mut self, node: NodeId, at: usize) -> Option<NodeId> {
        let text = self.text_mut(node)?;
        let byte = char_to_byte(text, at);
        let right = text.split_off(byte);
        let right_node = self.create_text(right);
        self.insert_after(node, right_node);
        Some(right_node)
    }

    /// Make sure a node boundary exists at a flat offset.
    pub(crate) fn split_at_offset(&mut self, offset: usize) {
        let Some(point) = self.caret_map().point_at(offset) else {
            return;
        };
        let len = self.node_len(point.node);
        if self.is_text(point.node) && point.offset > 0 && point.offset < len {
            self.split_text(point.node, point.offset);
        }
    }

    /// Turn a point into a `(parent, child index)` boundary, splitting text.
    pub(crate) fn boundary(&mut self, point: Point) -> Option<(NodeId, usize)> {
        if self.is_text(point.node) {
            let len = self.node_len(point.node);
            let parent = self.parent(point.node)?;
            let idx = self.index_in_parent(point.node)?;
            if point.offset == 0 {
                return Some((parent, idx));
            }
            if point.offset < len {
                self.split_text(point.node, point.offset);
            }
            return Some((parent, idx + 1));
        }
        let len = self.children(point.node).len();
        Some((point.node, point.offset.min(len)))
    }

    /// Split `container` at `point`. Everything after the point moves into a
    /// shallow clone of each element on the way up, and the clone of
    /// `container` is inserted right after it and returned.
    pub(crate) fn split_container(&mut self, container: NodeId, point: Point) -> Option<NodeId> {
        if container == self.root() {
            return None;
        }
        let (mut parent, mut index) = self.boundary(point)?;
        if !self.is_descendant_or_self(parent, container) {
            return None;
        }
        loop {
            let element = self.element(parent)?.clone();
            let right = self.create_element(element);
            let tail = self.children(parent).get(index..).unwrap_or(&[]).to_vec();
            for child in tail {
                self.append_child(right, child);
            }
            let grand = self.parent(parent)?;
            let pos = self.index_in_parent(parent)?;
            self.insert_child(grand, pos + 1, right);
            if parent == container {
                return Some(right);
            }
            parent = grand;
            index = pos + 1;
        }
    }

    /// Nearest inline ancestor (inclusive) carrying `mark`, below any block.
    pub(crate) fn mark_ancestor(&self, node: NodeId, mark: Mark) -> Option<NodeId> {
        let root = self.root();
        std::iter::once(node)
            .chain(self.ancestors(node))
            .take_while(|&n| n != root && !self.is_block_node(n))
            .find(|&n| self.tag(n).is_some_and(|t| mark.matches(t)))
    }

    /// Whether the caret at `offset` sits inside `mark`.
    pub fn is_marked_at(&self, offset: usize, mark: Mark) -> bool {
        self.caret_map()
            .point_at(offset)
            .is_some_and(|p| self.mark_ancestor(p.node, mark).is_some())
    }

    /// Toggle an inline mark over `start..end`. Returns false if the range
    /// holds no content.
    pub(crate) fn toggle_mark(&mut self, start: usize, end: usize, mark: Mark) -> bool {
        if start >= end {
            return false;
        }
        self.split_at_offset(end);
        self.split_at_offset(start);

        let atoms = self.caret_map().content_atoms_in(start, end);
        let texts: Vec<NodeId> = atoms
            .iter()
            .filter(|a| a.kind == AtomKind::Text)
            .map(|a| a.node)
            .collect();
        let subject = if texts.is_empty() {
            atoms.iter().map(|a| a.node).collect()
        } else {
            texts
        };
        if subject.is_empty() {
            return false;
        }

        let all_marked = subject
            .iter()
            .all(|&n| self.mark_ancestor(n, mark).is_some());
        for node in subject {
            if all_marked {
                self.clear_mark(node, mark);
            } else if self.mark_ancestor(node, mark).is_none() {
                self.wrap(node, Element::new(mark.tag()));
            }
        }
        self.normalize();
        true
    }

    /// Pull `node` out of every ancestor carrying `mark`.
    fn clear_mark(&mut self, node: NodeId, mark: Mark) {
        while let Some(anc) = self.mark_ancestor(node, mark) {
            if anc == node {
                break;
            }
            let (Some(parent), Some(idx)) = (self.parent(node), self.index_in_parent(node)) else {
                break;
            };
            let Some(right) = self.split_container(anc, Point::new(parent, idx)) else {
                break;
            };
            let (Some(parent), Some(idx)) = (self.parent(node), self.index_in_parent(node)) else {
                break;
            };
            self.split_container(right, Point::new(parent, idx + 1));
            self.unwrap_element(right);
        }
    }

    /// Insert plain text at `offset`, applying or escaping pending marks.
    /// Returns the caret offset after the inserted text.
    pub(crate) fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        enable: &[Mark],
        disable: &[Mark],
    ) -> usize {
        if text.is_empty() {
            return offset;
        }
        let Some(mut point) = self.caret_map().point_at(offset) else {
            return offset;
        };
        let inserted = text.chars().count();

        if enable.is_empty() && disable.is_empty() {
            if let Some(existing) = self.text_mut(point.node) {
                let byte = char_to_byte(existing, point.offset);
                existing.insert_str(byte, text);
                return offset + inserted;
            }
        }

        for &mark in disable {
            let Some(anc) = self.mark_ancestor(point.node, mark) else {
                continue;
            };
            if self.split_container(anc, point).is_some() {
                if let (Some(parent), Some(idx)) = (self.parent(anc), self.index_in_parent(anc)) {
                    point = Point::new(parent, idx + 1);
                }
            }
        }

        let mut top = self.create_text(text);
        for &mark in enable.iter().rev() {
            top = self.wrap(top, Element::new(mark.tag()));
        }
        let Some((parent, index)) = self.boundary(point) else {
            self.remove(top);
            return offset;
        };
        self.insert_child(parent, index, top);
        self.normalize();
        offset + inserted
    }

    /// Parse `markup` and insert the resulting nodes at `offset`. Returns the
    /// caret offset after the inserted content, or `None` when the fragment
    /// produced no nodes.
    pub(crate) fn insert_fragment(&mut self, offset: usize, markup: &str) -> Option<usize> {
        let nodes = self.parse_fragment(markup);
        if nodes.is_empty() {
            return None;
        }
        let point = self.caret_map().point_at(offset);
        let Some((parent, index)) = point.and_then(|p| self.boundary(p)) else {
            for node in nodes {
                self.remove(node);
            }
            return None;
        };
        let count = nodes.len();
        for (i, node) in nodes.into_iter().enumerate() {
            self.insert_child(parent, index + i, node);
        }
        let map = self.caret_map();
        let after = map
            .offset_of(self, Point::new(parent, index + count))
            .unwrap_or(map.len());
        self.normalize();
        Some(after)
    }

    /// Delete everything in `start..end`, merging lines across removed block
    /// boundaries.
    pub(crate) fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        self.split_at_offset(end);
        self.split_at_offset(start);

        let map = self.caret_map();
        let separators = map.separators_in(start, end).len();
        for atom in map.content_atoms_in(start, end) {
            self.remove(atom.node);
        }
        for _ in 0..separators {
            if !self.merge_lines(start) {
                break;
            }
        }
        self.normalize();
        true
    }

    /// The child of the nearest block (or the root) that contains `node`.
    fn line_top(&self, node: NodeId) -> NodeId {
        let root = self.root();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if parent == root || self.is_block_node(parent) {
                break;
            }
            current = parent;
        }
        current
    }

    /// Join the line after the separator at `at` onto the line before it.
    fn merge_lines(&mut self, at: usize) -> bool {
        let map = self.caret_map();
        if map.separators_in(at, at + 1).is_empty() {
            return false;
        }
        let (Some(prev), Some(next)) = (map.point_at(at), map.point_at(at + 1)) else {
            return false;
        };

        if self.tag(next.node).is_some_and(is_content_block) && self.children(next.node).is_empty()
        {
            self.remove_empty_chain(next.node);
            return true;
        }

        let first = if self.is_text(next.node) {
            next.node
        } else {
            match self.children(next.node).get(next.offset) {
                Some(&child) => child,
                None => return false,
            }
        };

        let (dest_parent, dest_index) = if self.is_text(prev.node) {
            let top = self.line_top(prev.node);
            match (self.parent(top), self.index_in_parent(top)) {
                (Some(p), Some(i)) => (p, i + 1),
                _ => return false,
            }
        } else if prev.offset == 0 {
            (prev.node, 0)
        } else {
            let Some(&before) = self.children(prev.node).get(prev.offset - 1) else {
                return false;
            };
            let top = self.line_top(before);
            match (self.parent(top), self.index_in_parent(top)) {
                (Some(p), Some(i)) => (p, i + 1),
                _ => return false,
            }
        };

        let mut head = self.line_top(first);
        if self.is_descendant_or_self(dest_parent, head) {
            head = first;
            if self.is_descendant_or_self(dest_parent, head) {
                return false;
            }
        }
        let Some(source) = self.parent(head) else {
            return false;
        };
        let siblings = self.children(source).to_vec();
        let start_idx = siblings.iter().position(|&c| c == head).unwrap_or(0);
        let moving: Vec<NodeId> = siblings[start_idx..]
            .iter()
            .copied()
            .take_while(|&c| !self.is_block_node(c))
            .collect();

        for (i, node) in moving.into_iter().enumerate() {
            self.insert_child(dest_parent, dest_index + i, node);
        }
        self.cleanup_empty_blocks(source);
        true
    }

    fn remove_empty_chain(&mut self, node: NodeId) {
        let parent = self.parent(node);
        self.remove(node);
        if let Some(parent) = parent {
            self.cleanup_empty_blocks(parent);
        }
    }

    /// Remove `node` and its ancestors while they are childless blocks.
    fn cleanup_empty_blocks(&mut self, node: NodeId) {
        let root = self.root();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == root || !self.is_block_node(n) || !self.children(n).is_empty() {
                break;
            }
            current = self.parent(n);
            self.remove(n);
        }
    }

    /// Split the block holding `offset` in two (Enter). Returns the caret
    /// offset at the start of the new block.
    pub(crate) fn split_block(&mut self, offset: usize) -> usize {
        let Some(mut point) = self.caret_map().point_at(offset) else {
            return offset;
        };
        let block = match self.content_block_of(point.node) {
            Some(block) => block,
            None => {
                let Some(block) = self.wrap_root_run(point) else {
                    return offset;
                };
                match self.caret_map().point_at(offset) {
                    Some(p) => point = p,
                    None => return offset,
                }
                block
            }
        };
        let Some(right) = self.split_container(block, point) else {
            return offset;
        };
        let map = self.caret_map();
        let caret = map
            .offset_of(self, Point::new(right, 0))
            .unwrap_or(offset + 1);
        self.normalize();
        caret
    }

    /// Wrap the run of inline root children around `point` in a `div`.
    fn wrap_root_run(&mut self, point: Point) -> Option<NodeId> {
        let root = self.root();
        let children = self.children(root).to_vec();
        let (mut start, mut end) = if point.node == root {
            (point.offset.min(children.len()), point.offset.min(children.len()))
        } else {
            let top = std::iter::once(point.node)
                .chain(self.ancestors(point.node))
                .find(|&n| self.parent(n) == Some(root))?;
            let idx = children.iter().position(|&c| c == top)?;
            if self.is_block_node(top) {
                return None;
            }
            (idx, idx + 1)
        };
        while start > 0 && !self.is_block_node(children[start - 1]) {
            start -= 1;
        }
        while end < children.len() && !self.is_block_node(children[end]) {
            end += 1;
        }
        let div = self.create_element(Element::new("div"));
        self.insert_child(root, start, div);
        for &child in &children[start..end] {
            self.append_child(div, child);
        }
        Some(div)
    }

    /// Blocks touched by `start..=end`: list items, content blocks, and
    /// (when `materialize` is set) root-level inline runs wrapped in a `div`.
    fn block_units(&mut self, start: usize, end: usize, materialize: bool) -> Vec<NodeId> {
        let map = self.caret_map();
        let points: Vec<Point> = if start == end {
            map.point_at(start).into_iter().collect()
        } else {
            map.stops()
                .iter()
                .filter(|s| s.offset >= start && s.offset <= end)
                .map(|s| s.point)
                .collect()
        };

        // Resolve root-relative points to nodes before any wrapping shifts
        // the root's child indices.
        let root = self.root();
        let resolved: Vec<(NodeId, Point)> = points
            .into_iter()
            .map(|point| {
                if point.node != root {
                    return (point.node, point);
                }
                let children = self.children(root);
                let node = children
                    .get(point.offset)
                    .or_else(|| children.get(point.offset.wrapping_sub(1)))
                    .copied()
                    .unwrap_or(root);
                (node, point)
            })
            .collect();

        let mut units: Vec<NodeId> = Vec::new();
        for (node, point) in resolved {
            let item = std::iter::once(node)
                .chain(self.ancestors(node))
                .take_while(|&n| n != root)
                .find(|&n| self.tag(n) == Some("li"));
            let unit = match item.or_else(|| self.content_block_of(node)) {
                Some(unit) => Some(unit),
                None if materialize => {
                    let anchor = if node == root {
                        point
                    } else {
                        Point::new(node, 0)
                    };
                    self.wrap_root_run(anchor)
                }
                None => None,
            };
            if let Some(unit) = unit {
                if !units.contains(&unit) {
                    units.push(unit);
                }
            }
        }
        units
    }

    /// Wrap, unwrap, or switch lists over the blocks in `start..=end`.
    pub(crate) fn toggle_list(&mut self, start: usize, end: usize, kind: ListKind) -> bool {
        let units = self.block_units(start, end, true);
        if units.is_empty() {
            return false;
        }
        let list_of = |tree: &Tree, unit: NodeId| {
            if tree.tag(unit) != Some("li") {
                return None;
            }
            tree.parent(unit).filter(|&p| tree.tag(p).is_some_and(is_list))
        };

        let all_items = units.iter().all(|&u| list_of(self, u).is_some());
        let all_same = all_items
            && units
                .iter()
                .all(|&u| list_of(self, u).and_then(|l| self.tag(l)) == Some(kind.tag()));

        if all_same {
            for unit in units {
                self.unlist_item(unit);
            }
        } else {
            for unit in units {
                match list_of(self, unit) {
                    Some(list) => {
                        if let Some(el) = self.element_mut(list) {
                            el.tag = kind.tag().into();
                        }
                    }
                    None => self.listify_block(unit, kind),
                }
            }
        }
        self.normalize();
        true
    }

    /// Lift a list item out of its list as a `div`.
    fn unlist_item(&mut self, item: NodeId) {
        let (Some(list), Some(idx)) = (self.parent(item), self.index_in_parent(item)) else {
            return;
        };
        let Some(right) = self.split_container(list, Point::new(list, idx)) else {
            return;
        };
        self.split_container(right, Point::new(right, 1));
        if let Some(el) = self.element_mut(item) {
            el.tag = "div".into();
        }
        self.unwrap_element(right);
    }

    /// Replace a content block by a list item inside a fresh list.
    fn listify_block(&mut self, block: NodeId, kind: ListKind) {
        let (Some(parent), Some(idx)) = (self.parent(block), self.index_in_parent(block)) else {
            return;
        };
        let mut li = Element::new("li");
        if let Some(style) = self.element(block).and_then(|el| el.attr("style")) {
            li.set_attr("style", style.to_string());
        }
        let item = self.create_element(li);
        for child in self.children(block).to_vec() {
            self.append_child(item, child);
        }
        self.insert_child(parent, idx, item);
        self.remove(block);
        self.wrap(item, Element::new(kind.tag()));
    }

    /// Set block alignment over the blocks in `start..=end`.
    pub(crate) fn align(&mut self, start: usize, end: usize, alignment: Alignment) -> bool {
        let units = self.block_units(start, end, alignment != Alignment::Left);
        for unit in units {
            if let Some(el) = self.element_mut(unit) {
                set_text_align(el, alignment);
            }
        }
        self.normalize();
        true
    }

    /// Structural cleanup; see the module docs.
    pub(crate) fn normalize(&mut self) {
        let root = self.root();
        self.normalize_node(root);
    }

    fn normalize_node(&mut self, node: NodeId) {
        for child in self.children(node).to_vec() {
            if self.element(child).is_some() {
                self.normalize_node(child);
            }
        }

        let mut i = 0;
        loop {
            let children = self.children(node).to_vec();
            let Some(&child) = children.get(i) else {
                break;
            };

            if self.text(child).is_some_and(str::is_empty) {
                self.remove(child);
                continue;
            }
            if let Some(tag) = self.tag(child) {
                let removable = (is_formatting(tag) || tag == "a" || is_list(tag)) && !is_void(tag);
                if removable && self.children(child).is_empty() {
                    self.remove(child);
                    continue;
                }
            }

            if i > 0 {
                let prev = children[i - 1];
                if let (Some(_), Some(right)) = (self.text(prev), self.text(child)) {
                    let right = right.to_string();
                    if let Some(left) = self.text_mut(prev) {
                        left.push_str(&right);
                    }
                    self.remove(child);
                    continue;
                }
                let mergeable = match (self.element(prev), self.element(child)) {
                    (Some(a), Some(b)) => {
                        a == b && (is_formatting(&a.tag) || is_list(&a.tag))
                    }
                    _ => false,
                };
                if mergeable {
                    for grandchild in self.children(child).to_vec() {
                        self.append_child(prev, grandchild);
                    }
                    self.remove(child);
                    self.normalize_node(prev);
                    continue;
                }
            }
            i += 1;
        }
    }

    /// Text projection: separators and `br` become newlines, other void
    /// elements become U+FFFC.
    pub fn plain_text(&self) -> String {
        let map = self.caret_map();
        let mut out = String::new();
        for atom in map.atoms() {
            match atom.kind {
                AtomKind::Text => out.push_str(self.text(atom.node).unwrap_or_default()),
                AtomKind::Separator => out.push('\n'),
                AtomKind::Void => match self.tag(atom.node) {
                    Some("br") => out.push('\n'),
                    _ => out.push('\u{fffc}'),
                },
            }
        }
        out
    }

    /// Whether anything a reader would see is present.
    pub fn has_visible_content(&self) -> bool {
        self.caret_map().atoms().iter().any(|atom| match atom.kind {
            AtomKind::Text => self
                .text(atom.node)
                .is_some_and(|t| t.chars().any(|c| !c.is_whitespace())),
            AtomKind::Void => self.tag(atom.node) != Some("br"),
            AtomKind::Separator => false,
        })
    }
}

fn set_text_align(el: &mut Element, alignment: Alignment) {
    let mut decls: Vec<(String, String)> = el
        .attr("style")
        .unwrap_or_default()
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .filter(|(name, _)| !name.is_empty() && name != "text-align")
        .collect();
    if alignment != Alignment::Left {
        decls.push(("text-align".into(), alignment.css_value().into()));
    }
    if decls.is_empty() {
        el.remove_attr("style");
    } else {
        let style = decls
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        el.set_attr("style", style);
    }
}
