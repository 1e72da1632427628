//! Caret-stop projection.
//!
//! Maps the tree onto a line of flat offsets. Each char of text and each void
//! element is one unit. Crossing into a new content block after something has
//! been emitted costs one separator unit, and an empty content block owns a
//! single stop so the caret can sit inside it. Every offset in `0..=len` has at
//! least one stop; where several points share an offset the earliest one in
//! document order wins.

use super::{NodeId, NodeKind, Point, Tree, is_content_block, is_void};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretStop {
    pub offset: usize,
    pub point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// A text node; spans its char length.
    Text,
    /// A void element such as `img` or `br`.
    Void,
    /// A block boundary.
    Separator,
}

/// A run of units in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    pub start: usize,
    pub len: usize,
    /// The text node or void element. For separators, the node whose content
    /// follows the boundary.
    pub node: NodeId,
    pub kind: AtomKind,
}

impl Atom {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaretMap {
    stops: Vec<CaretStop>,
    atoms: Vec<Atom>,
    len: usize,
}

impl CaretMap {
    /// Highest valid offset.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stops(&self) -> &[CaretStop] {
        &self.stops
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Resolve a flat offset to a point, clamping past the end.
    pub fn point_at(&self, offset: usize) -> Option<Point> {
        let offset = offset.min(self.len);
        let idx = self.stops.partition_point(|s| s.offset < offset);
        self.stops
            .get(idx)
            .or_else(|| self.stops.last())
            .map(|s| s.point)
    }

    /// Resolve a point to a flat offset.
    ///
    /// Text points must be stops. Element points resolve to the first stop
    /// inside the addressed child, or the last stop inside the element when
    /// the index is at or past the end. Points into detached or dead nodes do
    /// not resolve.
    pub fn offset_of(&self, tree: &Tree, point: Point) -> Option<usize> {
        if !tree.is_attached(point.node) || point.offset > tree.node_len(point.node) {
            return None;
        }
        if let Some(stop) = self.stops.iter().find(|s| s.point == point) {
            return Some(stop.offset);
        }
        if tree.is_text(point.node) {
            return None;
        }

        let children = tree.children(point.node);
        for &child in children.iter().skip(point.offset) {
            if let Some(stop) = self
                .stops
                .iter()
                .find(|s| tree.is_descendant_or_self(s.point.node, child))
            {
                return Some(stop.offset);
            }
        }
        self.stops
            .iter()
            .rev()
            .find(|s| tree.is_descendant_or_self(s.point.node, point.node))
            .map(|s| s.offset)
    }

    /// Atoms of text or void kind lying wholly inside `start..end`.
    pub fn content_atoms_in(&self, start: usize, end: usize) -> Vec<Atom> {
        self.atoms
            .iter()
            .filter(|a| a.kind != AtomKind::Separator && a.len > 0)
            .filter(|a| a.start >= start && a.end() <= end)
            .copied()
            .collect()
    }

    /// Separator atoms starting inside `start..end`.
    pub fn separators_in(&self, start: usize, end: usize) -> Vec<Atom> {
        self.atoms
            .iter()
            .filter(|a| a.kind == AtomKind::Separator && a.start >= start && a.start < end)
            .copied()
            .collect()
    }
}

struct Projector<'a> {
    tree: &'a Tree,
    map: CaretMap,
    counter: usize,
    emitted_any: bool,
    pending_break: bool,
}

pub(super) fn project(tree: &Tree) -> CaretMap {
    let mut projector = Projector {
        tree,
        map: CaretMap::default(),
        counter: 0,
        emitted_any: false,
        pending_break: false,
    };
    let root = tree.root();
    for &child in tree.children(root) {
        projector.visit(child);
    }
    if projector.map.stops.is_empty() {
        projector.map.stops.push(CaretStop {
            offset: 0,
            point: Point::new(root, 0),
        });
    }
    projector.map.len = projector.counter;
    projector.map
}

impl Projector<'_> {
    fn resolve_break(&mut self, next: NodeId) {
        if self.pending_break {
            self.map.atoms.push(Atom {
                start: self.counter,
                len: 1,
                node: next,
                kind: AtomKind::Separator,
            });
            self.counter += 1;
            self.pending_break = false;
        }
    }

    fn stop(&mut self, point: Point) {
        self.map.stops.push(CaretStop {
            offset: self.counter,
            point,
        });
    }

    fn visit(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            Some(NodeKind::Text(text)) => {
                let len = text.chars().count();
                self.resolve_break(node);
                let start = self.counter;
                for i in 0..=len {
                    self.map.stops.push(CaretStop {
                        offset: start + i,
                        point: Point::new(node, i),
                    });
                }
                self.map.atoms.push(Atom {
                    start,
                    len,
                    node,
                    kind: AtomKind::Text,
                });
                self.counter += len;
                self.emitted_any = true;
            }
            Some(NodeKind::Element(el)) if is_void(&el.tag) => {
                let (Some(parent), Some(idx)) =
                    (self.tree.parent(node), self.tree.index_in_parent(node))
                else {
                    return;
                };
                self.resolve_break(node);
                self.stop(Point::new(parent, idx));
                self.map.atoms.push(Atom {
                    start: self.counter,
                    len: 1,
                    node,
                    kind: AtomKind::Void,
                });
                self.counter += 1;
                self.stop(Point::new(parent, idx + 1));
                self.emitted_any = true;
            }
            Some(NodeKind::Element(el)) => {
                let block = is_content_block(&el.tag);
                if block && self.emitted_any {
                    self.pending_break = true;
                }
                let stops_before = self.map.stops.len();
                for &child in self.tree.children(node) {
                    self.visit(child);
                }
                if block {
                    if self.map.stops.len() == stops_before {
                        self.resolve_break(node);
                        self.stop(Point::new(node, 0));
                        self.emitted_any = true;
                    }
                    self.pending_break = true;
                }
            }
            None => {}
        }
    }
}
