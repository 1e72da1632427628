//! Cursor preservation across wholesale content replacement.
//!
//! A snapshot records each end of the selection as a tree point together with
//! the structural path and kind of the node it lives in. Node identity only
//! survives for as long as the tree does, so after a replacement the path is
//! what usually resolves. Anything that does not resolve collapses the cursor
//! to the end of the new content.

use smol_str::SmolStr;

use crate::config::RestoreStrategy;
use crate::markup::{NodeId, NodeKind, Point, Tree};
use crate::surface::Surface;
use crate::types::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorKind {
    Text,
    Element(SmolStr),
}

impl AnchorKind {
    fn of(tree: &Tree, node: NodeId) -> Option<Self> {
        match tree.kind(node)? {
            NodeKind::Text(_) => Some(AnchorKind::Text),
            NodeKind::Element(el) => Some(AnchorKind::Element(el.tag.clone())),
        }
    }
}

/// One end of a captured selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub node: NodeId,
    pub offset: usize,
    pub path: Vec<usize>,
    pub kind: AnchorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub anchor: Anchor,
    pub head: Anchor,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionTracker {
    strategy: RestoreStrategy,
}

impl SelectionTracker {
    pub fn new(strategy: RestoreStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> RestoreStrategy {
        self.strategy
    }

    /// Capture the surface selection. `None` when the surface has no focus.
    pub fn capture(&self, surface: &Surface) -> Option<SelectionSnapshot> {
        let selection = surface.selection()?;
        let tree = surface.tree();
        let map = tree.caret_map();
        let anchor = anchor_at(tree, map.point_at(selection.anchor)?)?;
        let head = anchor_at(tree, map.point_at(selection.head)?)?;
        Some(SelectionSnapshot { anchor, head })
    }

    /// Re-resolve a snapshot against the surface's current tree.
    pub fn restore(&self, surface: &mut Surface, snapshot: Option<&SelectionSnapshot>) {
        let Some(snapshot) = snapshot else {
            surface.place_selection(None);
            return;
        };
        let end = surface.caret_len();
        let restored = match self.strategy {
            RestoreStrategy::EndOfContent => None,
            RestoreStrategy::Structural => {
                let tree = surface.tree();
                match (resolve(tree, &snapshot.anchor), resolve(tree, &snapshot.head)) {
                    (Some(anchor), Some(head)) => Some(Selection::new(anchor, head)),
                    _ => None,
                }
            }
        };
        let selection = restored.unwrap_or_else(|| {
            tracing::trace!(target: "stackit::selection", end, "selection fell back to end of content");
            Selection::collapsed(end)
        });
        tracing::trace!(
            target: "stackit::selection",
            anchor = selection.anchor,
            head = selection.head,
            "selection restored"
        );
        surface.place_selection(Some(selection));
    }
}

fn anchor_at(tree: &Tree, point: Point) -> Option<Anchor> {
    Some(Anchor {
        node: point.node,
        offset: point.offset,
        path: tree.path_of(point.node)?,
        kind: AnchorKind::of(tree, point.node)?,
    })
}

/// Identity first, then a same-kind node at the same path with room for the
/// offset.
fn resolve(tree: &Tree, anchor: &Anchor) -> Option<usize> {
    let map = tree.caret_map();
    if tree.is_attached(anchor.node) {
        if let Some(offset) = map.offset_of(tree, Point::new(anchor.node, anchor.offset)) {
            return Some(offset);
        }
    }
    let node = tree.node_at_path(&anchor.path)?;
    if AnchorKind::of(tree, node)? != anchor.kind || anchor.offset > tree.node_len(node) {
        return None;
    }
    map.offset_of(tree, Point::new(node, anchor.offset))
}
