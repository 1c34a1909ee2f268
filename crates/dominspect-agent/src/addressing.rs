//! Positional element addressing.
//!
//! Paths count element children only; text and comment nodes never take an
//! index. Paths are recomputed on every selection and never cached, because
//! any sibling insertion or removal shifts them.

use dominspect_dom::{Document, NodeId};
use dominspect_protocols::ElementPath;

/// Path from the root element to `node`, root-most index first.
///
/// `None` when `node` is not an element attached to the document.
pub fn path_of(doc: &Document, node: NodeId) -> Option<ElementPath> {
    if !doc.is_element(node) || !doc.is_connected(node) {
        return None;
    }
    let root = doc.root_element()?;

    let mut indices = Vec::new();
    let mut current = node;
    while current != root {
        let parent = doc.parent(current)?;
        let index = doc.element_children(parent).position(|c| c == current)?;
        indices.push(index as u32);
        current = parent;
    }
    indices.reverse();
    Some(ElementPath::from_indices(indices))
}

/// Resolve a path from the root element.
///
/// Fails as soon as any step is out of range; there is no partial match.
pub fn resolve(doc: &Document, path: &ElementPath) -> Option<NodeId> {
    let mut current = doc.root_element()?;
    for index in path.indices() {
        current = doc.element_children(current).nth(*index as usize)?;
    }
    Some(current)
}
