//! Arena-backed document tree.

use std::collections::BTreeMap;

use crate::error::DomError;
use crate::style::{InlineStyle, ScrollOptions};

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

/// Handle to a node in a [`Document`]. Stays valid after the node is removed
/// from the tree; [`Document::is_connected`] tells whether it is still attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    tag_name: String,
    attributes: BTreeMap<String, String>,
    style: InlineStyle,
}

impl ElementData {
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Record of one scroll-into-view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRecord {
    pub target: NodeId,
    pub options: ScrollOptions,
}

/// A document: the document node, its single root element, and everything
/// below it. Detached nodes stay in the arena.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    document_node: NodeId,
    scrolls: Vec<ScrollRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (no root element yet).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            document_node: NodeId(0),
            scrolls: Vec::new(),
        }
    }

    /// Create a document whose root element has the given tag.
    pub fn with_root(tag_name: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.create_element(tag_name);
        doc.nodes[root.0].parent = Some(doc.document_node);
        doc.nodes[doc.document_node.0].children.push(root);
        doc
    }

    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create a detached element. Tag names are stored lowercase.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_node(NodeKind::Element(ElementData {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: InlineStyle::default(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Comment(text.into()))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        self.node(id).map(|_| ()).ok_or(DomError::NodeNotFound(id.0))
    }

    pub fn document_node(&self) -> NodeId {
        self.document_node
    }

    /// The document's root element (`document.documentElement`).
    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(self.document_node).next()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// All child nodes, including text and comments.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children only, in tree order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.is_element(*child))
    }

    /// Whether the node is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.document_node {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// The node itself if it is an element, otherwise its nearest element ancestor.
    pub fn closest_element(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_element(current) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let position = self.children(parent).len();
        self.insert_child(parent, position, child)
    }

    /// Insert `child` at `position` among all of `parent`'s child nodes.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        position: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;

        if matches!(self.kind(child), Some(NodeKind::Document)) {
            return Err(DomError::HierarchyRequest(
                "the document node cannot be inserted".to_string(),
            ));
        }
        if matches!(self.kind(parent), Some(NodeKind::Text(_) | NodeKind::Comment(_))) {
            return Err(DomError::HierarchyRequest(
                "text and comment nodes cannot have children".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into itself or its descendants".to_string(),
            ));
        }
        if parent == self.document_node
            && self.is_element(child)
            && self.root_element().is_some_and(|root| root != child)
        {
            return Err(DomError::HierarchyRequest(
                "the document already has a root element".to_string(),
            ));
        }

        self.detach(child)?;
        let children = &mut self.nodes[parent.0].children;
        let position = position.min(children.len());
        children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Remove the node from its parent. Its subtree stays intact and keeps its ids.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        self.check(id)?;
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        Ok(())
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    /// Set an attribute. Setting `style` replaces the inline style.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(id).ok_or(DomError::NodeNotFound(id.0))?;
        let name = name.to_ascii_lowercase();
        if name == "style" {
            element.style = InlineStyle::parse(value);
        } else {
            element.attributes.insert(name, value.to_string());
        }
        Ok(())
    }

    /// Remove an attribute. Removing `style` clears the inline style.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        if name == "style" {
            element.style = InlineStyle::default();
        } else {
            element.attributes.remove(&name);
        }
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "id")
    }

    pub fn class_name(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "class")
    }

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        self.element(id).map(|e| &e.style)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Option<&mut InlineStyle> {
        self.element_mut(id).map(|e| &mut e.style)
    }

    /// Concatenation of the node's direct text children, untouched.
    pub fn direct_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| match self.kind(*child) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Request the viewport scroll the element into view.
    pub fn scroll_into_view(&mut self, id: NodeId, options: ScrollOptions) {
        if self.is_element(id) && self.is_connected(id) {
            self.scrolls.push(ScrollRecord {
                target: id,
                options,
            });
        }
    }

    /// Scroll requests made so far, oldest first.
    pub fn scroll_history(&self) -> &[ScrollRecord] {
        &self.scrolls
    }

    /// All attached elements in document order, root first.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root_element().into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<NodeId> = self.element_children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Attached elements that currently carry any inline style.
    pub fn styled_elements(&self) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.style(*id).is_some_and(|s| !s.is_empty()))
            .collect()
    }

    /// First attached element with the given `id` attribute.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|id| self.element_id(*id) == Some(element_id))
    }
}
