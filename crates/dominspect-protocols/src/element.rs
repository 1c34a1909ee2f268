//! Element snapshots shipped from the page agent to the panel.

use serde::{Deserialize, Serialize};

use crate::path::ElementPath;

/// Immutable value snapshot of one element and its full element subtree.
///
/// A snapshot is never a handle to the live node and is never diffed against
/// an earlier one; every update carries the whole subtree from its root down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedElement {
    /// Tag name (lowercase).
    pub tag_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Class names in attribute order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_list: Option<Vec<String>>,

    /// Summary of the element's own text (not its descendants').
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    pub path: ElementPath,

    #[serde(default)]
    pub children: Vec<SerializedElement>,
}

impl SerializedElement {
    pub fn new(tag_name: impl Into<String>, path: ElementPath) -> Self {
        Self {
            tag_name: tag_name.into(),
            id: None,
            class_list: None,
            text_content: None,
            path,
            children: Vec::new(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Look up a descendant snapshot by its absolute path.
    pub fn find(&self, path: &ElementPath) -> Option<&SerializedElement> {
        if !path.starts_with(&self.path) {
            return None;
        }
        let mut node = self;
        for index in &path.indices()[self.path.depth()..] {
            node = node.children.get(*index as usize)?;
        }
        Some(node)
    }

    /// Total number of elements in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_size()).sum::<usize>()
    }

    /// CSS-like label such as `div#main.card.wide`.
    pub fn label(&self) -> String {
        let mut label = self.tag_name.clone();
        if let Some(ref id) = self.id {
            label.push('#');
            label.push_str(id);
        }
        if let Some(ref classes) = self.class_list {
            for class in classes {
                label.push('.');
                label.push_str(class);
            }
        }
        label
    }
}
