//! JSON page fixtures.
//!
//! ```json
//! { "tag": "html", "children": [
//!     { "tag": "body", "class": "app", "children": [
//!         { "text": "Hello" },
//!         { "comment": "nav goes here" },
//!         { "tag": "div", "id": "main", "attrs": { "role": "main" } }
//!     ] }
//! ] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};
use crate::error::DomError;

/// One node of a page fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureNode {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<FixtureNode>,
    },
    Text {
        text: String,
    },
    Comment {
        comment: String,
    },
}

impl FixtureNode {
    /// Shorthand for an element fixture without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<FixtureNode>) -> Self {
        FixtureNode::Element {
            tag: tag.into(),
            id: None,
            class: None,
            style: None,
            attrs: BTreeMap::new(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        FixtureNode::Text { text: text.into() }
    }
}

impl Document {
    /// Build a document whose root element is `root`.
    pub fn from_fixture(root: &FixtureNode) -> Result<Self, DomError> {
        if !matches!(root, FixtureNode::Element { .. }) {
            return Err(DomError::InvalidFixture(
                "the fixture root must be an element".to_string(),
            ));
        }
        let mut doc = Document::new();
        let document_node = doc.document_node();
        doc.build_fixture(document_node, root)?;
        Ok(doc)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DomError> {
        let root: FixtureNode = serde_json::from_str(json)?;
        Self::from_fixture(&root)
    }

    pub fn load_fixture(path: &Path) -> Result<Self, DomError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn build_fixture(&mut self, parent: NodeId, node: &FixtureNode) -> Result<NodeId, DomError> {
        let id = match node {
            FixtureNode::Element {
                tag,
                id,
                class,
                style,
                attrs,
                children,
            } => {
                if tag.trim().is_empty() {
                    return Err(DomError::InvalidFixture("empty tag name".to_string()));
                }
                let element = self.create_element(tag.trim());
                for (name, value) in attrs {
                    self.set_attribute(element, name, value)?;
                }
                if let Some(id) = id {
                    self.set_attribute(element, "id", id)?;
                }
                if let Some(class) = class {
                    self.set_attribute(element, "class", class)?;
                }
                if let Some(style) = style {
                    self.set_attribute(element, "style", style)?;
                }
                self.append_child(parent, element)?;
                for child in children {
                    self.build_fixture(element, child)?;
                }
                element
            }
            FixtureNode::Text { text } => {
                let text = self.create_text(text.clone());
                self.append_child(parent, text)?;
                text
            }
            FixtureNode::Comment { comment } => {
                let comment = self.create_comment(comment.clone());
                self.append_child(parent, comment)?;
                comment
            }
        };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PAGE: &str = r#"{
        "tag": "HTML",
        "children": [
            { "tag": "head" },
            { "tag": "body", "class": "app dark", "children": [
                { "text": "Hello" },
                { "comment": "skipped" },
                { "tag": "div", "id": "main", "attrs": { "role": "main" }, "style": "color: red" }
            ] }
        ]
    }"#;

    #[test]
    fn test_from_json_str() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.tag_name(root), Some("html"));

        let children: Vec<NodeId> = doc.element_children(root).collect();
        assert_eq!(children.len(), 2);
        let body = children[1];
        assert_eq!(doc.class_name(body), Some("app dark"));
        assert_eq!(doc.children(body).len(), 3);
        assert_eq!(doc.direct_text(body), "Hello");

        let main = doc.get_element_by_id("main").unwrap();
        assert_eq!(doc.attribute(main, "role"), Some("main"));
        assert_eq!(doc.style(main).unwrap().get("color"), Some("red"));
    }

    #[test]
    fn test_root_must_be_element() {
        let err = Document::from_json_str(r#"{ "text": "just text" }"#).unwrap_err();
        assert!(matches!(err, DomError::InvalidFixture(_)));
    }

    #[test]
    fn test_empty_tag_rejected() {
        let err = Document::from_json_str(r#"{ "tag": " " }"#).unwrap_err();
        assert!(matches!(err, DomError::InvalidFixture(_)));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Document::from_json_str("{"),
            Err(DomError::Json(_))
        ));
    }

    #[test]
    fn test_load_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PAGE.as_bytes()).unwrap();
        let doc = Document::load_fixture(file.path()).unwrap();
        assert_eq!(doc.elements().len(), 4);
    }

    #[test]
    fn test_builder_helpers() {
        let fixture = FixtureNode::element(
            "html",
            vec![FixtureNode::element("body", vec![FixtureNode::text("hi")])],
        );
        let doc = Document::from_fixture(&fixture).unwrap();
        assert_eq!(doc.elements().len(), 2);
    }
}
