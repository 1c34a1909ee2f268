//! Element subtree snapshots.

use dominspect_config::AgentConfig;
use dominspect_dom::{Document, NodeId};
use dominspect_protocols::{ElementPath, SerializedElement};

const ELLIPSIS: char = '…';

/// What goes into a snapshot besides tag, id, classes and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    pub include_text_content: bool,
    pub text_summary_max_chars: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for SerializeOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            include_text_content: config.include_text_content,
            text_summary_max_chars: config.text_summary_max_chars,
        }
    }
}

/// Snapshot `node` and its whole element subtree. `path` must be the node's
/// own path; children get `path + [index]`.
///
/// Read-only: the document is never touched.
pub fn serialize(
    doc: &Document,
    node: NodeId,
    path: ElementPath,
    options: &SerializeOptions,
) -> SerializedElement {
    let mut element = SerializedElement::new(doc.tag_name(node).unwrap_or_default(), path);

    element.id = doc
        .element_id(node)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    element.class_list = doc.class_name(node).and_then(class_list);
    if options.include_text_content {
        element.text_content = summarize(&doc.direct_text(node), options.text_summary_max_chars);
    }

    element.children = doc
        .element_children(node)
        .enumerate()
        .map(|(index, child)| serialize(doc, child, element.path.child(index as u32), options))
        .collect();
    element
}

fn class_list(class_attr: &str) -> Option<Vec<String>> {
    let mut classes: Vec<String> = Vec::new();
    for class in class_attr.split_ascii_whitespace() {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    (!classes.is_empty()).then_some(classes)
}

/// Collapse whitespace and cap the length; `None` for blank text.
fn summarize(text: &str, max_chars: usize) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || max_chars == 0 {
        return None;
    }
    if collapsed.chars().count() <= max_chars {
        return Some(collapsed);
    }
    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push(ELLIPSIS);
    Some(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::resolve;

    const PAGE: &str = r#"{ "tag": "html", "children": [
        { "tag": "body", "children": [
            { "tag": "DIV", "id": "main", "class": " card  wide card ", "children": [
                { "text": "  Hello\n   world  " },
                { "tag": "span", "id": "", "class": "   " },
                { "comment": "not a child" },
                { "tag": "ul", "children": [ { "tag": "li" }, { "tag": "li" } ] }
            ] }
        ] }
    ] }"#;

    fn main_node(doc: &Document) -> (NodeId, ElementPath) {
        let path = ElementPath::from_indices(vec![0, 0]);
        (resolve(doc, &path).unwrap(), path)
    }

    #[test]
    fn test_serialize_fields() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let (node, path) = main_node(&doc);
        let element = serialize(&doc, node, path.clone(), &SerializeOptions::default());

        assert_eq!(element.tag_name, "div");
        assert_eq!(element.id.as_deref(), Some("main"));
        assert_eq!(
            element.class_list,
            Some(vec!["card".to_string(), "wide".to_string()])
        );
        assert_eq!(element.text_content.as_deref(), Some("Hello world"));
        assert_eq!(element.path, path);
    }

    #[test]
    fn test_children_are_elements_with_extended_paths() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let (node, path) = main_node(&doc);
        let element = serialize(&doc, node, path, &SerializeOptions::default());

        assert_eq!(element.child_count(), 2);
        let span = &element.children[0];
        assert_eq!(span.tag_name, "span");
        assert_eq!(span.id, None);
        assert_eq!(span.class_list, None);
        assert_eq!(span.text_content, None);
        assert_eq!(span.path, ElementPath::from_indices(vec![0, 0, 0]));

        let ul = &element.children[1];
        assert_eq!(ul.children[1].path, ElementPath::from_indices(vec![0, 0, 1, 1]));
        assert_eq!(element.subtree_size(), 5);
    }

    #[test]
    fn test_every_child_path_resolves() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let root = doc.root_element().unwrap();
        let snapshot = serialize(&doc, root, ElementPath::root(), &SerializeOptions::default());

        fn walk(doc: &Document, element: &SerializedElement) {
            let node = resolve(doc, &element.path).unwrap();
            assert_eq!(doc.tag_name(node), Some(element.tag_name.as_str()));
            for child in &element.children {
                walk(doc, child);
            }
        }
        walk(&doc, &snapshot);
    }

    #[test]
    fn test_text_content_disabled() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let (node, path) = main_node(&doc);
        let options = SerializeOptions {
            include_text_content: false,
            ..SerializeOptions::default()
        };
        assert_eq!(serialize(&doc, node, path, &options).text_content, None);
    }

    #[test]
    fn test_summarize_truncates() {
        assert_eq!(summarize("abcdef", 3).as_deref(), Some("abc…"));
        assert_eq!(summarize("ab   cdef", 3).as_deref(), Some("ab…"));
        assert_eq!(summarize("abc", 3).as_deref(), Some("abc"));
        assert_eq!(summarize(" \n\t ", 10), None);
        assert_eq!(summarize("abc", 0), None);
    }

    #[test]
    fn test_serialize_does_not_mutate() {
        let doc = Document::from_json_str(PAGE).unwrap();
        let before = format!("{:?}", doc);
        let root = doc.root_element().unwrap();
        serialize(&doc, root, ElementPath::root(), &SerializeOptions::default());
        assert_eq!(format!("{:?}", doc), before);
    }
}
