//! Plain-text rendering of snapshots.

use std::fmt::Write;

use dominspect_protocols::SerializedElement;

/// Indented outline of `element`, `depth` levels deep. Subtrees cut off by
/// the depth limit are summarised by their element count.
///
/// ```text
/// main#content.card  /1/1  "Hello"
///   p  /1/1/0
///   ul  /1/1/1
///     … 3 elements
/// ```
pub fn render_tree(element: &SerializedElement, depth: usize) -> String {
    let mut out = String::new();
    render_node(&mut out, element, 0, depth);
    out
}

fn render_node(out: &mut String, element: &SerializedElement, level: usize, depth: usize) {
    let indent = "  ".repeat(level);
    let _ = write!(out, "{}{}  {}", indent, element.label(), element.path);
    if let Some(ref text) = element.text_content {
        let _ = write!(out, "  {:?}", text);
    }
    out.push('\n');

    if element.children.is_empty() {
        return;
    }
    if level >= depth {
        let hidden = element.subtree_size() - 1;
        let _ = writeln!(
            out,
            "{}  … {} element{}",
            indent,
            hidden,
            if hidden == 1 { "" } else { "s" }
        );
        return;
    }
    for child in &element.children {
        render_node(out, child, level + 1, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dominspect_protocols::ElementPath;

    fn sample() -> SerializedElement {
        let path = ElementPath::from_indices(vec![1, 1]);
        let mut main = SerializedElement::new("main", path.clone());
        main.id = Some("content".to_string());
        main.class_list = Some(vec!["card".to_string()]);
        main.text_content = Some("Hello".to_string());

        let p = SerializedElement::new("p", path.child(0));
        let mut ul = SerializedElement::new("ul", path.child(1));
        ul.children = (0..3)
            .map(|i| SerializedElement::new("li", path.child(1).child(i)))
            .collect();
        main.children = vec![p, ul];
        main
    }

    #[test]
    fn test_render_depth_limited() {
        let rendered = render_tree(&sample(), 1);
        assert_eq!(
            rendered,
            "main#content.card  /1/1  \"Hello\"\n  p  /1/1/0\n  ul  /1/1/1\n    … 3 elements\n"
        );
    }

    #[test]
    fn test_render_full() {
        let rendered = render_tree(&sample(), 5);
        assert_eq!(rendered.lines().count(), 6);
        assert!(rendered.ends_with("    li  /1/1/1/2\n"));
    }

    #[test]
    fn test_render_depth_zero() {
        let rendered = render_tree(&sample(), 0);
        assert_eq!(rendered.lines().nth(1), Some("  … 5 elements"));
    }
}
