//! Highlight and preview outlines.
//!
//! At most one element is highlighted (the selection) and at most one is
//! previewed (the hover target), and never the same element for both. Each
//! marked element remembers the inline `outline` / `outline-offset` it had
//! before, so clearing a mark leaves the page exactly as it was.

use dominspect_config::HighlightConfig;
use dominspect_dom::{Document, NodeId, ScrollBehavior, ScrollBlock, ScrollOptions};
use tracing::{debug, trace};

#[cfg(test)]
#[path = "highlight_tests.rs"]
mod tests;

const OUTLINE: &str = "outline";
const OUTLINE_OFFSET: &str = "outline-offset";

/// Inline style values for the two roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treatment {
    pub highlight_outline: String,
    pub preview_outline: String,
    pub outline_offset: String,
}

impl Default for Treatment {
    fn default() -> Self {
        Self::from(&HighlightConfig::default())
    }
}

impl From<&HighlightConfig> for Treatment {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            highlight_outline: config.highlight_outline(),
            preview_outline: config.preview_outline(),
            outline_offset: config.outline_offset(),
        }
    }
}

#[derive(Debug, Clone)]
struct Marked {
    node: NodeId,
    saved_outline: Option<String>,
    saved_offset: Option<String>,
}

impl Marked {
    fn capture(doc: &Document, node: NodeId) -> Self {
        let style = doc.style(node);
        Self {
            node,
            saved_outline: style.and_then(|s| s.get(OUTLINE)).map(str::to_string),
            saved_offset: style.and_then(|s| s.get(OUTLINE_OFFSET)).map(str::to_string),
        }
    }

    fn restore(self, doc: &mut Document) {
        if let Some(style) = doc.style_mut(self.node) {
            style.restore(OUTLINE, self.saved_outline);
            style.restore(OUTLINE_OFFSET, self.saved_offset);
        }
    }
}

/// Highlight/preview state machine for one inspection session.
#[derive(Debug, Default)]
pub struct Highlighter {
    treatment: Treatment,
    highlighted: Option<Marked>,
    previewed: Option<Marked>,
}

impl Highlighter {
    pub fn new(treatment: Treatment) -> Self {
        Self {
            treatment,
            highlighted: None,
            previewed: None,
        }
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted.as_ref().map(|m| m.node)
    }

    pub fn previewed(&self) -> Option<NodeId> {
        self.previewed.as_ref().map(|m| m.node)
    }

    /// Make `node` the selection and scroll it into view.
    ///
    /// Returns `false` when nothing changed: the node is already highlighted
    /// or is no longer attached.
    pub fn apply_highlight(&mut self, doc: &mut Document, node: NodeId) -> bool {
        if !is_attached_element(doc, node) {
            trace!("Highlight target {:?} is not attached", node);
            return false;
        }
        if self.highlighted() == Some(node) {
            return false;
        }

        self.drop_preview(doc);
        if let Some(previous) = self.highlighted.take() {
            previous.restore(doc);
        }

        let marked = Marked::capture(doc, node);
        paint(doc, node, &self.treatment.highlight_outline, &self.treatment.outline_offset);
        self.highlighted = Some(marked);
        doc.scroll_into_view(
            node,
            ScrollOptions {
                block: ScrollBlock::Nearest,
                behavior: ScrollBehavior::Smooth,
            },
        );
        debug!("Highlighted node {}", node.index());
        true
    }

    /// Preview `node` (hover). Hovering the highlighted node only clears any
    /// other preview.
    pub fn apply_preview(&mut self, doc: &mut Document, node: NodeId) -> bool {
        if !is_attached_element(doc, node) {
            trace!("Preview target {:?} is not attached", node);
            return false;
        }
        if self.previewed() == Some(node) {
            return false;
        }
        if self.highlighted() == Some(node) {
            self.drop_preview(doc);
            return false;
        }

        self.drop_preview(doc);
        let marked = Marked::capture(doc, node);
        paint(doc, node, &self.treatment.preview_outline, &self.treatment.outline_offset);
        self.previewed = Some(marked);
        trace!("Previewing node {}", node.index());
        true
    }

    /// Remove the preview and make sure the highlight, if any, still shows.
    pub fn clear_preview(&mut self, doc: &mut Document) {
        self.drop_preview(doc);
        if let Some(ref marked) = self.highlighted {
            if is_attached_element(doc, marked.node) {
                paint(
                    doc,
                    marked.node,
                    &self.treatment.highlight_outline,
                    &self.treatment.outline_offset,
                );
            }
        }
    }

    /// Remove both marks, restoring the original inline outline properties.
    pub fn clear_all(&mut self, doc: &mut Document) {
        self.drop_preview(doc);
        if let Some(marked) = self.highlighted.take() {
            marked.restore(doc);
        }
    }

    /// Reapply the highlight treatment if something stripped it. Returns
    /// whether a repair was needed.
    pub fn ensure_highlight_present(&mut self, doc: &mut Document) -> bool {
        let Some(ref marked) = self.highlighted else {
            return false;
        };
        if !is_attached_element(doc, marked.node) {
            return false;
        }
        let intact = doc.style(marked.node).is_some_and(|style| {
            style.get(OUTLINE) == Some(self.treatment.highlight_outline.as_str())
                && style.get(OUTLINE_OFFSET) == Some(self.treatment.outline_offset.as_str())
        });
        if intact {
            return false;
        }
        paint(
            doc,
            marked.node,
            &self.treatment.highlight_outline,
            &self.treatment.outline_offset,
        );
        true
    }

    fn drop_preview(&mut self, doc: &mut Document) {
        if let Some(marked) = self.previewed.take() {
            marked.restore(doc);
        }
    }
}

fn is_attached_element(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node) && doc.is_connected(node)
}

fn paint(doc: &mut Document, node: NodeId, outline: &str, offset: &str) {
    if let Some(style) = doc.style_mut(node) {
        style.set(OUTLINE, outline);
        style.set(OUTLINE_OFFSET, offset);
    }
}
