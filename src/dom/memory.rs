//! Headless, arena-backed [`Document`].
//!
//! Nodes live in slots. `remove_node` frees a node and its subtree; freed
//! slots are reused with a bumped generation, so a long-lived document stays
//! bounded by its live nodes and stale handles resolve to nothing. Layout is
//! limited to what `computed_height` needs: a single line box per element
//! whose height comes from the element's (possibly inherited) font.

use super::{Document, NodeId};
use crate::error::{Result, WatermarkError};
use crate::font::{FontSpec, LineMetrics, RatioLineMetrics};

/// Font used when no ancestor sets one (the browser default).
const DEFAULT_FONT: &str = "16px serif";

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        /// Inline styles in insertion order
        style: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct MemoryDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    body: NodeId,
    line_metrics: Box<dyn LineMetrics>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.len())
            .field("slots", &self.slots.len())
            .field("body", &self.body)
            .finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create `<html><body></body></html>` with ratio-based line metrics.
    pub fn new() -> Self {
        Self::with_line_metrics(RatioLineMetrics::default())
    }

    /// Create a document whose text layout uses `metrics`, e.g. a `FontBook`.
    pub fn with_line_metrics(metrics: impl LineMetrics + 'static) -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0),
            body: NodeId::new(0),
            line_metrics: Box::new(metrics),
        };
        let root = doc.push(NodeKind::Element {
            tag: "html".to_string(),
            style: Vec::new(),
        });
        let body = doc.push(NodeKind::Element {
            tag: "body".to_string(),
            style: Vec::new(),
        });
        if let Some(n) = doc.get_mut(root) {
            n.children.push(body);
        }
        if let Some(n) = doc.get_mut(body) {
            n.parent = Some(root);
        }
        doc.root = root;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while `node` has not been removed.
    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Tag name of an element, `None` for text nodes and stale handles.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// True when `node` is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Serialize the document as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.write_html(self.root, &mut out);
        out.push('\n');
        out
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::with_generation(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index)
    }

    /// Free `id` and its descendants. The caller has already detached it.
    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index()) else {
                continue;
            };
            if slot.generation != current.generation() {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index() as u32);
            pending.extend(node.children);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| WatermarkError::Dom(format!("Unknown node {}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| WatermarkError::Dom(format!("Unknown node {}", id)))
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.get(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Nearest `font` style on `node` or an ancestor.
    fn inherited_font(&self, node: NodeId) -> FontSpec {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(font) = self.style(id, "font") {
                match FontSpec::parse(&font) {
                    Ok(spec) => return spec,
                    Err(e) => tracing::debug!(node = %id, error = %e, "Ignoring invalid font style"),
                }
            }
            current = self.parent(id);
        }
        FontSpec::parse(DEFAULT_FONT).unwrap_or_default()
    }

    fn line_height(&self, node: NodeId, font: &FontSpec) -> Result<f64> {
        if let Some(value) = self.style(node, "line-height") {
            if let Ok(multiplier) = value.parse::<f64>() {
                return Ok(multiplier * font.size_px);
            }
            if let Some(px) = parse_px(&value) {
                return Ok(px);
            }
        }
        match font.line_height_px {
            Some(px) => Ok(px),
            None => self.line_metrics.normal_line_height(font),
        }
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.get(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element { tag, style } => {
                out.push('<');
                out.push_str(tag);
                if !style.is_empty() {
                    let css: Vec<String> =
                        style.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                    out.push_str(" style=\"");
                    out.push_str(&escape(&css.join("; ")));
                    out.push('"');
                }
                out.push('>');
                for child in &n.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl Document for MemoryDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(WatermarkError::Dom(format!("Invalid tag name '{}'", tag)));
        }
        Ok(self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            style: Vec::new(),
        }))
    }

    fn create_text_node(&mut self, text: &str) -> Result<NodeId> {
        Ok(self.push(NodeKind::Text(text.to_string())))
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let n = self.node_mut(node)?;
        let NodeKind::Element { style, .. } = &mut n.kind else {
            return Err(WatermarkError::Dom(format!(
                "Cannot style text node {}",
                node
            )));
        };
        let property = property.trim().to_ascii_lowercase();
        match style.iter_mut().find(|(k, _)| *k == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => style.push((property, value.to_string())),
        }
        Ok(())
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let NodeKind::Element { style, .. } = &self.get(node)?.kind else {
            return None;
        };
        let property = property.trim().to_ascii_lowercase();
        style
            .iter()
            .find(|(k, _)| *k == property)
            .map(|(_, v)| v.clone())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !matches!(self.node(parent)?.kind, NodeKind::Element { .. }) {
            return Err(WatermarkError::Dom(format!(
                "Text node {} cannot have children",
                parent
            )));
        }
        self.node(child)?;

        // Refuse to create a cycle
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(WatermarkError::Dom(format!(
                    "Node {} is an ancestor of {}",
                    child, parent
                )));
            }
            ancestor = self.get(id).and_then(|n| n.parent);
        }

        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = siblings.iter().position(|c| *c == child).ok_or_else(|| {
            WatermarkError::Dom(format!("Node {} is not a child of {}", child, parent))
        })?;
        siblings.remove(position);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn computed_height(&self, node: NodeId) -> Result<f64> {
        if !matches!(self.node(node)?.kind, NodeKind::Element { .. }) {
            return Err(WatermarkError::Dom(format!(
                "Node {} is not an element",
                node
            )));
        }
        if !self.is_connected(node) {
            return Err(WatermarkError::Dom(format!(
                "Node {} is not attached to the document",
                node
            )));
        }
        if self.style(node, "display").as_deref() == Some("none") {
            return Ok(0.0);
        }
        if let Some(px) = self.style(node, "height").as_deref().and_then(parse_px) {
            return Ok(px);
        }
        if self.text_content(node).is_empty() {
            return Ok(0.0);
        }
        let font = self.inherited_font(node);
        self.line_height(node, &font)
    }

    fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root || node == self.body {
            return Err(WatermarkError::Dom(format!(
                "Cannot remove document node {}",
                node
            )));
        }
        // Already removed
        if self.get(node).is_none() {
            return Ok(());
        }
        self.detach(node)?;
        self.release(node);
        Ok(())
    }
}

fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim().strip_suffix("px")?.trim().parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
