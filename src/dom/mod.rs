//! Document collaborator.
//!
//! [`Document`] is the slice of a DOM the watermark needs: element and text
//! creation, inline styles, insertion/removal, and the rendered height query
//! used by the text probe. [`MemoryDocument`] is a headless implementation.

pub mod memory;

pub use memory::MemoryDocument;

use crate::error::Result;
use std::fmt;

/// Generational handle to a node of a [`Document`].
///
/// A handle goes stale when its node is removed; a later node may reuse the
/// slot but gets a new generation, so stale handles never alias it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Handle for slot `index` in its first generation.
    pub const fn new(index: u32) -> Self {
        Self::with_generation(index, 0)
    }

    pub const fn with_generation(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

pub trait Document {
    /// Default mount point (the page body).
    fn body(&self) -> NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId>;

    fn create_text_node(&mut self, text: &str) -> Result<NodeId>;

    /// Set an inline style property (CSS property name, e.g. `z-index`).
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Detach `child` from `parent`; fails if `child` is not a child of `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Rendered border-box height of an attached element, in CSS pixels.
    fn computed_height(&self, node: NodeId) -> Result<f64>;

    /// Detach `node` from its parent if it has one.
    fn detach(&mut self, node: NodeId) -> Result<()> {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Detach `node` and release it with its subtree; its handles go stale.
    ///
    /// Documents with garbage-collected nodes only need the detach.
    fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.detach(node)
    }
}
