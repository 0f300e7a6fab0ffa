//! Pipeline nodes and their identities.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Per-frame callback attached to a node.
pub type UpdateFn = Arc<dyn Fn() + Send + Sync>;

/// Opaque node identity.
///
/// Identities are compared by value. Siblings may share an identity; the tree
/// never merges them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Cow<'static, str>);

impl NodeId {
    /// Identity backed by a static string (built-in phases, markers).
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Identity backed by an owned string (system kinds).
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?})", self.as_str())
    }
}

impl From<&'static str> for NodeId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// A node in the frame pipeline.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    update: Option<UpdateFn>,
    children: Vec<Node>,
}

impl Node {
    /// Create a node with no callback and no children.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            update: None,
            children: Vec::new(),
        }
    }

    /// Attach a per-frame callback.
    #[must_use]
    pub fn with_update<F>(mut self, update: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.update = Some(Arc::new(update));
        self
    }

    /// Attach an already shared callback.
    #[must_use]
    pub fn with_shared_update(mut self, update: UpdateFn) -> Self {
        self.update = Some(update);
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Append a child at the end of the child sequence.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Identity of this node.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Per-frame callback, if any.
    pub fn update(&self) -> Option<&UpdateFn> {
        self.update.as_ref()
    }

    /// Direct children, in execution order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Identities of the direct children, in order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<&NodeId> {
        self.children.iter().map(Node::id).collect()
    }

    /// Every identity in this subtree, `self` first, in pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut ids = vec![&self.id];
        for child in &self.children {
            ids.extend(child.ids());
        }
        ids
    }

    /// Run this node's callback, then every descendant's, depth-first.
    pub fn run(&self) {
        if let Some(update) = &self.update {
            update();
        }
        for child in &self.children {
            child.run();
        }
    }

    /// Indented outline of the subtree, one identity per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.id.as_str());
        if self.update.is_some() {
            out.push_str(" *");
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("has_update", &self.update.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Structural equality: identities, callback presence and children.
///
/// Callbacks themselves are opaque and only compared by pointer.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let same_update = match (&self.update, &other.update) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.id == other.id && same_update && self.children == other.children
    }
}
