//! Locating, splicing and removing nodes anywhere in the pipeline tree.
//!
//! All operations address nodes by identity and share one search order: a
//! node's direct children are scanned first, and only then is each child
//! searched recursively, left to right. The root itself is never a match;
//! it has no parent to splice into.

use crate::error::SchedulerError;
use crate::node::{Node, NodeId};

/// Child indices leading from the root to a node.
///
/// The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path to the root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Child indices, outermost first.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of edges between the root and the addressed node.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Position of the addressed node among its siblings.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the parent, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodePath> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Path of the sibling immediately after this node, whether or not it exists.
    #[must_use]
    pub fn next_sibling(&self) -> Option<NodePath> {
        let index = self.index()?;
        self.parent().map(|parent| parent.child(index + 1))
    }

    /// Path of the sibling immediately before this node.
    #[must_use]
    pub fn previous_sibling(&self) -> Option<NodePath> {
        let index = self.index()?.checked_sub(1)?;
        self.parent().map(|parent| parent.child(index))
    }

    /// Path of this node's child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Before,
    After,
}

impl Node {
    /// Locate the first node with identity `id` below this node.
    #[must_use]
    pub fn find(&self, id: &NodeId) -> Option<NodePath> {
        let mut path = Vec::new();
        search(self, id, &mut path).then_some(NodePath(path))
    }

    /// Whether any node below this one has identity `id`.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Node addressed by `path`, relative to this node.
    #[must_use]
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        path.indices()
            .iter()
            .try_fold(self, |node, &i| node.children().get(i))
    }

    fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        path.indices()
            .iter()
            .try_fold(self, |node, &i| node.children_mut().get_mut(i))
    }

    /// Insert `node` as the sibling immediately preceding the first `anchor`.
    ///
    /// Returns the path of the inserted node. On error the tree is unchanged.
    pub fn insert_before(&mut self, node: Node, anchor: &NodeId) -> Result<NodePath, SchedulerError> {
        self.insert_relative(node, anchor, Placement::Before)
    }

    /// Insert `node` as the sibling immediately following the first `anchor`.
    ///
    /// Returns the path of the inserted node. On error the tree is unchanged.
    pub fn insert_after(&mut self, node: Node, anchor: &NodeId) -> Result<NodePath, SchedulerError> {
        self.insert_relative(node, anchor, Placement::After)
    }

    /// Remove the first node with identity `id`, along with its subtree.
    pub fn remove(&mut self, id: &NodeId) -> Result<Node, SchedulerError> {
        let not_found = || SchedulerError::NodeNotFound(id.clone());

        let path = self.find(id).ok_or_else(not_found)?;
        let (parent_path, index) = split(&path).ok_or_else(not_found)?;
        let parent = self.node_at_mut(&parent_path).ok_or_else(not_found)?;

        Ok(parent.children_mut().remove(index))
    }

    fn insert_relative(
        &mut self,
        node: Node,
        anchor: &NodeId,
        placement: Placement,
    ) -> Result<NodePath, SchedulerError> {
        if node.id().is_empty() {
            return Err(SchedulerError::EmptyIdentity);
        }

        let not_found = || SchedulerError::AnchorNotFound {
            node: node.id().clone(),
            anchor: anchor.clone(),
        };

        let anchor_path = self.find(anchor).ok_or_else(not_found)?;
        let (parent_path, index) = split(&anchor_path).ok_or_else(not_found)?;
        let at = match placement {
            Placement::Before => index,
            Placement::After => index + 1,
        };

        let parent = self.node_at_mut(&parent_path).ok_or_else(not_found)?;
        parent.children_mut().insert(at, node);

        Ok(parent_path.child(at))
    }
}

fn split(path: &NodePath) -> Option<(NodePath, usize)> {
    Some((path.parent()?, path.index()?))
}

fn search(node: &Node, id: &NodeId, path: &mut Vec<usize>) -> bool {
    if let Some(i) = node.children().iter().position(|child| child.id() == id) {
        path.push(i);
        return true;
    }

    for (i, child) in node.children().iter().enumerate() {
        path.push(i);
        if search(child, id, path) {
            return true;
        }
        path.pop();
    }

    false
}
