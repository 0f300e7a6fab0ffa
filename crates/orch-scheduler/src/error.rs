//! Error types for the frame scheduler

use thiserror::Error;

use crate::node::NodeId;

/// Errors returned by tree mutations.
///
/// Every mutation is all-or-nothing: when one of these is returned the tree
/// has not been modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The anchor of a relative insertion does not exist in the tree.
    #[error("cannot insert {node} relative to {anchor}: {anchor} is not in the pipeline")]
    AnchorNotFound {
        /// Identity of the node that was being inserted.
        node: NodeId,
        /// Identity that was searched for.
        anchor: NodeId,
    },

    /// No node with this identity exists below the root.
    #[error("node {0} is not in the pipeline")]
    NodeNotFound(NodeId),

    /// A scheduler insertion would repeat an identity already in the pipeline.
    #[error("node {0} is already in the pipeline")]
    DuplicateIdentity(NodeId),

    /// Inserted nodes must carry a non-empty identity.
    #[error("inserted nodes must have a non-empty identity")]
    EmptyIdentity,
}
