//! The frame scheduler: owns the pipeline tree and drives it once per tick.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::node::{Node, NodeId};
use crate::pipeline::default_pipeline;
use crate::tree::NodePath;

/// Owner of the live frame pipeline.
///
/// Nodes inserted through the scheduler are remembered so they can be torn
/// down again with [`FrameScheduler::clear_inserted`]; inserted nodes are
/// otherwise never removed automatically. An insertion whose subtree repeats
/// an identity already in the pipeline is rejected, so every recorded
/// identity names exactly one node.
#[derive(Debug)]
pub struct FrameScheduler {
    root: Node,
    inserted: Vec<NodeId>,
    frame: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(default_pipeline())
    }
}

impl FrameScheduler {
    /// Create a scheduler over a custom pipeline.
    pub fn new(root: Node) -> Self {
        Self {
            root,
            inserted: Vec::new(),
            frame: 0,
        }
    }

    /// The pipeline root.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of ticks run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Identities inserted through this scheduler and not yet removed.
    pub fn inserted(&self) -> &[NodeId] {
        &self.inserted
    }

    /// Locate the first node with identity `id`.
    pub fn find(&self, id: &NodeId) -> Option<NodePath> {
        self.root.find(id)
    }

    /// Insert `node` immediately before the first `anchor` in the pipeline.
    pub fn insert_before(&mut self, node: Node, anchor: &NodeId) -> Result<NodePath, SchedulerError> {
        self.check_unique(&node)?;
        let id = node.id().clone();
        let path = self.root.insert_before(node, anchor)?;
        debug!("[Scheduler] Inserted {} before {} at {:?}", id, anchor, path.indices());
        self.inserted.push(id);
        Ok(path)
    }

    /// Insert `node` immediately after the first `anchor` in the pipeline.
    pub fn insert_after(&mut self, node: Node, anchor: &NodeId) -> Result<NodePath, SchedulerError> {
        self.check_unique(&node)?;
        let id = node.id().clone();
        let path = self.root.insert_after(node, anchor)?;
        debug!("[Scheduler] Inserted {} after {} at {:?}", id, anchor, path.indices());
        self.inserted.push(id);
        Ok(path)
    }

    fn check_unique(&self, node: &Node) -> Result<(), SchedulerError> {
        let existing: HashSet<&NodeId> = self.root.ids().into_iter().collect();
        match node.ids().into_iter().find(|id| existing.contains(id)) {
            Some(id) => Err(SchedulerError::DuplicateIdentity(id.clone())),
            None => Ok(()),
        }
    }

    /// Remove the first node with identity `id`.
    pub fn remove(&mut self, id: &NodeId) -> Result<Node, SchedulerError> {
        let removed = self.root.remove(id)?;
        if let Some(pos) = self.inserted.iter().position(|inserted| inserted == id) {
            self.inserted.remove(pos);
        }
        debug!("[Scheduler] Removed {}", id);
        Ok(removed)
    }

    /// Remove every node previously inserted through this scheduler.
    ///
    /// Returns how many nodes were removed. Identities that were already
    /// removed by other means are skipped.
    pub fn clear_inserted(&mut self) -> usize {
        let mut removed = 0;
        for id in std::mem::take(&mut self.inserted) {
            match self.root.remove(&id) {
                Ok(_) => removed += 1,
                Err(e) => warn!("[Scheduler] Could not clear inserted node: {}", e),
            }
        }
        if removed > 0 {
            info!("[Scheduler] Cleared {} inserted node(s)", removed);
        }
        removed
    }

    /// Run one frame: every callback in the pipeline, depth-first.
    pub fn tick(&mut self) {
        self.root.run();
        self.frame += 1;
    }

    /// Indented outline of the current pipeline.
    pub fn render(&self) -> String {
        self.root.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelinePhase;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_scheduler_uses_builtin_pipeline() {
        let scheduler = FrameScheduler::default();
        assert_eq!(scheduler.root(), &default_pipeline());
        assert_eq!(scheduler.frame(), 0);
        assert!(scheduler.inserted().is_empty());
    }

    #[test]
    fn test_insert_records_identity() {
        let mut scheduler = FrameScheduler::default();
        let anchor = PipelinePhase::ScriptRunUpdate.node_id();

        scheduler.insert_before(Node::new("mine"), &anchor).unwrap();
        scheduler.insert_after(Node::new("yours"), &anchor).unwrap();

        assert_eq!(
            scheduler.inserted(),
            &[NodeId::from_static("mine"), NodeId::from_static("yours")]
        );
    }

    #[test]
    fn test_failed_insert_is_not_recorded() {
        let mut scheduler = FrameScheduler::default();
        let before = scheduler.render();

        let result = scheduler.insert_before(Node::new("mine"), &NodeId::from_static("nowhere"));
        assert!(matches!(result, Err(SchedulerError::AnchorNotFound { .. })));
        assert!(scheduler.inserted().is_empty());
        assert_eq!(scheduler.render(), before);
    }

    #[test]
    fn test_clear_inserted_restores_pipeline() {
        let mut scheduler = FrameScheduler::default();
        let anchor = PipelinePhase::Update.node_id();

        scheduler
            .insert_before(Node::new("a").with_children(vec![Node::new("a1")]), &anchor)
            .unwrap();
        scheduler.insert_after(Node::new("b"), &anchor).unwrap();

        assert_eq!(scheduler.clear_inserted(), 2);
        assert_eq!(scheduler.root(), &default_pipeline());
        assert!(scheduler.inserted().is_empty());
    }

    #[test]
    fn test_insert_rejects_existing_identity() {
        let mut scheduler = FrameScheduler::default();
        let shadow = Node::new(PipelinePhase::ScriptRunUpdate.node_id()).with_update(|| {});

        let err = scheduler
            .insert_after(shadow, &PipelinePhase::ScriptRunDelayedTasks.node_id())
            .unwrap_err();

        assert_eq!(
            err,
            SchedulerError::DuplicateIdentity(PipelinePhase::ScriptRunUpdate.node_id())
        );
        assert!(scheduler.inserted().is_empty());
        assert_eq!(scheduler.clear_inserted(), 0);
        assert_eq!(scheduler.root(), &default_pipeline());
    }

    #[test]
    fn test_insert_rejects_identity_repeated_in_subtree() {
        let mut scheduler = FrameScheduler::default();
        let anchor = PipelinePhase::Update.node_id();
        scheduler.insert_before(Node::new("a"), &anchor).unwrap();

        let err = scheduler
            .insert_after(Node::new("b").with_children(vec![Node::new("a")]), &anchor)
            .unwrap_err();
        assert_eq!(err, SchedulerError::DuplicateIdentity(NodeId::from_static("a")));

        assert_eq!(scheduler.clear_inserted(), 1);
        assert_eq!(scheduler.root(), &default_pipeline());
    }

    #[test]
    fn test_remove_forgets_inserted_identity() {
        let mut scheduler = FrameScheduler::default();
        let anchor = PipelinePhase::Update.node_id();
        scheduler.insert_before(Node::new("a"), &anchor).unwrap();

        scheduler.remove(&NodeId::from_static("a")).unwrap();
        assert!(scheduler.inserted().is_empty());
        assert_eq!(scheduler.clear_inserted(), 0);
    }

    #[test]
    fn test_tick_runs_inserted_callbacks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut scheduler = FrameScheduler::default();

        scheduler
            .insert_before(
                Node::new("counter").with_update(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                &PipelinePhase::ScriptRunUpdate.node_id(),
            )
            .unwrap();

        scheduler.tick();
        scheduler.tick();
        scheduler.tick();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.frame(), 3);
    }
}
