//! # Frame Wiring
//!
//! Turns booted systems into scheduler nodes:
//!
//! ```text
//! frame
//! ├── ...
//! ├── update
//! │   ├── orchestrator-systems      ◄── inserted before the anchor phase
//! │   │   ├── audio *
//! │   │   └── input *
//! │   ├── update.script-run-update   (anchor)
//! │   └── ...
//! └── ...
//! ```
//!
//! Only `Running` systems get a node. When `halt_on_boot_failure` is set and
//! any system failed, nothing is inserted at all.

use std::sync::Arc;

use orch_scheduler::{FrameScheduler, Node, NodeId, PipelinePhase, SchedulerError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::boot::SequenceOutcome;
use crate::settings::OrchestratorSettings;
use crate::system::SystemHandle;

/// Identity of the synthetic parent node grouping every wired system.
pub const ORCHESTRATOR_SYSTEMS: NodeId = NodeId::from_static("orchestrator-systems");

/// What [`FrameWiring::wire`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WiringOutcome {
    /// The group node was inserted with one child per running system.
    Wired { systems: usize },
    /// Wiring was skipped because `failed` systems did not boot.
    Halted { failed: usize },
}

impl WiringOutcome {
    pub fn is_wired(&self) -> bool {
        matches!(self, Self::Wired { .. })
    }
}

/// Wiring policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameWiring {
    pub halt_on_boot_failure: bool,
    pub anchor: PipelinePhase,
}

impl FrameWiring {
    pub fn new(halt_on_boot_failure: bool, anchor: PipelinePhase) -> Self {
        Self {
            halt_on_boot_failure,
            anchor,
        }
    }

    pub fn from_settings(settings: &OrchestratorSettings) -> Self {
        Self::new(settings.halt_on_boot_failure, settings.anchor_phase)
    }

    /// The group node for `running`, one child per system in order.
    pub fn group(running: &[SystemHandle]) -> Node {
        let children = running
            .iter()
            .map(|handle| {
                let system = Arc::clone(handle.system());
                Node::new(handle.kind().node_id()).with_update(move || system.update())
            })
            .collect();
        Node::new(ORCHESTRATOR_SYSTEMS).with_children(children)
    }

    /// Insert the group node before the anchor phase, unless the policy says
    /// to halt.
    ///
    /// # Errors
    ///
    /// Fails if the anchor phase is missing from the pipeline. The scheduler
    /// is left untouched in that case.
    pub fn wire(
        &self,
        scheduler: &mut FrameScheduler,
        running: &[SystemHandle],
        outcome: SequenceOutcome,
    ) -> Result<WiringOutcome, SchedulerError> {
        if self.halt_on_boot_failure && outcome.has_failures() {
            error!(
                failed = outcome.failed,
                "[Wiring] Halted boot process due to boot failure; halt_on_boot_failure is enabled"
            );
            return Ok(WiringOutcome::Halted {
                failed: outcome.failed,
            });
        }

        let anchor = self.anchor.node_id();
        let path = scheduler.insert_before(Self::group(running), &anchor)?;
        info!(
            "[Wiring] Wired {} system(s) before {} at {:?}",
            running.len(),
            anchor,
            path.indices()
        );

        Ok(WiringOutcome::Wired {
            systems: running.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl System for Counter {
        fn update(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn outcome(succeeded: usize, failed: usize) -> SequenceOutcome {
        SequenceOutcome { succeeded, failed }
    }

    fn group_children(scheduler: &FrameScheduler) -> Option<Vec<String>> {
        let path = scheduler.find(&ORCHESTRATOR_SYSTEMS)?;
        let group = scheduler.root().node_at(&path)?;
        Some(group.children().iter().map(|n| n.id().to_string()).collect())
    }

    #[test]
    fn test_wires_before_anchor() {
        let mut scheduler = FrameScheduler::default();
        let running = vec![
            SystemHandle::new("a", Counter::default()),
            SystemHandle::new("c", Counter::default()),
        ];

        let wired = FrameWiring::default()
            .wire(&mut scheduler, &running, outcome(2, 1))
            .unwrap();

        assert_eq!(wired, WiringOutcome::Wired { systems: 2 });
        assert_eq!(group_children(&scheduler), Some(vec!["a".into(), "c".into()]));

        let group = scheduler.find(&ORCHESTRATOR_SYSTEMS).unwrap();
        let next = scheduler.root().node_at(&group.next_sibling().unwrap()).unwrap();
        assert_eq!(next.id(), &PipelinePhase::ScriptRunUpdate.node_id());
    }

    #[test]
    fn test_halt_leaves_scheduler_untouched() {
        let mut scheduler = FrameScheduler::default();
        let before = scheduler.render();
        let running = vec![SystemHandle::new("a", Counter::default())];

        let wiring = FrameWiring::new(true, PipelinePhase::ScriptRunUpdate);
        let result = wiring.wire(&mut scheduler, &running, outcome(1, 1)).unwrap();

        assert_eq!(result, WiringOutcome::Halted { failed: 1 });
        assert_eq!(scheduler.render(), before);
        assert!(scheduler.inserted().is_empty());
    }

    #[test]
    fn test_halt_without_failures_still_wires() {
        let mut scheduler = FrameScheduler::default();
        let running = vec![SystemHandle::new("a", Counter::default())];

        let wiring = FrameWiring::new(true, PipelinePhase::ScriptRunUpdate);
        let result = wiring.wire(&mut scheduler, &running, outcome(1, 0)).unwrap();
        assert!(result.is_wired());
    }

    #[test]
    fn test_custom_anchor() {
        let mut scheduler = FrameScheduler::default();
        let wiring = FrameWiring::new(false, PipelinePhase::PreLateUpdate);
        wiring.wire(&mut scheduler, &[], outcome(0, 0)).unwrap();

        let group = scheduler.find(&ORCHESTRATOR_SYSTEMS).unwrap();
        let next = scheduler.root().node_at(&group.next_sibling().unwrap()).unwrap();
        assert_eq!(next.id(), &PipelinePhase::PreLateUpdate.node_id());
    }

    #[test]
    fn test_missing_anchor_is_an_error() {
        let mut scheduler = FrameScheduler::new(Node::new("bare"));
        let err = FrameWiring::default()
            .wire(&mut scheduler, &[], outcome(0, 0))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::AnchorNotFound { .. }));
        assert_eq!(scheduler.root().count(), 1);
    }

    #[test]
    fn test_tick_runs_system_updates() {
        let mut scheduler = FrameScheduler::default();
        let counter = Arc::new(Counter::default());
        let running = vec![SystemHandle::from_arc("counter", Arc::clone(&counter))];

        FrameWiring::default()
            .wire(&mut scheduler, &running, outcome(1, 0))
            .unwrap();
        scheduler.tick();
        scheduler.tick();

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
