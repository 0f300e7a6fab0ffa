//! Built-in frame pipeline and the phases systems can be anchored to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeId};

/// Identity of the pipeline root.
pub const ROOT: NodeId = NodeId::from_static("frame");

const INITIALIZATION: NodeId = NodeId::from_static("initialization");
const EARLY_UPDATE: NodeId = NodeId::from_static("early-update");
const FIXED_UPDATE: NodeId = NodeId::from_static("fixed-update");
const PRE_UPDATE: NodeId = NodeId::from_static("pre-update");
const UPDATE: NodeId = NodeId::from_static("update");
const PRE_LATE_UPDATE: NodeId = NodeId::from_static("pre-late-update");
const POST_LATE_UPDATE: NodeId = NodeId::from_static("post-late-update");

const TIME_UPDATE: NodeId = NodeId::from_static("initialization.time-update");
const POLL_EVENTS: NodeId = NodeId::from_static("early-update.poll-events");
const SCRIPT_RUN_FIXED_UPDATE: NodeId = NodeId::from_static("fixed-update.script-run-fixed-update");
const PHYSICS_SYNC: NodeId = NodeId::from_static("pre-update.physics-sync");
const SCRIPT_RUN_UPDATE: NodeId = NodeId::from_static("update.script-run-update");
const SCRIPT_RUN_DELAYED_TASKS: NodeId = NodeId::from_static("update.script-run-delayed-tasks");
const SCRIPT_RUN_LATE_UPDATE: NodeId = NodeId::from_static("pre-late-update.script-run-late-update");
const PRESENT: NodeId = NodeId::from_static("post-late-update.present");

/// A built-in pipeline phase that inserted nodes can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PipelinePhase {
    EarlyUpdate,
    FixedUpdate,
    ScriptRunFixedUpdate,
    PreUpdate,
    Update,
    /// Script update step inside `update`; the default anchor.
    #[default]
    ScriptRunUpdate,
    ScriptRunDelayedTasks,
    PreLateUpdate,
    ScriptRunLateUpdate,
    PostLateUpdate,
}

impl PipelinePhase {
    /// Identity of the phase node in the built-in pipeline.
    #[must_use]
    pub const fn node_id(self) -> NodeId {
        match self {
            Self::EarlyUpdate => EARLY_UPDATE,
            Self::FixedUpdate => FIXED_UPDATE,
            Self::ScriptRunFixedUpdate => SCRIPT_RUN_FIXED_UPDATE,
            Self::PreUpdate => PRE_UPDATE,
            Self::Update => UPDATE,
            Self::ScriptRunUpdate => SCRIPT_RUN_UPDATE,
            Self::ScriptRunDelayedTasks => SCRIPT_RUN_DELAYED_TASKS,
            Self::PreLateUpdate => PRE_LATE_UPDATE,
            Self::ScriptRunLateUpdate => SCRIPT_RUN_LATE_UPDATE,
            Self::PostLateUpdate => POST_LATE_UPDATE,
        }
    }

    /// Configuration name of the phase.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EarlyUpdate => "early-update",
            Self::FixedUpdate => "fixed-update",
            Self::ScriptRunFixedUpdate => "script-run-fixed-update",
            Self::PreUpdate => "pre-update",
            Self::Update => "update",
            Self::ScriptRunUpdate => "script-run-update",
            Self::ScriptRunDelayedTasks => "script-run-delayed-tasks",
            Self::PreLateUpdate => "pre-late-update",
            Self::ScriptRunLateUpdate => "script-run-late-update",
            Self::PostLateUpdate => "post-late-update",
        }
    }

    /// Every anchorable phase, in pipeline order.
    #[must_use]
    pub fn all() -> Vec<PipelinePhase> {
        vec![
            Self::EarlyUpdate,
            Self::FixedUpdate,
            Self::ScriptRunFixedUpdate,
            Self::PreUpdate,
            Self::Update,
            Self::ScriptRunUpdate,
            Self::ScriptRunDelayedTasks,
            Self::PreLateUpdate,
            Self::ScriptRunLateUpdate,
            Self::PostLateUpdate,
        ]
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PipelinePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::all()
            .into_iter()
            .find(|phase| phase.name() == wanted)
            .ok_or_else(|| format!("unknown pipeline phase '{s}'"))
    }
}

/// The built-in frame pipeline, without any callbacks.
///
/// Hosts drive their own work for the built-in phases; only nodes inserted
/// later carry callbacks.
#[must_use]
pub fn default_pipeline() -> Node {
    Node::new(ROOT).with_children(vec![
        Node::new(INITIALIZATION).with_children(vec![Node::new(TIME_UPDATE)]),
        Node::new(EARLY_UPDATE).with_children(vec![Node::new(POLL_EVENTS)]),
        Node::new(FIXED_UPDATE).with_children(vec![Node::new(SCRIPT_RUN_FIXED_UPDATE)]),
        Node::new(PRE_UPDATE).with_children(vec![Node::new(PHYSICS_SYNC)]),
        Node::new(UPDATE).with_children(vec![
            Node::new(SCRIPT_RUN_UPDATE),
            Node::new(SCRIPT_RUN_DELAYED_TASKS),
        ]),
        Node::new(PRE_LATE_UPDATE).with_children(vec![Node::new(SCRIPT_RUN_LATE_UPDATE)]),
        Node::new(POST_LATE_UPDATE).with_children(vec![Node::new(PRESENT)]),
    ])
}
