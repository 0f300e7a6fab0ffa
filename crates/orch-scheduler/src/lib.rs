//! # Orch Scheduler
//!
//! The per-frame execution pipeline, modeled as an ordered tree of named
//! nodes.
//!
//! ## Structure
//!
//! ```text
//! frame
//! ├── initialization
//! ├── early-update
//! ├── fixed-update
//! ├── pre-update
//! ├── update
//! │   ├── orchestrator-systems      <- inserted by wiring
//! │   │   ├── audio
//! │   │   └── input
//! │   ├── update.script-run-update  <- anchor
//! │   └── update.script-run-delayed-tasks
//! ├── pre-late-update
//! └── post-late-update
//! ```
//!
//! - `Node`: identity, optional per-frame callback, ordered children
//! - `NodePath`: child indices from the root to a located node
//! - `FrameScheduler`: owns the root, ticks it, and remembers what it inserted
//!
//! ## Search Order
//!
//! Lookups scan a node's direct children before descending, then recurse into
//! the children left-to-right. The first match wins. Insert and remove both use
//! this order. `FrameScheduler` refuses insertions that would repeat an
//! identity, so removing an identity it inserted always undoes that insertion.

#![warn(missing_docs)]

pub mod error;
pub mod node;
pub mod pipeline;
pub mod scheduler;
pub mod tree;

pub use error::SchedulerError;
pub use node::{Node, NodeId, UpdateFn};
pub use pipeline::{default_pipeline, PipelinePhase, ROOT};
pub use scheduler::FrameScheduler;
pub use tree::NodePath;
