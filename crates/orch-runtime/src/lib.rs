//! # Orchestrator Runtime
//!
//! Boots independently authored systems and wires them into the frame
//! pipeline.
//!
//! ## Boot Sequence
//!
//! ```text
//! settings (TOML)           SystemRegistry
//!      │                          │
//!      └──── [[systems]] ────────►│ materialize: skip disabled / unknown /
//!                                 │              duplicate / failing factories
//!                                 ▼
//!                          BootSession (Pending)
//!                                 │
//!                          BootSequencer ── join_all(init) ──► Starting
//!                                 │                               │
//!                                 │                     Running ◄─┴─► Failed
//!                                 ▼
//!              halt_on_boot_failure && failed > 0 ?
//!                     │ yes                 │ no
//!                     ▼                     ▼
//!               (inert, no nodes)    FrameWiring: one node per Running
//!                                    system under `orchestrator-systems`,
//!                                    inserted before the anchor phase
//! ```
//!
//! ## Modules
//!
//! - `system` - the `System` capability and type-erased `SystemHandle`
//! - `registry` - kind → factory map, materializes the configured list
//! - `settings` - TOML settings discovery and environment overrides
//! - `boot` - `BootSession` status table and the concurrent `BootSequencer`
//! - `wiring` - turns Running systems into scheduler nodes
//! - `orchestrator` - the top-level boot flow

#![warn(missing_docs)]
#![allow(missing_docs)] // TODO: Document the error enum variants and accessors

pub mod boot;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod system;
pub mod wiring;

pub use boot::{
    BootReport, BootSequencer, BootSession, BootStatus, LookupError, SequenceObserver,
    SequenceOutcome, SystemReport, SystemStatus,
};
pub use orchestrator::{BootError, BootSummary, Orchestrator, SharedScheduler};
pub use registry::{Materialized, RegistryError, SystemRegistry};
pub use settings::{ConfigError, OrchestratorSettings, SettingsLoader, SystemEntry};
pub use system::{System, SystemError, SystemHandle, SystemKind};
pub use wiring::{FrameWiring, WiringOutcome, ORCHESTRATOR_SYSTEMS};
