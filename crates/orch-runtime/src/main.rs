//! # Orchestrator Demo
//!
//! Boots two demo systems from the settings file in `ORCH_SETTINGS_DIR`
//! (default `./config`), drives the frame pipeline for `ORCH_FRAMES` ticks
//! (default 3), prints the status report, and tears the wiring down again.

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use orch_runtime::{Orchestrator, System, SystemError, SystemRegistry};
use orch_telemetry::{init_telemetry, TelemetryConfig};

const DEFAULT_SETTINGS_DIR: &str = "./config";
const DEFAULT_FRAMES: u64 = 3;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Counts the frames it has been updated in.
#[derive(Default)]
struct FrameCounter {
    frames: AtomicU64,
}

#[async_trait]
impl System for FrameCounter {
    fn update(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn ready(&self) {
        info!("[FrameCounter] Ready");
    }
}

/// Pretends to load assets before the first frame.
#[derive(Default)]
struct AssetWarmup;

#[async_trait]
impl System for AssetWarmup {
    async fn init(&self) -> Result<(), SystemError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        info!("[AssetWarmup] Assets loaded");
        Ok(())
    }
}

fn frames_from_env() -> Result<u64> {
    match env::var("ORCH_FRAMES") {
        Ok(val) => val
            .trim()
            .parse()
            .with_context(|| format!("ORCH_FRAMES must be a number of frames, got '{val}'")),
        Err(_) => Ok(DEFAULT_FRAMES),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let settings_dir = env::var("ORCH_SETTINGS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_DIR));
    let frames = frames_from_env()?;

    let mut registry = SystemRegistry::new();
    registry
        .register::<FrameCounter>("frame-counter")
        .register::<AssetWarmup>("asset-warmup");

    let orchestrator = Orchestrator::new(registry);
    let summary = orchestrator
        .boot_from_dir(&settings_dir)
        .await
        .with_context(|| format!("boot failed with settings from {}", settings_dir.display()))?;

    for skipped in &summary.skipped {
        info!("[Boot] Skipped: {}", skipped);
    }

    let scheduler = orchestrator.scheduler();
    info!("[Boot] Frame pipeline:\n{}", scheduler.read().render());

    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    for _ in 0..frames {
        interval.tick().await;
        scheduler.write().tick();
    }

    let session = orchestrator.session();
    if let Ok(counter) = session.get::<FrameCounter>() {
        info!(
            "[FrameCounter] Updated in {} of {} frame(s)",
            counter.frames.load(Ordering::Relaxed),
            scheduler.read().frame()
        );
    }

    let report =
        serde_json::to_string_pretty(&session.report()).context("failed to serialize status report")?;
    info!("[Boot] Status report:\n{}", report);

    orchestrator.shutdown();
    Ok(())
}
