//! Fixed-rate headless simulation

use anyhow::{Context, Result};
use river_animation::{ClockSource, ManualClock};
use river_core::Vec3;
use river_scene::{CameraPose, DatasetProvider, RecordingBackend, RiverConfig, RiverScene};
use serde::Serialize;

pub struct SimulationOptions {
    pub duration_ms: f64,
    /// Camera direction applied at the halfway point
    pub nudge: Option<Vec3>,
}

#[derive(Debug, Serialize)]
pub struct SegmentSummary {
    pub slot: i32,
    pub offset: f32,
    pub opacity: f32,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub simulated_ms: f64,
    pub ticks: u64,
    pub rendered_frames: u64,
    pub cycles: u64,
    pub phase: String,
    pub footprint: f32,
    pub camera_path_ms: u64,
    pub camera: CameraPose,
    pub segments: Vec<SegmentSummary>,
}

/// Run the scene on a manual clock at the configured frame rate
pub fn simulate(
    dataset: &dyn DatasetProvider,
    config: &RiverConfig,
    options: &SimulationOptions,
) -> Result<RunSummary> {
    let clock = ManualClock::new(0.0);
    let mut scene = RiverScene::new(
        dataset,
        RecordingBackend::state_only(),
        clock.clone(),
        config,
    )
    .context("Failed to build scene")?;

    scene.start()?;

    let interval = config.clock.frame_interval_ms();
    let nudge_at = options.duration_ms / 2.0;
    let mut nudge = options.nudge;
    let mut ticks = 0u64;

    loop {
        let now = ticks as f64 * interval;
        if now > options.duration_ms {
            break;
        }
        clock.set(now);
        if now >= nudge_at {
            if let Some(direction) = nudge.take() {
                tracing::info!("Nudging camera towards {:?} at {:.0}ms", direction, now);
                scene.handle_input(direction);
            }
        }
        scene.frame()?;
        ticks += 1;
    }

    let choreographer = scene.choreographer();
    let ring = choreographer.ring();
    let summary = RunSummary {
        simulated_ms: clock.now_ms(),
        ticks,
        rendered_frames: scene.rendered_frames(),
        cycles: choreographer.cycle(),
        phase: format!("{:?}", choreographer.phase()),
        footprint: ring.footprint(),
        camera_path_ms: choreographer.camera_path().duration_ms(),
        camera: choreographer.camera_pose(),
        segments: ring
            .snapshot()
            .into_iter()
            .map(|(slot, transform)| SegmentSummary {
                slot,
                offset: transform.offset,
                opacity: transform.opacity,
            })
            .collect(),
    };

    scene.teardown();
    Ok(summary)
}
