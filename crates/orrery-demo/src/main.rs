//! Drives the Orrery worker pool over a synthetic scene.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p orrery-demo -- --clusters 50000 --polarity refine`.

mod scene;

use std::collections::HashSet;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use orrery_config::{CliArgs, Config, ConfigError, default_config_dir};
use orrery_dispatch::protocol::{ComputeErrors, FrustumCull, SelectLods, SimplifyGeometry};
use orrery_dispatch::{
    Completion, DispatchError, DispatchSettings, Request, Response, TaskDispatcher, TaskTicket,
};
use orrery_lod::LodLevel;
use orrery_math::{CameraError, Viewport};
use orrery_spatial::GridError;
use tracing::{info, warn};

use crate::scene::{Scene, camera_at, cull_objects, frustum_for, grid_mesh};

const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;
/// Quads per side of the mesh handed to the simplifier.
const MESH_RESOLUTION: u32 = 64;
/// How long the driver waits for one frame's responses.
const FRAME_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("viewport: {0}")]
    Viewport(#[from] CameraError),

    #[error("scene: {0}")]
    Grid(#[from] GridError),

    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("frame {frame}: {missing} responses still outstanding at the deadline")]
    Timeout { frame: u32, missing: usize },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    orrery_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), DemoError> {
    config.spatial.validate()?;
    let selector = config.lod.selector()?;
    let viewport = Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)?;

    let started = Instant::now();
    let scene = Scene::generate(&config.scene, config.spatial.cell_size)?;
    info!(
        clusters = scene.clusters.len(),
        cells = scene.grid.cell_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scene generated"
    );

    let mut dispatcher = TaskDispatcher::new(
        DispatchSettings {
            worker_count: config.dispatch.worker_count,
            max_in_flight: config.dispatch.max_in_flight,
        },
        selector,
    )?;

    let (mesh_vertices, mesh_indices) = grid_mesh(MESH_RESOLUTION);
    let view_radius = scene.extent * 0.5;
    let frames = config.scene.frames.max(1);

    for frame in 0..frames {
        let t = if frames > 1 {
            f64::from(frame) / f64::from(frames - 1)
        } else {
            0.5
        };
        let camera = camera_at(scene.extent, t);
        let candidates = scene.candidates(camera.position, view_radius)?;
        let frustum = frustum_for(&camera, viewport, view_radius);

        let requests = [
            Request::SelectLods(SelectLods {
                clusters: candidates.clone(),
                camera,
                viewport_width: viewport.width,
                viewport_height: viewport.height,
                error_threshold: config.lod.error_threshold,
            }),
            Request::ComputeErrors(ComputeErrors {
                clusters: candidates.clone(),
                camera,
                viewport_height: viewport.height,
            }),
            Request::FrustumCull(FrustumCull {
                objects: cull_objects(&candidates),
                frustum_planes: frustum.planes,
            }),
            Request::SimplifyGeometry(SimplifyGeometry {
                vertices: mesh_vertices.clone(),
                indices: mesh_indices.clone(),
                target_ratio: 1.0 / f64::from(frame + 2),
            }),
        ];

        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            let kind = request.kind();
            match dispatcher.submit(request) {
                Ok(ticket) => pending.push(ticket),
                Err(DispatchError::Saturated { budget }) => {
                    warn!(frame, %kind, budget, "pool saturated, request skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            frame,
            candidates = candidates.len(),
            submitted = pending.len(),
            "frame submitted"
        );
        for completion in await_frame(&dispatcher, frame, &pending)? {
            report(frame, &completion);
        }
    }

    dispatcher.shutdown();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "demo complete"
    );
    Ok(())
}

/// Poll until every ticket in `pending` has completed or the frame deadline passes.
fn await_frame(
    dispatcher: &TaskDispatcher,
    frame: u32,
    pending: &[TaskTicket],
) -> Result<Vec<Completion>, DemoError> {
    let mut outstanding: HashSet<TaskTicket> = pending.iter().copied().collect();
    let mut received = Vec::with_capacity(pending.len());
    let deadline = Instant::now() + FRAME_TIMEOUT;

    loop {
        for completion in dispatcher.drain_completions() {
            if outstanding.remove(&completion.ticket) {
                received.push(completion);
            }
        }
        if outstanding.is_empty() {
            return Ok(received);
        }
        if Instant::now() >= deadline {
            return Err(DemoError::Timeout {
                frame,
                missing: outstanding.len(),
            });
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn report(frame: u32, completion: &Completion) {
    let ticket = completion.ticket.value();
    let worker = completion.worker;
    match &completion.response {
        Response::LodSelectionComplete { results } => {
            let mut histogram = [0usize; LodLevel::COUNT];
            for result in results {
                histogram[result.level.value() as usize] += 1;
            }
            let triangles: u64 = results.iter().map(|r| u64::from(r.triangle_count)).sum();
            info!(frame, ticket, worker, selected = results.len(), ?histogram, triangles, "LOD selection complete");
        }
        Response::ErrorComputationComplete { errors } => {
            let finite: Vec<f64> = errors.iter().copied().filter(|e| e.is_finite()).collect();
            let max_error = finite.iter().copied().fold(0.0, f64::max);
            let mean_error = if finite.is_empty() {
                0.0
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            };
            info!(frame, ticket, worker, count = errors.len(), max_error, mean_error, "error computation complete");
        }
        Response::FrustumCullComplete(outcome) => {
            info!(
                frame,
                ticket,
                worker,
                visible = outcome.visible.len(),
                culled = outcome.culled.len(),
                "frustum cull complete"
            );
        }
        Response::SimplificationComplete(mesh) => {
            info!(
                frame,
                ticket,
                worker,
                triangles = mesh.triangle_count(),
                vertices = mesh.vertex_count(),
                "simplification complete"
            );
        }
    }
}
