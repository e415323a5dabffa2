// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Exporting the relief as STL
//! - Rendering a single snapshot
//! - Running the live frame loop

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tactile_picture::backends::{ImageRasterSource, RasterSource, load_raster};
use tactile_picture::constants::{DEFAULT_FRAME_INTERVAL, WATCH_POLL_INTERVAL};
use tactile_picture::frame_loop::{CommandSender, EventSourceController, LoopAction};
use tactile_picture::gpu::ReliefRenderer;
use tactile_picture::pipelines::export::{SolidModelWriter, StlExporter, save_export};
use tactile_picture::{Config, FrameLoop, FrameRenderer, SceneCommand, SceneState, storage};
use tracing::{info, warn};

/// Build the relief from two images and write it as STL
pub fn export(
    config: &Config,
    depth: &Path,
    color: &Path,
    output: Option<PathBuf>,
    binary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = SceneState::new(load_raster(depth)?, load_raster(color)?, config)?;
    println!(
        "Relief: {}x{} raster, {} triangles",
        scene.dimensions().0,
        scene.dimensions().1,
        scene.mesh().triangle_count()
    );

    let writer = StlExporter { binary };
    let path = save_export(scene.mesh(), &writer, &storage::resolve_export_path(output))?;

    println!("Model saved: {}", path.display());
    Ok(())
}

/// Render one frame offscreen and save it as PNG
pub fn snapshot(
    config: &Config,
    depth: &Path,
    color: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = SceneState::new(load_raster(depth)?, load_raster(color)?, config)?;
    let mut renderer = pollster::block_on(ReliefRenderer::new(&scene))?;
    println!("Rendering on: {}", renderer.device_info().adapter_name);

    let frame = renderer.render(&scene)?;
    let path = output.unwrap_or_else(|| storage::snapshot_path(Path::new(".")));
    storage::save_frame_png(&frame, &path)?;

    println!("Snapshot saved: {}", path.display());
    Ok(())
}

/// Run the frame loop until Ctrl+C or `quit`
pub fn view(
    config: Config,
    config_path: Option<PathBuf>,
    depth: PathBuf,
    color: PathBuf,
    fps: u32,
    binary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ImageRasterSource::new(depth, color);
    let (depth_raster, color_raster) = source.pair()?;
    let scene = SceneState::new(depth_raster, color_raster, &config)?;
    let renderer = pollster::block_on(ReliefRenderer::new(&scene))?;
    println!("Rendering on: {}", renderer.device_info().adapter_name);

    let writer: Box<dyn SolidModelWriter> = Box::new(StlExporter { binary });
    let (mut frame_loop, commands) =
        FrameLoop::new(scene, renderer, config, Box::new(source.clone()), writer);

    // Set up Ctrl+C handler
    let ctrlc_commands = commands.clone();
    ctrlc::set_handler(move || {
        ctrlc_commands.send(SceneCommand::Shutdown);
    })?;

    let _watcher = start_file_watcher(source, config_path, commands.clone());
    spawn_stdin_reader(commands);

    println!("Type 'refresh', 'export [PATH]' or 'quit' (Ctrl+C also stops)");

    let cadence = if fps == 0 {
        DEFAULT_FRAME_INTERVAL
    } else {
        Duration::from_secs_f64(1.0 / fps as f64)
    };
    frame_loop.run(cadence)?;

    println!("Rendered {} frames", frame_loop.frames_rendered());
    if let Some(path) = frame_loop.last_export() {
        println!("Last export: {}", path.display());
    }
    Ok(())
}

/// Poll the input images and config file, queueing a refresh or reconfigure on change
fn start_file_watcher(
    source: ImageRasterSource,
    config_path: Option<PathBuf>,
    commands: CommandSender,
) -> EventSourceController {
    let config_mtime = |path: &Option<PathBuf>| -> Option<SystemTime> {
        path.as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .and_then(|m| m.modified().ok())
    };

    let mut last_rasters = source.modified();
    let mut last_config = config_mtime(&config_path);

    EventSourceController::start("file-watcher", move || {
        std::thread::sleep(WATCH_POLL_INTERVAL);

        let rasters = source.modified();
        if rasters != last_rasters {
            last_rasters = rasters;
            info!("Input images changed");
            if !commands.send(SceneCommand::RefreshDepth) {
                return LoopAction::Stop;
            }
        }

        let config = config_mtime(&config_path);
        if config != last_config {
            last_config = config;
            if let Some(path) = config_path.as_deref() {
                match Config::load(path) {
                    Ok(config) => {
                        if !commands.send(SceneCommand::Reconfigure(config)) {
                            return LoopAction::Stop;
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring invalid configuration"),
                }
            }
        }

        LoopAction::Continue
    })
}

/// Read commands from stdin; the thread ends at EOF
fn spawn_stdin_reader(commands: CommandSender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();

            let command = match words.next() {
                Some("refresh") => SceneCommand::RefreshDepth,
                Some("export") => SceneCommand::Export {
                    path: storage::resolve_export_path(words.next().map(PathBuf::from)),
                },
                Some("quit") | Some("exit") => SceneCommand::Shutdown,
                Some(other) => {
                    println!("Unknown command: {}", other);
                    continue;
                }
                None => continue,
            };

            if !commands.send(command) {
                break;
            }
        }
    });
}
