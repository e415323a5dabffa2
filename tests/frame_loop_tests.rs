// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the frame loop and scene commands

use std::sync::{Arc, Mutex};
use tactile_picture::backends::{MemoryRasterSource, RasterSource};
use tactile_picture::errors::{AppError, AppResult};
use tactile_picture::frame_loop::{CommandSender, LoopAction, LoopState};
use tactile_picture::pipelines::capture::FrameSink;
use tactile_picture::{
    Config, FrameLoop, FrameRenderer, Raster, RenderedFrame, SceneCommand, SceneState, StlExporter,
};

/// What the renderer observed for one frame
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    triangles: usize,
    first_z: f32,
    background_visible: bool,
}

#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<Observed>,
}

impl FrameRenderer for RecordingRenderer {
    fn render(&mut self, scene: &SceneState) -> AppResult<RenderedFrame> {
        self.frames.push(Observed {
            triangles: scene.mesh().triangle_count(),
            first_z: scene.mesh().positions()[0][2],
            background_visible: scene.background().visible,
        });
        Ok(RenderedFrame::blank(2, 2))
    }
}

/// Source whose rasters the test swaps between ticks
#[derive(Clone)]
struct SharedSource(Arc<Mutex<Option<(Raster, Raster)>>>);

impl RasterSource for SharedSource {
    fn depth(&mut self) -> AppResult<Raster> {
        let pair = self.0.lock().unwrap();
        pair.as_ref()
            .map(|(depth, _)| depth.clone())
            .ok_or_else(|| AppError::Other("depth unavailable".into()))
    }

    fn color(&mut self) -> AppResult<Raster> {
        let pair = self.0.lock().unwrap();
        pair.as_ref()
            .map(|(_, color)| color.clone())
            .ok_or_else(|| AppError::Other("color unavailable".into()))
    }
}

struct CountingSink(Arc<Mutex<u32>>);

impl FrameSink for CountingSink {
    fn commit(&mut self, _frame: &RenderedFrame) -> AppResult<()> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

fn flat(value: u8) -> Raster {
    Raster::from_fn(6, 5, |_, _| [value, 0, 0, 255])
}

fn make_loop(source: Box<dyn RasterSource>) -> (FrameLoop<RecordingRenderer>, CommandSender) {
    let config = Config::default();
    let scene = SceneState::new(flat(200), flat(0), &config).unwrap();
    FrameLoop::new(
        scene,
        RecordingRenderer::default(),
        config,
        source,
        Box::new(StlExporter::ascii()),
    )
}

#[test]
fn test_refresh_visible_to_next_frame() {
    let shared = SharedSource(Arc::new(Mutex::new(Some((flat(0), flat(0))))));
    let (mut frame_loop, tx) = make_loop(Box::new(shared));

    frame_loop.tick().unwrap();
    assert!(tx.send(SceneCommand::RefreshDepth));
    frame_loop.tick().unwrap();

    let frames = &frame_loop.renderer().frames;
    assert!(frames[0].triangles > 0);
    assert_eq!(frames[1].triangles, 0);
}

#[test]
fn test_commands_apply_in_arrival_order() {
    let source = MemoryRasterSource::new(flat(200), flat(0));
    let (mut frame_loop, tx) = make_loop(Box::new(source));

    frame_loop.tick().unwrap();
    let base_z = frame_loop.renderer().frames[0].first_z;

    // Reconfigure lands before the refresh, so the refresh sees depthScale 2
    tx.send(SceneCommand::Reconfigure(Config {
        depth_scale: 2.0,
        show_background_pic: false,
        ..Default::default()
    }));
    tx.send(SceneCommand::RefreshDepth);
    frame_loop.tick().unwrap();

    let second = &frame_loop.renderer().frames[1];
    assert!((second.first_z - 2.0 * base_z).abs() < 1e-5);
    assert!(!second.background_visible);
}

#[test]
fn test_unavailable_source_keeps_mesh() {
    let shared = SharedSource(Arc::new(Mutex::new(None)));
    let (mut frame_loop, tx) = make_loop(Box::new(shared));
    let before = frame_loop.scene().mesh().clone();

    tx.send(SceneCommand::RefreshDepth);
    assert_eq!(frame_loop.tick().unwrap(), LoopAction::Continue);
    assert_eq!(frame_loop.scene().mesh(), &before);
    assert_eq!(frame_loop.frames_rendered(), 1);
}

#[test]
fn test_resized_source_is_rejected() {
    let big = Raster::from_fn(7, 5, |_, _| [0, 0, 0, 255]);
    let source = MemoryRasterSource::new(big.clone(), big);
    let (mut frame_loop, tx) = make_loop(Box::new(source));
    let before = frame_loop.scene().mesh().clone();

    tx.send(SceneCommand::RefreshDepth);
    frame_loop.tick().unwrap();
    assert_eq!(frame_loop.scene().mesh(), &before);
}

#[test]
fn test_export_command() {
    let dir = std::env::temp_dir().join(format!("tactile-picture-loop-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let source = MemoryRasterSource::new(flat(200), flat(0));
    let (mut frame_loop, tx) = make_loop(Box::new(source));

    // A failing export is logged and the loop carries on
    tx.send(SceneCommand::Export {
        path: blocker.join("picture3D.stl"),
    });
    assert_eq!(frame_loop.tick().unwrap(), LoopAction::Continue);
    assert!(frame_loop.last_export().is_none());

    let path = dir.join("picture3D.stl");
    tx.send(SceneCommand::Export { path: path.clone() });
    frame_loop.tick().unwrap();
    assert_eq!(frame_loop.last_export(), Some(&path));
    assert!(std::fs::read_to_string(&path).unwrap().starts_with("solid exported"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_capture_requires_auto_animation() {
    let source = MemoryRasterSource::new(flat(200), flat(0));
    let (mut frame_loop, tx) = make_loop(Box::new(source));
    let count = Arc::new(Mutex::new(0));

    tx.send(SceneCommand::StartCapture(Box::new(CountingSink(count.clone()))));
    frame_loop.tick().unwrap();
    assert!(!frame_loop.is_capturing());
    assert_eq!(*count.lock().unwrap(), 0);

    tx.send(SceneCommand::Reconfigure(Config {
        auto_animation: true,
        ..Default::default()
    }));
    tx.send(SceneCommand::StartCapture(Box::new(CountingSink(count.clone()))));
    frame_loop.tick().unwrap();
    frame_loop.tick().unwrap();
    assert!(frame_loop.is_capturing());
    assert_eq!(*count.lock().unwrap(), 2);

    tx.send(SceneCommand::StopCapture);
    frame_loop.tick().unwrap();
    assert!(!frame_loop.is_capturing());
    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn test_run_until_shutdown() {
    let source = MemoryRasterSource::new(flat(200), flat(0));
    let (mut frame_loop, tx) = make_loop(Box::new(source));

    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        tx.send(SceneCommand::Shutdown);
    });

    frame_loop.run(std::time::Duration::from_millis(1)).unwrap();
    handle.join().unwrap();

    assert_eq!(frame_loop.state(), LoopState::Stopped);
    assert!(frame_loop.frames_rendered() > 0);
    assert_eq!(frame_loop.tick().unwrap(), LoopAction::Stop);
}
