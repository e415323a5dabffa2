// SPDX-License-Identifier: GPL-3.0-only

//! Frame loop and inbound scene commands
//!
//! The loop owns the [`SceneState`] exclusively. Everything that wants to
//! change the scene (file watcher, stdin reader, Ctrl-C handler) runs on its
//! own thread and only sends a [`SceneCommand`]. Each tick drains the queue
//! in arrival order and then submits exactly one frame, so a command is
//! always visible to the next frame after it is received.
//!
//! ```text
//!            ┌──────────── tick ────────────┐
//!   Idle ──▶ │ drain commands ─▶ Rendering  │ ──▶ Idle
//!            └──────────────────────────────┘
//!     │ Shutdown
//!     ▼
//!  Stopped
//! ```

use crate::backends::RasterSource;
use crate::config::Config;
use crate::errors::AppResult;
use crate::pipelines::capture::{CaptureSession, FrameSink};
use crate::pipelines::export::{SolidModelWriter, save_export};
use crate::scene::SceneState;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by a loop iteration to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Frame loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Between frames, accepting commands
    Idle,
    /// Submitting a frame
    Rendering,
    /// Shut down; no further frames
    Stopped,
}

/// Requests delivered to the loop between frames
pub enum SceneCommand {
    /// Re-read both rasters and run the depth refresh
    RefreshDepth,
    /// Write the current mesh to `path`
    Export { path: PathBuf },
    /// Replace the configuration
    Reconfigure(Config),
    /// Start forwarding rendered frames to a sink
    StartCapture(Box<dyn FrameSink>),
    /// End the active capture session
    StopCapture,
    /// Stop the loop
    Shutdown,
}

impl std::fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefreshDepth => write!(f, "RefreshDepth"),
            Self::Export { path } => f.debug_struct("Export").field("path", path).finish(),
            Self::Reconfigure(config) => f.debug_tuple("Reconfigure").field(config).finish(),
            Self::StartCapture(_) => write!(f, "StartCapture"),
            Self::StopCapture => write!(f, "StopCapture"),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Cloneable handle for sending commands into a running loop
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<SceneCommand>,
}

impl CommandSender {
    /// Queue a command; returns `false` once the loop is gone
    pub fn send(&self, command: SceneCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// One rendered RGBA8 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedFrame {
    /// Transparent frame of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            rgba: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }
}

/// Draws the scene to the output surface
pub trait FrameRenderer {
    fn render(&mut self, scene: &SceneState) -> AppResult<RenderedFrame>;
}

/// Single-threaded display loop over the scene
pub struct FrameLoop<R: FrameRenderer> {
    scene: SceneState,
    renderer: R,
    config: Config,
    source: Box<dyn RasterSource>,
    writer: Box<dyn SolidModelWriter>,
    capture: Option<CaptureSession>,
    commands: Receiver<SceneCommand>,
    state: LoopState,
    frames: u64,
    last_frame: Option<RenderedFrame>,
    last_export: Option<PathBuf>,
}

impl<R: FrameRenderer> FrameLoop<R> {
    /// Create the loop and the sender its event sources use
    pub fn new(
        scene: SceneState,
        renderer: R,
        config: Config,
        source: Box<dyn RasterSource>,
        writer: Box<dyn SolidModelWriter>,
    ) -> (Self, CommandSender) {
        let (tx, rx) = mpsc::channel();
        let frame_loop = Self {
            scene,
            renderer,
            config,
            source,
            writer,
            capture: None,
            commands: rx,
            state: LoopState::Idle,
            frames: 0,
            last_frame: None,
            last_export: None,
        };
        (frame_loop, CommandSender { tx })
    }

    /// Process queued commands, then render one frame
    ///
    /// Command failures are logged and do not stop the loop. A render
    /// failure is returned to the caller.
    pub fn tick(&mut self) -> AppResult<LoopAction> {
        if self.state == LoopState::Stopped {
            return Ok(LoopAction::Stop);
        }

        self.drain_commands();
        if self.state == LoopState::Stopped {
            return Ok(LoopAction::Stop);
        }

        self.state = LoopState::Rendering;
        self.scene.apply_frame_config(&self.config);
        let result = self.renderer.render(&self.scene);
        self.state = LoopState::Idle;

        let frame = result?;
        self.frames += 1;

        if let Some(session) = self.capture.as_mut() {
            if let Err(e) = session.commit(&frame) {
                warn!(error = %e, "Capture sink rejected frame, stopping capture");
                self.stop_capture();
            }
        }
        self.last_frame = Some(frame);

        Ok(LoopAction::Continue)
    }

    /// Tick at `cadence` until shut down
    pub fn run(&mut self, cadence: Duration) -> AppResult<()> {
        info!(cadence_ms = cadence.as_millis() as u64, "Frame loop started");

        loop {
            let started = Instant::now();
            if self.tick()? == LoopAction::Stop {
                break;
            }
            if let Some(rest) = cadence.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        info!(frames = self.frames, "Frame loop stopped");
        Ok(())
    }

    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    self.handle(command);
                    if self.state == LoopState::Stopped {
                        break;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn handle(&mut self, command: SceneCommand) {
        debug!(?command, "Handling scene command");

        match command {
            SceneCommand::RefreshDepth => self.refresh_depth(),
            SceneCommand::Export { path } => {
                match save_export(self.scene.mesh(), self.writer.as_ref(), &path) {
                    Ok(path) => self.last_export = Some(path),
                    Err(e) => warn!(path = %path.display(), error = %e, "Export failed"),
                }
            }
            SceneCommand::Reconfigure(config) => {
                debug!("Configuration replaced");
                self.config = config;
            }
            SceneCommand::StartCapture(sink) => {
                if self.capture.is_some() {
                    warn!("Capture already running");
                    return;
                }
                // Start logs the refusal itself
                if let Ok(session) = CaptureSession::start(&self.config, sink) {
                    self.capture = Some(session);
                }
            }
            SceneCommand::StopCapture => self.stop_capture(),
            SceneCommand::Shutdown => {
                info!("Shutdown requested");
                self.stop_capture();
                self.state = LoopState::Stopped;
            }
        }
    }

    fn refresh_depth(&mut self) {
        let (depth, color) = match self.source.pair() {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Depth refresh skipped, rasters unavailable");
                return;
            }
        };

        if let Err(e) = self.scene.refresh_depth(depth, color, &self.config) {
            warn!(error = %e, "Depth refresh rejected");
        }
    }

    fn stop_capture(&mut self) {
        if let Some(session) = self.capture.take() {
            if let Err(e) = session.stop() {
                warn!(error = %e, "Capture sink failed to finish");
            }
        }
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames successfully rendered
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn last_frame(&self) -> Option<&RenderedFrame> {
        self.last_frame.as_ref()
    }

    /// Path of the most recent successful export
    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }
}

/// Background thread feeding the frame loop
///
/// Runs `loop_fn` repeatedly until it returns [`LoopAction::Stop`] or the
/// controller is stopped. Dropping the controller stops and joins it.
pub struct EventSourceController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl EventSourceController {
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting event source");

        let thread_handle = thread::spawn(move || {
            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                if loop_fn() == LoopAction::Stop {
                    debug!(name = %name_clone, "Event source finished");
                    break;
                }
            }
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the thread to stop and wait for it
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Event source thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for EventSourceController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}
