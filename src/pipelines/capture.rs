// SPDX-License-Identifier: GPL-3.0-only

//! Frame capture hand-off
//!
//! Encoding rendered frames is left to an external [`FrameSink`]. This module
//! only enforces the start precondition (the camera must be orbiting on its
//! own) and forwards each rendered frame while a session is active.

use crate::config::Config;
use crate::errors::{AppResult, CaptureError};
use crate::frame_loop::RenderedFrame;
use tracing::{info, warn};

/// Consumer of rendered frames (video encoder, image sequence writer, ...)
pub trait FrameSink: Send {
    /// Receive one rendered frame
    fn commit(&mut self, frame: &RenderedFrame) -> AppResult<()>;

    /// Called once when the session ends
    fn finish(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Active capture session
pub struct CaptureSession {
    sink: Box<dyn FrameSink>,
    initial_theta: f64,
    frames: u64,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("initial_theta", &self.initial_theta)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Start capturing into `sink`
    ///
    /// Refused unless `autoAnimation` is on; nothing is started in that case.
    pub fn start(config: &Config, sink: Box<dyn FrameSink>) -> Result<Self, CaptureError> {
        if !config.auto_animation {
            warn!("{}", CaptureError::AutoAnimationDisabled);
            return Err(CaptureError::AutoAnimationDisabled);
        }

        let now_ms = chrono::Utc::now().timestamp_millis() as f64;
        let initial_theta = now_ms * config.camera_speed as f64;
        info!(initial_theta, "Capture started");

        Ok(Self {
            sink,
            initial_theta,
            frames: 0,
        })
    }

    /// Orbit angle at the moment capture started
    pub fn initial_theta(&self) -> f64 {
        self.initial_theta
    }

    /// Frames committed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forward one frame to the sink
    pub fn commit(&mut self, frame: &RenderedFrame) -> AppResult<()> {
        self.sink.commit(frame)?;
        self.frames += 1;
        Ok(())
    }

    /// End the session and let the sink flush
    pub fn stop(mut self) -> AppResult<u64> {
        self.sink.finish()?;
        info!(frames = self.frames, "Capture stopped");
        Ok(self.frames)
    }
}
