use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RenderError;
use crate::renderer::scene::{SceneBackend, SceneManager};

/// Cloneable cancellation flag for a [`RenderLoop`].
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Drawn,
    /// Nothing presented this frame; try again next frame.
    Skipped,
    /// The loop is finished. The host should tear the scene down and exit.
    Stopped,
}

/// Drives one frame per call until stopped.
#[derive(Debug)]
pub struct RenderLoop {
    stop: StopHandle,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> (Self, StopHandle) {
        let stop = StopHandle::default();
        let this = Self {
            stop: stop.clone(),
            frames: 0,
        };
        (this, stop)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Advances control damping, then draws. Surface errors are absorbed
    /// here: a lost surface is reconfigured, a timeout skips the frame, and
    /// running out of memory stops the loop.
    pub fn frame<B: SceneBackend>(
        &mut self,
        scene: &mut SceneManager<B>,
        overlay: impl FnOnce(&mut B, &mut B::Frame),
    ) -> FrameStatus {
        if self.stop.is_stopped() {
            return FrameStatus::Stopped;
        }

        scene.advance_controls();

        match scene.draw_frame(overlay) {
            Ok(true) => {
                self.frames += 1;
                FrameStatus::Drawn
            }
            Ok(false) => FrameStatus::Skipped,
            Err(RenderError::SurfaceLost) => {
                tracing::warn!("surface lost, reconfiguring");
                scene.reconfigure();
                FrameStatus::Skipped
            }
            Err(RenderError::Timeout) => {
                tracing::debug!("frame acquire timed out");
                FrameStatus::Skipped
            }
            Err(e @ RenderError::OutOfMemory) => {
                tracing::error!(error = %e, "stopping render loop");
                self.stop.stop();
                FrameStatus::Stopped
            }
        }
    }
}
