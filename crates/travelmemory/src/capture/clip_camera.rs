//! A camera backed by an already-recorded clip.
//!
//! Hosts without an interactive camera picker (the CLI, integration tests)
//! use this to drive the full workflow: the "recording" is the clip file the
//! caller supplies, reported through the media-picked event once stopped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{Camera, CameraFacing, CaptureOverlay, MediaType, PickedMedia};
use crate::error::{Error, Result};

/// Camera whose recordings are a pre-recorded clip.
#[derive(Debug, Clone)]
pub struct ClipCamera {
    clip: PathBuf,
    front: bool,
    rear: bool,
    presented: bool,
    recording: bool,
    facing: CameraFacing,
    segments: u32,
}

impl ClipCamera {
    /// A camera with both devices present that records `clip`.
    #[must_use]
    pub fn new(clip: impl Into<PathBuf>) -> Self {
        Self {
            clip: clip.into(),
            front: true,
            rear: true,
            presented: false,
            recording: false,
            facing: CameraFacing::Rear,
            segments: 0,
        }
    }

    /// Declare which camera devices exist.
    #[must_use]
    pub fn with_devices(mut self, front: bool, rear: bool) -> Self {
        self.front = front;
        self.rear = rear;
        self
    }

    /// The clip this camera reports.
    #[must_use]
    pub fn clip(&self) -> &Path {
        &self.clip
    }

    /// Number of times recording was started (a flip restarts it).
    #[must_use]
    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Camera in use.
    #[must_use]
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }
}

#[async_trait]
impl Camera for ClipCamera {
    fn is_device_available(&self, facing: CameraFacing) -> bool {
        match facing {
            CameraFacing::Front => self.front,
            CameraFacing::Rear => self.rear,
        }
    }

    fn available_media_types(&self) -> Vec<MediaType> {
        vec![MediaType::Image, MediaType::Movie]
    }

    async fn present(&mut self, overlay: &CaptureOverlay, facing: CameraFacing) -> Result<()> {
        debug!(
            "Presenting clip camera ({} controls) on the {} camera",
            overlay.controls.len(),
            facing
        );
        self.presented = true;
        self.facing = facing;
        Ok(())
    }

    fn start_recording(&mut self) -> Result<()> {
        if !self.presented {
            return Err(Error::camera("picker is not presented"));
        }
        self.recording = true;
        self.segments += 1;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.recording = false;
        Ok(())
    }

    fn set_facing(&mut self, facing: CameraFacing) -> Result<()> {
        if !self.is_device_available(facing) {
            return Err(Error::camera(format!("no {facing} camera")));
        }
        self.facing = facing;
        Ok(())
    }

    fn finished_media(&mut self) -> PickedMedia {
        if self.segments == 0 || self.recording {
            return PickedMedia::empty();
        }
        PickedMedia::at(self.clip.clone())
    }

    fn dismiss(&mut self) {
        self.presented = false;
        self.recording = false;
    }
}
