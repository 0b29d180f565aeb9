//! Scriptable camera for unit tests.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{Camera, CameraFacing, CaptureOverlay, MediaType, PickedMedia};
use crate::error::{Error, Result};

/// A call the controller made on the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CameraCall {
    Present(CameraFacing),
    Start,
    Stop,
    SetFacing(CameraFacing),
    Dismiss,
}

#[derive(Debug)]
pub(crate) struct MockCamera {
    pub front: bool,
    pub rear: bool,
    pub media_types: Vec<MediaType>,
    pub media_path: Option<PathBuf>,
    pub fail_start: bool,
    pub calls: Vec<CameraCall>,
    pub overlay: Option<CaptureOverlay>,
    pub facing: Option<CameraFacing>,
    pub recording: bool,
}

impl MockCamera {
    /// Both cameras present, movie capture supported.
    pub fn capable() -> Self {
        Self {
            front: true,
            rear: true,
            media_types: vec![MediaType::Image, MediaType::Movie],
            media_path: None,
            fail_start: false,
            calls: Vec::new(),
            overlay: None,
            facing: None,
            recording: false,
        }
    }

    pub fn with_media(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_path = Some(path.into());
        self
    }

    pub fn count(&self, call: &CameraCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn is_device_available(&self, facing: CameraFacing) -> bool {
        match facing {
            CameraFacing::Front => self.front,
            CameraFacing::Rear => self.rear,
        }
    }

    fn available_media_types(&self) -> Vec<MediaType> {
        self.media_types.clone()
    }

    async fn present(&mut self, overlay: &CaptureOverlay, facing: CameraFacing) -> Result<()> {
        self.calls.push(CameraCall::Present(facing));
        self.overlay = Some(overlay.clone());
        self.facing = Some(facing);
        Ok(())
    }

    fn start_recording(&mut self) -> Result<()> {
        self.calls.push(CameraCall::Start);
        if self.fail_start {
            return Err(Error::camera("sensor busy"));
        }
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.calls.push(CameraCall::Stop);
        self.recording = false;
        Ok(())
    }

    fn set_facing(&mut self, facing: CameraFacing) -> Result<()> {
        self.calls.push(CameraCall::SetFacing(facing));
        self.facing = Some(facing);
        Ok(())
    }

    fn finished_media(&mut self) -> PickedMedia {
        PickedMedia {
            media_path: self.media_path.clone(),
        }
    }

    fn dismiss(&mut self) {
        self.calls.push(CameraCall::Dismiss);
        self.overlay = None;
    }
}
