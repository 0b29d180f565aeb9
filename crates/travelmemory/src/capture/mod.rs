//! Camera capture for travelmemory.
//!
//! This module defines the camera abstraction, the per-recording
//! [`CaptureSession`] state and the [`CaptureController`] that drives a
//! session through its transitions:
//!
//! ```text
//! Idle -> Recording -> (Recording, via camera flip) -> Stopped(User)
//!                                                   -> Stopped(Interrupted)
//! ```
//!
//! Only a session stopped by the user proceeds to the save pipeline.

mod clip_camera;
mod controller;

#[cfg(test)]
pub(crate) mod mock;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use clip_camera::ClipCamera;
pub use controller::CaptureController;

/// Which camera the session records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// The user-facing camera.
    Front,
    /// The world-facing camera.
    Rear,
}

impl CameraFacing {
    /// The opposite camera.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Front => Self::Rear,
            Self::Rear => Self::Front,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Rear => write!(f, "rear"),
        }
    }
}

/// Kind of media a camera can capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Video with audio.
    Movie,
    /// Still photo.
    Image,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Why a recording ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user pressed the stop button.
    User,
    /// Recording ended without the stop button (timeout, external interruption).
    Interrupted,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created but not yet recording.
    Idle,
    /// The camera is recording.
    Recording,
    /// Recording ended.
    Stopped(StopReason),
}

/// State of one recording interaction, from launch until the picker is dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureSession {
    /// Camera currently in use.
    pub camera_facing: CameraFacing,
    /// Whether the camera is recording right now.
    pub is_recording: bool,
    /// Whether the camera was flipped at least once.
    pub is_reversed: bool,
    /// Whether the recording was ended with the stop button.
    pub stopped_by_user: bool,
    /// Lifecycle state.
    pub state: SessionState,
    /// When the session was launched.
    pub started_at: DateTime<Utc>,
}

impl CaptureSession {
    /// A fresh, idle session on `facing`.
    #[must_use]
    pub fn new(camera_facing: CameraFacing) -> Self {
        Self {
            camera_facing,
            is_recording: false,
            is_reversed: false,
            stopped_by_user: false,
            state: SessionState::Idle,
            started_at: Utc::now(),
        }
    }

    /// Whether the finished recording may be saved.
    ///
    /// Only an explicit stop qualifies; a camera flip has no bearing on it.
    #[must_use]
    pub fn proceeds_to_save(&self) -> bool {
        self.stopped_by_user && self.state == SessionState::Stopped(StopReason::User)
    }

    /// Whether recording has ended, for any reason.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self.state, SessionState::Stopped(_))
    }
}

/// A control laid over the camera preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayControl {
    /// Ends the recording and hands the clip to the save pipeline.
    StopButton,
    /// Switches between the front and rear camera.
    FlipCameraButton,
    /// Status text shown under the stop button.
    StatusLabel(String),
}

/// The recording UI shown on top of the camera preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOverlay {
    /// Controls in drawing order.
    pub controls: Vec<OverlayControl>,
    /// Whether the overlay hides the preview. Always false for recording.
    pub opaque: bool,
}

impl CaptureOverlay {
    /// Text of the status label while recording.
    pub const STOP_LABEL: &'static str = "Stop Recording";

    /// The overlay used while recording: stop button, flip button and status label.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            controls: vec![
                OverlayControl::StopButton,
                OverlayControl::FlipCameraButton,
                OverlayControl::StatusLabel(Self::STOP_LABEL.to_string()),
            ],
            opaque: false,
        }
    }

    /// Whether the overlay contains `control`.
    #[must_use]
    pub fn has(&self, control: &OverlayControl) -> bool {
        self.controls.contains(control)
    }
}

/// Payload of the "media finished picking" event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickedMedia {
    /// Temporary location of the recorded clip, if the picker reported one.
    pub media_path: Option<PathBuf>,
}

impl PickedMedia {
    /// An event carrying `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            media_path: Some(path.into()),
        }
    }

    /// An event without a media location.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Camera hardware and its picker UI.
///
/// Implementors wrap the platform camera. All calls arrive from the single
/// task that owns the [`CaptureController`].
#[async_trait]
pub trait Camera: Send {
    /// Whether a camera with the given facing exists.
    fn is_device_available(&self, facing: CameraFacing) -> bool;

    /// Media types the camera can capture.
    fn available_media_types(&self) -> Vec<MediaType>;

    /// Show the picker with `overlay` on top of the `facing` preview.
    ///
    /// Resolves once presentation has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the picker cannot be shown.
    async fn present(
        &mut self,
        overlay: &CaptureOverlay,
        facing: CameraFacing,
    ) -> crate::Result<()>;

    /// Start recording on the current camera.
    ///
    /// # Errors
    ///
    /// Returns an error if recording cannot start.
    fn start_recording(&mut self) -> crate::Result<()>;

    /// Stop the current recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot stop cleanly.
    fn stop_recording(&mut self) -> crate::Result<()>;

    /// Switch to the camera with `facing`.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be switched.
    fn set_facing(&mut self, facing: CameraFacing) -> crate::Result<()>;

    /// The "media finished picking" event for the last recording.
    fn finished_media(&mut self) -> PickedMedia;

    /// Hide the picker.
    fn dismiss(&mut self);
}
