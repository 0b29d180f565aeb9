//! The capture session controller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    Camera, CameraFacing, CaptureOverlay, CaptureSession, MediaType, SessionState, StopReason,
};
use crate::error::{Error, Result};
use crate::notify::{Notifier, RECORDING_STARTED};

/// Drives one camera through recording sessions.
///
/// The controller is owned by a single task; it holds at most one
/// [`CaptureSession`], created by [`launch_capture`](Self::launch_capture)
/// and destroyed by [`dismiss`](Self::dismiss).
pub struct CaptureController<C: Camera> {
    camera: C,
    notifier: Arc<dyn Notifier>,
    session: Option<CaptureSession>,
}

impl<C: Camera + std::fmt::Debug> std::fmt::Debug for CaptureController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("camera", &self.camera)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<C: Camera> CaptureController<C> {
    /// Create a controller for `camera`.
    pub fn new(camera: C, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            camera,
            notifier,
            session: None,
        }
    }

    /// Whether the device can record video: both cameras present and movie
    /// capture supported. Has no side effects.
    #[must_use]
    pub fn is_recording_available(&self) -> bool {
        self.missing_capability().is_none()
    }

    /// Describe the first missing recording capability, if any.
    fn missing_capability(&self) -> Option<String> {
        for facing in [CameraFacing::Front, CameraFacing::Rear] {
            if !self.camera.is_device_available(facing) {
                return Some(format!("no {facing} camera"));
            }
        }
        if !self
            .camera
            .available_media_types()
            .contains(&MediaType::Movie)
        {
            return Some("camera cannot capture movies".to_string());
        }
        None
    }

    /// Present the recording UI and start recording on the rear camera.
    ///
    /// Nothing is presented and nothing records when the device lacks a
    /// capability. Returns once presentation has finished and recording runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityUnavailable`] if recording is not possible,
    /// [`Error::AlreadyRecording`] if a session is recording, or the camera's
    /// error if presenting or starting fails.
    pub async fn launch_capture(&mut self) -> Result<()> {
        if self.session.as_ref().is_some_and(|s| s.is_recording) {
            return Err(Error::AlreadyRecording);
        }
        if let Some(reason) = self.missing_capability() {
            warn!("Video recording unavailable: {}", reason);
            return Err(Error::capability_unavailable(reason));
        }

        let facing = CameraFacing::Rear;
        let overlay = CaptureOverlay::recording();
        self.camera.present(&overlay, facing).await?;

        if let Err(e) = self.camera.start_recording() {
            warn!("Recording failed to start: {}", e);
            self.camera.dismiss();
            return Err(e);
        }

        let mut session = CaptureSession::new(facing);
        session.is_recording = true;
        session.state = SessionState::Recording;
        self.session = Some(session);

        info!("Recording started on the {} camera", facing);
        self.notifier.notify(RECORDING_STARTED);
        Ok(())
    }

    /// Flip between the front and rear camera without ending the session.
    ///
    /// The recording is stopped, the camera switched, and recording restarted;
    /// the session reports `is_recording` throughout. Returns the new facing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRecording`] without an active recording. If the
    /// camera fails mid-flip the session ends as interrupted and the camera's
    /// error is returned.
    pub fn toggle_camera_facing(&mut self) -> Result<CameraFacing> {
        let session = self.recording_session_mut()?;
        session.is_reversed = true;
        let next = session.camera_facing.flipped();

        let flipped = self
            .camera
            .stop_recording()
            .and_then(|()| self.camera.set_facing(next))
            .and_then(|()| self.camera.start_recording());

        let session = self.recording_session_mut()?;
        match flipped {
            Ok(()) => {
                session.camera_facing = next;
                debug!("Camera flipped to {}", next);
                Ok(next)
            }
            Err(e) => {
                warn!("Camera flip failed, ending session: {}", e);
                session.is_recording = false;
                session.state = SessionState::Stopped(StopReason::Interrupted);
                Err(e)
            }
        }
    }

    /// End the recording from the stop button.
    ///
    /// Repeated taps after the first are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRecording`] if no session exists, or the camera's
    /// error if it cannot stop.
    pub fn stop_capture(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotRecording)?;
        if session.is_stopped() {
            debug!("Ignoring stop on a session that already ended");
            return Ok(());
        }
        self.camera.stop_recording()?;

        if let Some(session) = self.session.as_mut() {
            session.is_recording = false;
            session.stopped_by_user = true;
            session.state = SessionState::Stopped(StopReason::User);
        }
        info!("Recording stopped by user");
        Ok(())
    }

    /// End the recording without the stop button (timeout, interruption).
    ///
    /// A session ended this way never reaches the save pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRecording`] if no session exists, or the camera's
    /// error if it cannot stop.
    pub fn interrupt(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotRecording)?;
        if session.is_stopped() {
            return Ok(());
        }
        let stopped = self.camera.stop_recording();

        if let Some(session) = self.session.as_mut() {
            session.is_recording = false;
            session.state = SessionState::Stopped(StopReason::Interrupted);
        }
        info!("Recording interrupted");
        stopped
    }

    /// Dismiss the picker and end the session, returning its final state.
    ///
    /// A session still recording is interrupted first.
    pub fn dismiss(&mut self) -> Option<CaptureSession> {
        if self.session.as_ref().is_some_and(|s| s.is_recording) {
            if let Err(e) = self.interrupt() {
                warn!("Camera did not stop cleanly on dismiss: {}", e);
            }
        }
        if self.session.is_some() {
            self.camera.dismiss();
        }
        self.session.take()
    }

    /// The current session, if one is live.
    #[must_use]
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// The wrapped camera.
    #[must_use]
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Mutable access to the wrapped camera.
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    fn recording_session_mut(&mut self) -> Result<&mut CaptureSession> {
        self.session
            .as_mut()
            .filter(|s| s.state == SessionState::Recording)
            .ok_or(Error::NotRecording)
    }
}
