//! The record-and-save workflow.
//!
//! [`RecordingWorkflow`] ties a [`CaptureController`] to a location fetch and
//! the [`SavePipeline`]. A location fetch starts when capture launches; once
//! the picker reports the finished clip the workflow waits for that fetch
//! (bounded by its timeout, and abandoned if the workflow is cancelled) and
//! hands both to the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::capture::{Camera, CameraFacing, CaptureController, CaptureSession, PickedMedia};
use crate::error::Result;
use crate::location::{LocationProvider, LocationSample, PendingLocation};
use crate::notify::Notifier;
use crate::save::{SavePipeline, SavedMemory};
use crate::storage::MemoryStore;

/// Why a recording ended without being saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// No location fix was available.
    LocationUnavailable,
    /// The recording was not ended with the stop button.
    NotStoppedByUser,
    /// The workflow was cancelled through its [`CancelHandle`].
    Cancelled,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocationUnavailable => write!(f, "location unavailable"),
            Self::NotStoppedByUser => write!(f, "recording was not stopped by the user"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a finished recording was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// The memory was persisted and the clip saved.
    Saved(SavedMemory),
    /// Nothing was saved.
    Cancelled(CancelReason),
}

impl WorkflowOutcome {
    /// Whether the recording was saved.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Cooperative cancellation for a running workflow.
///
/// Clones share state; cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    /// A handle that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// One camera's record-and-save flow.
pub struct RecordingWorkflow<C: Camera, S: MemoryStore> {
    controller: CaptureController<C>,
    provider: Arc<dyn LocationProvider>,
    location_timeout: Duration,
    pipeline: SavePipeline<S>,
    pending: Option<PendingLocation>,
    last_location: Option<LocationSample>,
    cancel: CancelHandle,
}

impl<C: Camera + std::fmt::Debug, S: MemoryStore> std::fmt::Debug for RecordingWorkflow<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingWorkflow")
            .field("controller", &self.controller)
            .field("provider", &self.provider.name())
            .field("location_timeout", &self.location_timeout)
            .field("pending", &self.pending)
            .field("last_location", &self.last_location)
            .finish_non_exhaustive()
    }
}

impl<C: Camera, S: MemoryStore> RecordingWorkflow<C, S> {
    /// Assemble a workflow.
    pub fn new(
        camera: C,
        provider: Arc<dyn LocationProvider>,
        location_timeout: Duration,
        pipeline: SavePipeline<S>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            controller: CaptureController::new(camera, notifier),
            provider,
            location_timeout,
            pipeline,
            pending: None,
            last_location: None,
            cancel: CancelHandle::new(),
        }
    }

    /// A handle that cancels this workflow's pending save.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Start a location fetch and launch capture.
    ///
    /// # Errors
    ///
    /// Returns the controller's error if capture cannot launch; the new
    /// location fetch is abandoned in that case.
    pub async fn begin(&mut self) -> Result<()> {
        debug!(
            "Fetching location from '{}' (timeout {:?})",
            self.provider.name(),
            self.location_timeout
        );
        let pending = PendingLocation::spawn(self.provider.clone(), self.location_timeout);

        // A rejected launch must leave the running session's fetch in place.
        self.controller.launch_capture().await?;
        self.pending = Some(pending);
        Ok(())
    }

    /// Flip between the front and rear camera.
    ///
    /// # Errors
    ///
    /// See [`CaptureController::toggle_camera_facing`].
    pub fn toggle_camera_facing(&mut self) -> Result<CameraFacing> {
        self.controller.toggle_camera_facing()
    }

    /// Stop recording from the stop button.
    ///
    /// # Errors
    ///
    /// See [`CaptureController::stop_capture`].
    pub fn stop_capture(&mut self) -> Result<()> {
        self.controller.stop_capture()
    }

    /// End recording without the stop button.
    ///
    /// # Errors
    ///
    /// See [`CaptureController::interrupt`].
    pub fn interrupt(&mut self) -> Result<()> {
        self.controller.interrupt()
    }

    /// Handle the picker's finished-media event.
    ///
    /// Only a session stopped by the user is saved. The picker is dismissed
    /// and the session destroyed whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error if saving fails.
    pub async fn on_media_picked(&mut self, media: PickedMedia) -> Result<WorkflowOutcome> {
        let stopped_by_user = self
            .controller
            .session()
            .is_some_and(CaptureSession::proceeds_to_save);
        if !stopped_by_user {
            info!("Recording was not stopped by the user, discarding it");
            return Ok(self.abandon(CancelReason::NotStoppedByUser));
        }
        if self.cancel.is_cancelled() {
            return Ok(self.abandon(CancelReason::Cancelled));
        }

        let location = match self.pending.take() {
            Some(pending) => {
                let cancel = self.cancel.clone();
                tokio::select! {
                    result = pending.wait() => match result {
                        Ok(sample) => Some(sample),
                        Err(e) => {
                            warn!("No location for this recording: {}", e);
                            None
                        }
                    },
                    () = cancel.cancelled() => {
                        info!("Workflow cancelled while waiting for a location");
                        return Ok(self.abandon(CancelReason::Cancelled));
                    }
                }
            }
            None => None,
        };
        self.last_location = location;

        self.controller.dismiss();
        self.pipeline.save(&media, location).await
    }

    /// Take the camera's finished media and handle it.
    ///
    /// # Errors
    ///
    /// See [`on_media_picked`](Self::on_media_picked).
    pub async fn finish(&mut self) -> Result<WorkflowOutcome> {
        let media = self.controller.camera_mut().finished_media();
        self.on_media_picked(media).await
    }

    /// The live capture session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&CaptureSession> {
        self.controller.session()
    }

    /// The capture controller.
    #[must_use]
    pub fn controller(&self) -> &CaptureController<C> {
        &self.controller
    }

    /// The location used by the last save attempt.
    #[must_use]
    pub fn last_location(&self) -> Option<LocationSample> {
        self.last_location
    }

    /// The save pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &SavePipeline<S> {
        &self.pipeline
    }

    fn abandon(&mut self, reason: CancelReason) -> WorkflowOutcome {
        self.pending = None;
        self.controller.dismiss();
        WorkflowOutcome::Cancelled(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::{CameraCall, MockCamera};
    use crate::error::Error;
    use crate::library::DirectoryMediaLibrary;
    use crate::location::{DeniedLocationProvider, FixedLocationProvider, LocationError};
    use crate::notify::{BufferedNotifier, LOCATION_REQUIRED, RECORDING_STARTED, VIDEO_SAVED};
    use crate::storage::Storage;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StalledProvider;

    #[async_trait]
    impl LocationProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn fetch_once(&self) -> std::result::Result<LocationSample, LocationError> {
            std::future::pending().await
        }
    }

    /// Answers after a short delay.
    struct SlowProvider(LocationSample);

    #[async_trait]
    impl LocationProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch_once(&self) -> std::result::Result<LocationSample, LocationError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(self.0)
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        notifier: Arc<BufferedNotifier>,
        workflow: RecordingWorkflow<MockCamera, Storage>,
    }

    impl Harness {
        fn count(&self) -> i64 {
            self.workflow.pipeline().store().count().unwrap()
        }
    }

    fn harness(provider: Arc<dyn LocationProvider>) -> Harness {
        harness_with(MockCamera::capable(), provider)
    }

    fn harness_with(camera: MockCamera, provider: Arc<dyn LocationProvider>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clip: PathBuf = dir.path().join("clip.mov");
        std::fs::write(&clip, b"recorded").unwrap();

        let notifier = Arc::new(BufferedNotifier::new());
        let library = Arc::new(DirectoryMediaLibrary::new(
            dir.path().join("library"),
            &["mov".to_string(), "mp4".to_string()],
        ));
        let pipeline = SavePipeline::new(
            Storage::open_in_memory().unwrap(),
            library,
            notifier.clone(),
        );
        let workflow = RecordingWorkflow::new(
            camera.with_media(clip),
            provider,
            Duration::from_secs(10),
            pipeline,
            notifier.clone(),
        );
        Harness {
            _dir: dir,
            notifier,
            workflow,
        }
    }

    #[tokio::test]
    async fn test_stop_and_save_with_location() {
        let mut h = harness(Arc::new(FixedLocationProvider::new(45.0, -75.0)));

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();
        let outcome = h.workflow.finish().await.unwrap();

        let WorkflowOutcome::Saved(saved) = outcome else {
            panic!("expected a saved memory, got {outcome:?}");
        };
        assert_eq!(saved.record.coordinates(), (45.0, -75.0));
        assert_eq!(h.count(), 1);
        assert_eq!(h.notifier.count(VIDEO_SAVED), 1);
        assert_eq!(h.notifier.count(RECORDING_STARTED), 1);
        assert!(h.workflow.session().is_none());
        assert_eq!(
            h.workflow.last_location().map(|s| (s.latitude, s.longitude)),
            Some((45.0, -75.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_launch_keeps_location_fetch() {
        let mut h = harness(Arc::new(SlowProvider(LocationSample::new(45.0, -75.0))));

        h.workflow.begin().await.unwrap();
        let err = h.workflow.begin().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRecording));
        assert!(h.workflow.session().unwrap().is_recording);

        h.workflow.stop_capture().unwrap();
        let outcome = h.workflow.finish().await.unwrap();

        let WorkflowOutcome::Saved(saved) = outcome else {
            panic!("expected a saved memory, got {outcome:?}");
        };
        assert_eq!(saved.record.coordinates(), (45.0, -75.0));
        assert_eq!(h.count(), 1);
        assert_eq!(h.notifier.count(RECORDING_STARTED), 1);
    }

    #[tokio::test]
    async fn test_missing_media_without_location_reports_media() {
        let mut h = harness(Arc::new(DeniedLocationProvider));

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();
        let err = h
            .workflow
            .on_media_picked(PickedMedia::empty())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaMissing));
        assert_eq!(h.count(), 0);
        assert_eq!(h.notifier.messages(), vec![RECORDING_STARTED.to_string()]);
    }

    #[tokio::test]
    async fn test_flipped_recording_still_saves() {
        let mut h = harness(Arc::new(FixedLocationProvider::new(10.0, 20.0)));

        h.workflow.begin().await.unwrap();
        assert_eq!(h.workflow.toggle_camera_facing().unwrap(), CameraFacing::Front);
        assert!(h.workflow.session().unwrap().is_reversed);
        h.workflow.stop_capture().unwrap();

        assert!(h.workflow.finish().await.unwrap().is_saved());
        assert_eq!(h.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_timeout_saves_nothing() {
        let mut h = harness(Arc::new(StalledProvider));

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();
        let outcome = h.workflow.finish().await.unwrap();

        assert_eq!(
            outcome,
            WorkflowOutcome::Cancelled(CancelReason::LocationUnavailable)
        );
        assert_eq!(h.count(), 0);
        assert_eq!(h.notifier.count(LOCATION_REQUIRED), 1);
        assert_eq!(h.notifier.count(VIDEO_SAVED), 0);
        assert!(h.workflow.last_location().is_none());
    }

    #[tokio::test]
    async fn test_denied_location_saves_nothing() {
        let mut h = harness(Arc::new(DeniedLocationProvider));

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();
        let outcome = h.workflow.finish().await.unwrap();

        assert_eq!(
            outcome,
            WorkflowOutcome::Cancelled(CancelReason::LocationUnavailable)
        );
        assert_eq!(h.count(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_recording_is_not_saved() {
        let mut h = harness(Arc::new(FixedLocationProvider::new(1.0, 2.0)));

        h.workflow.begin().await.unwrap();
        h.workflow.interrupt().unwrap();
        let outcome = h.workflow.finish().await.unwrap();

        assert_eq!(
            outcome,
            WorkflowOutcome::Cancelled(CancelReason::NotStoppedByUser)
        );
        assert_eq!(h.count(), 0);
        assert!(h.notifier.messages().iter().all(|m| m != VIDEO_SAVED));
        assert_eq!(h.workflow.controller().camera().count(&CameraCall::Dismiss), 1);
    }

    #[tokio::test]
    async fn test_media_without_session_is_not_saved() {
        let mut h = harness(Arc::new(FixedLocationProvider::new(1.0, 2.0)));

        let outcome = h.workflow.finish().await.unwrap();

        assert_eq!(
            outcome,
            WorkflowOutcome::Cancelled(CancelReason::NotStoppedByUser)
        );
        assert_eq!(h.count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_camera_never_fetches_or_presents() {
        let mut camera = MockCamera::capable();
        camera.front = false;
        let mut h = harness_with(camera, Arc::new(FixedLocationProvider::new(1.0, 2.0)));

        let err = h.workflow.begin().await.unwrap_err();

        assert!(matches!(err, Error::CapabilityUnavailable { .. }));
        assert!(h.workflow.controller().camera().calls.is_empty());
        assert!(h.notifier.messages().is_empty());
        assert!(h.workflow.pending.is_none());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_location() {
        let mut h = harness(Arc::new(StalledProvider));
        let cancel = h.workflow.cancel_handle();

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            cancel.cancel();
        });
        let outcome = h.workflow.finish().await.unwrap();

        assert_eq!(outcome, WorkflowOutcome::Cancelled(CancelReason::Cancelled));
        assert_eq!(h.count(), 0);
        assert!(h.notifier.messages().iter().all(|m| m != LOCATION_REQUIRED));
    }

    #[tokio::test]
    async fn test_cancel_before_media_picked() {
        let mut h = harness(Arc::new(FixedLocationProvider::new(1.0, 2.0)));

        h.workflow.begin().await.unwrap();
        h.workflow.stop_capture().unwrap();
        h.workflow.cancel_handle().cancel();

        let outcome = h.workflow.finish().await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Cancelled(CancelReason::Cancelled));
        assert_eq!(h.count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_handle_resolves() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());

        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        handle.cancel();
        task.await.unwrap();

        assert!(handle.is_cancelled());
        handle.reset();
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(WorkflowOutcome::Cancelled(
            CancelReason::LocationUnavailable,
        ))
        .unwrap();
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["detail"], "location_unavailable");
    }
}
