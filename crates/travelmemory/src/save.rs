//! The save pipeline.
//!
//! Turns a finished recording plus a location fix into a persisted
//! [`TravelMemory`] and a copy of the clip in the media library.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capture::PickedMedia;
use crate::error::{Error, Result};
use crate::library::MediaLibrary;
use crate::location::LocationSample;
use crate::memory::TravelMemory;
use crate::notify::{Notifier, LOCATION_REQUIRED, SAVE_FAILED, VIDEO_SAVED};
use crate::storage::MemoryStore;
use crate::workflow::{CancelReason, WorkflowOutcome};

/// A memory that was persisted and whose clip reached the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedMemory {
    /// The persisted record, with its id assigned.
    pub record: TravelMemory,
    /// Where the library stored the clip.
    pub library_path: PathBuf,
}

/// Receives every completed save.
pub trait SaveObserver: Send + Sync {
    /// Called once the clip is in the library.
    fn memory_saved(&self, saved: &SavedMemory);
}

/// Resolve the picked media to its absolute path and `file://` URL.
///
/// # Errors
///
/// Returns [`Error::MediaMissing`] if the event carries no location, or
/// [`Error::MediaUnresolved`] if the path does not exist.
pub fn resolve_media_url(media: &PickedMedia) -> Result<(PathBuf, String)> {
    let path = media.media_path.as_ref().ok_or(Error::MediaMissing)?;
    let absolute = std::fs::canonicalize(path).map_err(|e| {
        debug!("Cannot resolve {}: {}", path.display(), e);
        Error::MediaUnresolved { path: path.clone() }
    })?;
    let url = format!("file://{}", absolute.display());
    Ok((absolute, url))
}

/// Persists memories and copies their clips into the media library.
pub struct SavePipeline<S: MemoryStore> {
    store: S,
    library: Arc<dyn MediaLibrary>,
    notifier: Arc<dyn Notifier>,
    observer: Option<Arc<dyn SaveObserver>>,
}

impl<S: MemoryStore> std::fmt::Debug for SavePipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavePipeline")
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: MemoryStore> SavePipeline<S> {
    /// Create a pipeline writing to `store` and `library`.
    pub fn new(store: S, library: Arc<dyn MediaLibrary>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            library,
            notifier,
            observer: None,
        }
    }

    /// Report completed saves to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SaveObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The store records are written to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save `media` tagged with `location`.
    ///
    /// The media location is resolved first. Without a location fix nothing
    /// is persisted; the user is asked to allow location access and the save
    /// is cancelled. Otherwise the record is committed first and the clip
    /// copied into the library after. A library failure leaves the record in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns an error if the media cannot be resolved, the record cannot be
    /// committed, or the library rejects the clip ([`Error::SaveFailed`]).
    pub async fn save(
        &self,
        media: &PickedMedia,
        location: Option<LocationSample>,
    ) -> Result<WorkflowOutcome> {
        let (path, url) = resolve_media_url(media)?;

        let Some(location) = location else {
            info!("No location fix, discarding recording");
            self.notifier.notify(LOCATION_REQUIRED);
            return Ok(WorkflowOutcome::Cancelled(CancelReason::LocationUnavailable));
        };

        let mut record = TravelMemory::new(url, &location);
        let id = self.store.insert(&record)?;
        record.id = Some(id);
        debug!(
            "Persisted memory {} at ({}, {})",
            id, record.latitude, record.longitude
        );

        if !self.library.is_compatible(&path) {
            warn!("{} is not compatible with the media library", path.display());
            self.notifier.notify(SAVE_FAILED);
            return Err(Error::save_failed(format!(
                "{} is not a supported video container",
                path.display()
            )));
        }

        let library_path = match self.library.save_to_library(&path).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Library save failed: {}", e);
                self.notifier.notify(SAVE_FAILED);
                return Err(e);
            }
        };

        info!("Memory {} saved to {}", id, library_path.display());
        self.notifier.notify(VIDEO_SAVED);

        let saved = SavedMemory {
            record,
            library_path,
        };
        if let Some(observer) = &self.observer {
            observer.memory_saved(&saved);
        }
        Ok(WorkflowOutcome::Saved(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::DirectoryMediaLibrary;
    use crate::notify::BufferedNotifier;
    use crate::storage::Storage;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingObserver {
        saved: Mutex<Vec<i64>>,
    }

    impl SaveObserver for RecordingObserver {
        fn memory_saved(&self, saved: &SavedMemory) {
            self.saved.lock().unwrap().push(saved.record.id.unwrap());
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        clip: PathBuf,
        notifier: Arc<BufferedNotifier>,
        pipeline: SavePipeline<Storage>,
    }

    fn fixture(clip_name: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join(clip_name);
        std::fs::write(&clip, b"clip data").unwrap();

        let extensions = vec!["mp4".to_string(), "mov".to_string()];
        let library = Arc::new(DirectoryMediaLibrary::new(
            dir.path().join("library"),
            &extensions,
        ));
        let notifier = Arc::new(BufferedNotifier::new());
        let pipeline = SavePipeline::new(
            Storage::open_in_memory().unwrap(),
            library,
            notifier.clone(),
        );
        Fixture {
            _dir: dir,
            clip,
            notifier,
            pipeline,
        }
    }

    #[test]
    fn test_resolve_media_url() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mov");
        std::fs::write(&clip, b"x").unwrap();

        let (path, url) = resolve_media_url(&PickedMedia::at(&clip)).unwrap();
        assert!(path.is_absolute());
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("clip.mov"));
    }

    #[test]
    fn test_resolve_media_url_failures() {
        assert!(matches!(
            resolve_media_url(&PickedMedia::empty()),
            Err(Error::MediaMissing)
        ));
        assert!(matches!(
            resolve_media_url(&PickedMedia::at("/nonexistent/clip.mov")),
            Err(Error::MediaUnresolved { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_with_location() {
        let f = fixture("clip.mov");
        let outcome = f
            .pipeline
            .save(&PickedMedia::at(&f.clip), Some(LocationSample::new(45.0, -75.0)))
            .await
            .unwrap();

        let WorkflowOutcome::Saved(saved) = outcome else {
            panic!("expected a saved memory, got {outcome:?}");
        };
        assert_eq!(saved.record.coordinates(), (45.0, -75.0));
        assert!(saved.library_path.exists());
        assert_eq!(f.pipeline.store().count().unwrap(), 1);
        assert_eq!(f.notifier.messages(), vec![VIDEO_SAVED.to_string()]);
    }

    #[tokio::test]
    async fn test_save_without_location_persists_nothing() {
        let f = fixture("clip.mov");
        let outcome = f
            .pipeline
            .save(&PickedMedia::at(&f.clip), None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WorkflowOutcome::Cancelled(CancelReason::LocationUnavailable)
        );
        assert_eq!(f.pipeline.store().count().unwrap(), 0);
        assert_eq!(f.notifier.messages(), vec![LOCATION_REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_media_checked_before_location() {
        let f = fixture("clip.mov");
        let err = f
            .pipeline
            .save(&PickedMedia::empty(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaMissing));
        assert_eq!(f.pipeline.store().count().unwrap(), 0);
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_incompatible_clip_keeps_record() {
        let f = fixture("clip.avi");
        let err = f
            .pipeline
            .save(&PickedMedia::at(&f.clip), Some(LocationSample::new(1.0, 2.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SaveFailed { .. }));
        assert_eq!(f.pipeline.store().count().unwrap(), 1);
        assert_eq!(f.notifier.count(SAVE_FAILED), 1);
        assert_eq!(f.notifier.count(VIDEO_SAVED), 0);
    }

    #[tokio::test]
    async fn test_unresolved_media_persists_nothing() {
        let f = fixture("clip.mov");
        let err = f
            .pipeline
            .save(&PickedMedia::empty(), Some(LocationSample::new(1.0, 2.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaMissing));
        assert_eq!(f.pipeline.store().count().unwrap(), 0);
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_observer_sees_save() {
        let f = fixture("clip.mp4");
        let observer = Arc::new(RecordingObserver::default());
        let pipeline = f.pipeline.with_observer(observer.clone());

        pipeline
            .save(&PickedMedia::at(&f.clip), Some(LocationSample::new(3.0, 4.0)))
            .await
            .unwrap();

        assert_eq!(*observer.saved.lock().unwrap(), vec![1]);
    }
}
