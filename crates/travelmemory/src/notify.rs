//! User-visible notifications.
//!
//! Short, fire-and-forget messages (the "toasts" of the recording flow).
//! Nothing waits for a notification to be acknowledged.

use tracing::info;

/// Shown once the camera is presented and recording.
pub const RECORDING_STARTED: &str = "Recording Started";

/// Shown once the clip reached the media library.
pub const VIDEO_SAVED: &str = "Video Saved!";

/// Shown when a clip cannot be saved for lack of a location fix.
pub const LOCATION_REQUIRED: &str = "Please allow location access to save your video";

/// Shown when the media library refuses or fails to store the clip.
pub const SAVE_FAILED: &str = "Unable to save video";

/// Sink for short user-visible messages.
pub trait Notifier: Send + Sync {
    /// Show `message` to the user.
    fn notify(&self, message: &str);
}

/// Prints notifications to stdout and mirrors them into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        info!(target: "travelmemory::notify", "{message}");
        println!("{message}");
    }
}

/// Collects notifications in memory.
///
/// Used by tests and by callers that render messages themselves.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    messages: std::sync::Mutex<Vec<String>>,
}

impl BufferedNotifier {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Number of times `message` was shown.
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.messages().iter().filter(|m| *m == message).count()
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
