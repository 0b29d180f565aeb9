//! The persisted travel memory record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::LocationSample;

/// A recorded clip and where it was taken.
///
/// Records are only built from a [`LocationSample`], so both coordinates are
/// always present. They are never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelMemory {
    /// Unique identifier (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// `file://` URL of the clip as reported by the camera.
    pub video_url: String,

    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl TravelMemory {
    /// Tag `video_url` with the coordinates of `location`.
    #[must_use]
    pub fn new(video_url: impl Into<String>, location: &LocationSample) -> Self {
        Self {
            id: None,
            video_url: video_url.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            created_at: Utc::now(),
        }
    }

    /// The coordinates as a `(latitude, longitude)` pair.
    #[must_use]
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
