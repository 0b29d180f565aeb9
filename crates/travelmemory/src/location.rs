//! Location acquisition.
//!
//! A [`LocationProvider`] reports the device position once per call: no
//! retries, no streaming. The recording workflow starts a fetch when capture
//! launches ([`PendingLocation::spawn`]) and awaits it, bounded by a timeout,
//! before anything is saved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::LocationConfig;

/// Errors that can occur while fetching a location.
#[derive(Debug, Error)]
pub enum LocationError {
    /// No fix arrived in time.
    #[error("location fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The user has not granted location access.
    #[error("location access denied")]
    PermissionDenied,

    /// The provider could not determine a position.
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// The HTTP request to the location service failed.
    #[error("location request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The location service answered with something unusable.
    #[error("invalid location response: {0}")]
    InvalidResponse(String),
}

/// A single GPS reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the reading was taken.
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    /// A reading taken now.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::at(latitude, longitude, Utc::now())
    }

    /// A reading taken at `captured_at`.
    #[must_use]
    pub fn at(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }

    /// Whether both coordinates are finite and within their ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Name of this provider (for logging).
    fn name(&self) -> &'static str;

    /// Fetch the current position once.
    ///
    /// # Errors
    ///
    /// Returns an error if no position can be determined.
    async fn fetch_once(&self) -> Result<LocationSample, LocationError>;
}

/// Reports a configured, fixed position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationProvider {
    /// Create a provider that always reports `latitude`/`longitude`.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch_once(&self) -> Result<LocationSample, LocationError> {
        Ok(LocationSample::new(self.latitude, self.longitude))
    }
}

/// Stands in when location access was never configured or granted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeniedLocationProvider;

#[async_trait]
impl LocationProvider for DeniedLocationProvider {
    fn name(&self) -> &'static str {
        "denied"
    }

    async fn fetch_once(&self) -> Result<LocationSample, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Body returned by the geolocation endpoint.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    latitude: f64,
    longitude: f64,
}

/// Looks the position up from a JSON geolocation endpoint.
///
/// The endpoint must answer `GET` with `{"latitude": .., "longitude": ..}`.
#[derive(Debug, Clone)]
pub struct HttpLocationProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLocationProvider {
    /// Create a provider for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LocationProvider for HttpLocationProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_once(&self) -> Result<LocationSample, LocationError> {
        debug!("Fetching location from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "location service returned {status}"
            )));
        }

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        let sample = LocationSample::new(body.latitude, body.longitude);
        if !sample.is_valid() {
            return Err(LocationError::InvalidResponse(format!(
                "coordinates out of range: {}, {}",
                body.latitude, body.longitude
            )));
        }
        Ok(sample)
    }
}

/// Build the provider described by the configuration.
///
/// An endpoint wins over fixed coordinates; with neither, every fetch is denied.
///
/// # Errors
///
/// Returns an error if the HTTP provider cannot be built.
pub fn provider_from_config(
    config: &LocationConfig,
    request_timeout: Duration,
) -> Result<Arc<dyn LocationProvider>, LocationError> {
    if let Some(endpoint) = &config.endpoint {
        return Ok(Arc::new(HttpLocationProvider::new(
            endpoint.clone(),
            request_timeout,
        )?));
    }
    match (config.latitude, config.longitude) {
        (Some(lat), Some(lon)) => Ok(Arc::new(FixedLocationProvider::new(lat, lon))),
        _ => Ok(Arc::new(DeniedLocationProvider)),
    }
}

/// Fetch once, giving up after `timeout`.
///
/// # Errors
///
/// Returns [`LocationError::Timeout`] if no answer arrives in time, or the
/// provider's own error.
pub async fn fetch_with_timeout(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<LocationSample, LocationError> {
    match tokio::time::timeout(timeout, provider.fetch_once()).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Location provider '{}' timed out after {:?}",
                provider.name(),
                timeout
            );
            Err(LocationError::Timeout(timeout))
        }
    }
}

/// A location fetch running in the background.
///
/// The timeout runs from the moment the fetch is spawned, so awaiting it
/// later never extends the bound. Dropping a pending fetch aborts it.
#[derive(Debug)]
pub struct PendingLocation {
    handle: JoinHandle<Result<LocationSample, LocationError>>,
}

impl PendingLocation {
    /// Start fetching from `provider` on the runtime.
    #[must_use]
    pub fn spawn(provider: Arc<dyn LocationProvider>, timeout: Duration) -> Self {
        let handle =
            tokio::spawn(async move { fetch_with_timeout(provider.as_ref(), timeout).await });
        Self { handle }
    }

    /// Whether the fetch has produced a result.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the fetch result.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`LocationError::Unavailable`] if the task
    /// was aborted or panicked.
    pub async fn wait(mut self) -> Result<LocationSample, LocationError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(LocationError::Unavailable(format!(
                "location task failed: {e}"
            ))),
        }
    }
}

impl Drop for PendingLocation {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
