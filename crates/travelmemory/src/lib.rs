//! `travelmemory` - A travel journal that tags recorded clips with where they were taken
//!
//! This library provides the capture controller, location acquisition, and
//! the save pipeline that persists each clip's location and copies the clip
//! into a media library.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod location;
pub mod logging;
pub mod memory;
pub mod notify;
pub mod save;
pub mod storage;
pub mod workflow;

pub use capture::{CameraFacing, CaptureController, CaptureSession, ClipCamera, PickedMedia};
pub use config::Config;
pub use error::{Error, Result};
pub use location::{LocationProvider, LocationSample};
pub use logging::init_logging;
pub use memory::TravelMemory;
pub use storage::{MemoryStore, Storage, StorageStats};
pub use workflow::{CancelHandle, CancelReason, RecordingWorkflow, WorkflowOutcome};
