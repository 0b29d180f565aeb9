//! Linux-specific implementation for travelmemory
//!
//! This crate provides Linux-specific functionality for the travelmemory project,
//! currently discovery of V4L2 camera device nodes.

#![cfg(target_os = "linux")]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

/// Directory holding the V4L2 device nodes.
const DEVICE_DIR: &str = "/dev";

/// File name prefix of V4L2 capture nodes.
const VIDEO_NODE_PREFIX: &str = "video";

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if initialization fails
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Initializing Linux platform components");
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// List the camera device nodes present on this machine, sorted by name.
#[must_use]
pub fn camera_devices() -> Vec<PathBuf> {
    camera_devices_in(Path::new(DEVICE_DIR))
}

/// List `videoN` device nodes under `dir`, sorted by device number.
///
/// A missing or unreadable directory yields an empty list.
#[must_use]
pub fn camera_devices_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::debug!("Cannot read device directory {}", dir.display());
        return Vec::new();
    };

    let mut devices: Vec<(u32, PathBuf)> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name
                .to_str()?
                .strip_prefix(VIDEO_NODE_PREFIX)?
                .parse::<u32>()
                .ok()?;
            Some((index, entry.path()))
        })
        .collect();

    devices.sort_by_key(|(index, _)| *index);
    devices.into_iter().map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(platform_name(), "Linux");
    }

    #[test]
    fn test_camera_devices_in_sorted_by_index() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["video10", "video2", "video0", "vhci", "videofoo"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let devices = camera_devices_in(dir.path());
        let names: Vec<_> = devices
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["video0", "video2", "video10"]);
    }

    #[test]
    fn test_camera_devices_in_missing_dir() {
        let devices = camera_devices_in(Path::new("/nonexistent/dev"));
        assert!(devices.is_empty());
    }
}
