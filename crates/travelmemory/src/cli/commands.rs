//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Record command arguments.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// The clip the camera reports once recording stops
    #[arg(value_name = "CLIP")]
    pub clip: PathBuf,

    /// Latitude to tag the clip with (overrides configured location)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to tag the clip with (overrides configured location)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Flip between front and rear camera this many times while recording
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub flip: u8,

    /// End the recording as interrupted instead of pressing stop
    #[arg(long)]
    pub interrupt: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Maximum number of memories to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account email address
    #[arg(short, long, default_value = "")]
    pub email: String,

    /// Account password
    #[arg(short, long, default_value = "")]
    pub password: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl RecordCommand {
    /// Coordinates given on the command line, if both were.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}
