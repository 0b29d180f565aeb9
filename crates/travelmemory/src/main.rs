//! `travelmem` - CLI for travelmemory
//!
//! This binary records clips into the travel journal and inspects what has
//! been saved.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::debug;

use travelmemory::auth::{AuthError, Credentials, LoginClient, LOGIN_SUCCESS};
use travelmemory::capture::{CaptureController, ClipCamera};
use travelmemory::cli::{Cli, Command, ConfigCommand, ListCommand, LoginCommand, RecordCommand};
use travelmemory::library::DirectoryMediaLibrary;
use travelmemory::location::{
    provider_from_config, FixedLocationProvider, LocationProvider, LocationSample,
};
use travelmemory::notify::{BufferedNotifier, ConsoleNotifier, Notifier};
use travelmemory::save::SavePipeline;
use travelmemory::workflow::{RecordingWorkflow, WorkflowOutcome};
use travelmemory::{init_logging, Config, Storage};

// Platform-specific imports using conditional compilation
#[cfg(target_os = "linux")]
use travelmemory_linux as platform;

#[cfg(not(target_os = "linux"))]
mod platform {
    use std::path::PathBuf;

    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    pub fn platform_name() -> &'static str {
        "unknown"
    }

    pub fn camera_devices() -> Vec<PathBuf> {
        Vec::new()
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    platform::init().map_err(|e| anyhow::anyhow!("platform init failed: {e}"))?;

    // Config commands must work even when the config file is broken
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    let config = Config::load_from(cli.config.clone())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Command::Record(cmd) => handle_record(&config, &cmd).await,
            Command::List(cmd) => handle_list(&config, &cmd),
            Command::Login(cmd) => handle_login(&config, cmd).await,
            Command::Status(cmd) => handle_status(&config, cmd.json),
            Command::Config(_) => Ok(()),
        }
    })
}

/// Which camera devices the host has, as `(front, rear)`.
fn camera_devices(config: &Config) -> (bool, bool) {
    if config.capture.detect_devices {
        let found = platform::camera_devices();
        debug!("Detected {} camera device(s)", found.len());
        (found.len() >= 2, !found.is_empty())
    } else {
        (config.capture.front_camera, config.capture.rear_camera)
    }
}

async fn handle_record(config: &Config, cmd: &RecordCommand) -> anyhow::Result<()> {
    let (front, rear) = camera_devices(config);
    let camera = ClipCamera::new(&cmd.clip).with_devices(front, rear);

    let provider: Arc<dyn LocationProvider> = match cmd.coordinates() {
        Some((lat, lon)) => {
            if !LocationSample::new(lat, lon).is_valid() {
                bail!("coordinates ({lat}, {lon}) are out of range");
            }
            Arc::new(FixedLocationProvider::new(lat, lon))
        }
        None => provider_from_config(&config.location, config.location_timeout())?,
    };

    let storage = Storage::open(config.database_path())?;
    let library = Arc::new(DirectoryMediaLibrary::new(
        config.library_path(),
        &config.library.compatible_extensions,
    ));
    let buffered = Arc::new(BufferedNotifier::new());
    let notifier: Arc<dyn Notifier> = if cmd.json {
        buffered.clone()
    } else {
        Arc::new(ConsoleNotifier)
    };

    let pipeline = SavePipeline::new(&storage, library, notifier.clone());
    let mut workflow = RecordingWorkflow::new(
        camera,
        provider,
        config.location_timeout(),
        pipeline,
        notifier,
    );

    let cancel = workflow.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    workflow.begin().await?;
    for _ in 0..cmd.flip {
        workflow.toggle_camera_facing()?;
    }
    if cmd.interrupt {
        workflow.interrupt()?;
    } else {
        workflow.stop_capture()?;
    }
    let outcome = workflow.finish().await?;

    if cmd.json {
        let report = serde_json::json!({
            "result": outcome,
            "notifications": buffered.messages(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match outcome {
        WorkflowOutcome::Saved(saved) => {
            println!(
                "Memory {} at ({:.6}, {:.6})",
                saved.record.id.unwrap_or_default(),
                saved.record.latitude,
                saved.record.longitude
            );
            println!("  Video:   {}", saved.record.video_url);
            println!("  Library: {}", saved.library_path.display());
        }
        WorkflowOutcome::Cancelled(reason) => {
            println!("Not saved: {reason}");
        }
    }
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let storage = Storage::open(config.database_path())?;
    let memories = storage.get_recent(cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&memories)?);
        return Ok(());
    }

    if memories.is_empty() {
        println!("No travel memories yet.");
        return Ok(());
    }
    for memory in &memories {
        println!(
            "{:>5}  {}  ({:>10.6}, {:>11.6})  {}",
            memory.id.unwrap_or_default(),
            memory.created_at.format("%Y-%m-%d %H:%M"),
            memory.latitude,
            memory.longitude,
            memory.video_url
        );
    }
    Ok(())
}

async fn handle_login(config: &Config, cmd: LoginCommand) -> anyhow::Result<()> {
    let client = LoginClient::from_config(config)?;
    match client
        .login(&Credentials::new(cmd.email, cmd.password))
        .await
    {
        Ok(token) => {
            println!("{LOGIN_SUCCESS}");
            debug!("Session token: {}", token.token);
            Ok(())
        }
        Err(AuthError::Validation(message)) => {
            eprintln!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let (front, rear) = camera_devices(config);
    let controller = CaptureController::new(
        ClipCamera::new("").with_devices(front, rear),
        Arc::new(BufferedNotifier::new()),
    );
    let recording_available = controller.is_recording_available();
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "platform": platform::platform_name(),
            "front_camera": front,
            "rear_camera": rear,
            "recording_available": recording_available,
            "database_path": config.database_path(),
            "library_path": config.library_path(),
            "total_memories": stats.total_memories,
            "oldest_memory": stats.oldest_memory,
            "newest_memory": stats.newest_memory,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("travelmem status");
        println!("----------------");
        println!("Platform:      {}", platform::platform_name());
        println!(
            "Cameras:       front {}, rear {}",
            yes_no(front),
            yes_no(rear)
        );
        println!(
            "Recording:     {}",
            if recording_available {
                "available"
            } else {
                "unavailable"
            }
        );
        println!("Database:      {}", config.database_path().display());
        println!("Library:       {}", config.library_path().display());
        println!("Memories:      {}", stats.total_memories);
        if let Some(newest) = stats.newest_memory {
            println!("Last saved:    {}", newest.format("%Y-%m-%d %H:%M"));
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Capture]");
                println!("  Front camera:       {}", config.capture.front_camera);
                println!("  Rear camera:        {}", config.capture.rear_camera);
                println!("  Detect devices:     {}", config.capture.detect_devices);
                println!(
                    "  Location timeout:   {} ms",
                    config.capture.location_timeout_ms
                );
                println!();
                println!("[Location]");
                let fixed = config.location.latitude.zip(config.location.longitude);
                match (&config.location.endpoint, fixed) {
                    (Some(endpoint), _) => println!("  Endpoint:           {endpoint}"),
                    (None, Some((lat, lon))) => println!("  Fixed:              ({lat}, {lon})"),
                    (None, None) => println!("  Source:             none (access denied)"),
                }
                println!();
                println!("[Library]");
                println!("  Path:               {}", config.library_path().display());
                println!(
                    "  Extensions:         {}",
                    config.library.compatible_extensions.join(", ")
                );
                println!();
                println!("[Api]");
                println!("  Base URL:           {}", config.api.base_url);
                println!("  Timeout:            {} s", config.api.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
