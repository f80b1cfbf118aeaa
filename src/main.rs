use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mockview_lib::{init_logging, run_replay, ReplayOptions};

/// Replays a scripted face-detection scenario through the recording pipeline
/// and prints the finished recording with its report.
#[derive(Parser, Debug)]
#[command(name = "mockview-replay", version)]
struct CliArgs {
    /// JSON array of detections (null for a frame without a face).
    #[arg(long)]
    scenario: PathBuf,

    /// Sampling interval in milliseconds; overrides the settings file.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Still image served as the camera frame. Defaults to a blank frame.
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Analysis settings JSON file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging();

    let output = run_replay(&ReplayOptions {
        scenario: cli_args.scenario,
        frame: cli_args.frame,
        settings: cli_args.settings,
        interval_ms: cli_args.interval_ms,
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
