pub mod analysis;
pub mod detector;
pub mod metrics;
pub mod models;
pub mod replay;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod utils;
pub mod video;

pub use replay::{run_replay, ReplayOptions, ReplayOutput};
pub use session::RecordingController;

/// Initializes logging once per process (reads RUST_LOG env var).
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
