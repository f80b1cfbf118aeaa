pub mod aggregate;
pub mod scoring;
pub mod signals;

pub use aggregate::aggregate_session;
pub use scoring::{build_report, classify, highlights, Highlight, HighlightKind, Metric, Tier, VideoReport};
pub use signals::{extract_signals, to_samples, FrameSignals};
