pub mod detection;
pub mod samples;
pub mod session;

pub use detection::{Expression, ExpressionScores, FaceBox, FrameDetection, Point, LANDMARK_COUNT};
pub use samples::{ExpressionSample, GazeDirection, HeadPoseSample, SampleTriple};
pub use session::{AnalysisMode, CompletedRecording, SessionMetrics};
