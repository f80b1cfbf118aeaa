pub mod accumulator;
pub mod controller;
pub mod state;

pub use accumulator::{FinishedSession, SessionAccumulator};
pub use controller::RecordingController;
pub use state::{RecordingStatus, SessionBuffer, SessionState};
