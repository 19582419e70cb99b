pub mod config;
pub mod session;
pub mod worker;

pub use config::CaptureConfig;
pub use session::{
    CapturePhase, CaptureSession, CaptureSnapshot, PoseFeedback, SharedCaptureState, TickInput,
    TickOutcome,
};
pub use worker::{
    CaptureCommand, CaptureEvent, CaptureHandle, CaptureWorker, CaptureWorkerBuilder,
};
