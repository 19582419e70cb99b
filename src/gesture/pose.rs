//! Pose estimator contract
//!
//! The actual hand pose model is host-provided (a neural net, a remote
//! service, a script in tests). The engine only needs "zero or one hand per
//! frame" and a way to know the model is ready.

use crate::gesture::landmarks::HandRecord;
use crate::video::VideoFrame;
use crate::Result;

/// Hand landmark model over live video frames
pub trait PoseEstimator: Send {
    /// Prepare the model. Called once before any detection tick; an error is
    /// fatal for the session.
    fn ensure_loaded(&mut self) -> Result<()>;

    /// Find at most one hand in the frame, in native video coordinates.
    fn estimate_hands(&mut self, frame: &VideoFrame) -> Result<Option<HandRecord>>;
}
