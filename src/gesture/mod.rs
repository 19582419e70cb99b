pub mod estimator;
pub mod landmarks;
pub mod pose;
pub mod template;
pub mod testkit;

pub use estimator::{GestureEstimator, GestureScore};
pub use landmarks::{BoundingBox, Finger, HandRecord, Landmark};
pub use pose::PoseEstimator;
pub use template::{
    CurlRule, DirectionRule, FingerCurl, FingerDirection, GestureTemplate, PoseSequence, PoseSpec,
};
