//! Synthetic hand construction
//!
//! Builds idealized 21-point hand records for tests, demos, and scripted
//! pose estimators. Geometry is exaggerated so curl and direction
//! classification is unambiguous.

use crate::gesture::landmarks::{HandRecord, Landmark, LANDMARK_COUNT};
use crate::gesture::pose::PoseEstimator;
use crate::video::VideoFrame;
use crate::{MudraError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Idealized state of one finger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerState {
    /// Straight and pointing up
    Extended,
    /// Bent at a right angle
    HalfBent,
    /// Fully folded onto the palm
    Curled,
}

/// Idealized state of all five fingers, thumb first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerShape {
    pub thumb: FingerState,
    pub index: FingerState,
    pub middle: FingerState,
    pub ring: FingerState,
    pub pinky: FingerState,
}

impl FingerShape {
    pub fn all(state: FingerState) -> Self {
        Self {
            thumb: state,
            index: state,
            middle: state,
            ring: state,
            pinky: state,
        }
    }

    /// All five fingers extended
    pub fn open_palm() -> Self {
        Self::all(FingerState::Extended)
    }

    /// Index and middle extended, the rest curled
    pub fn victory() -> Self {
        Self {
            thumb: FingerState::Curled,
            index: FingerState::Extended,
            middle: FingerState::Extended,
            ring: FingerState::Curled,
            pinky: FingerState::Curled,
        }
    }

    /// Index, middle and ring extended, thumb and pinky curled
    pub fn three_fingers_up() -> Self {
        Self {
            thumb: FingerState::Curled,
            index: FingerState::Extended,
            middle: FingerState::Extended,
            ring: FingerState::Extended,
            pinky: FingerState::Curled,
        }
    }

    /// All five fingers curled
    pub fn fist() -> Self {
        Self::all(FingerState::Curled)
    }

    fn states(&self) -> [FingerState; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }
}

/// Build a full 21-point hand record for the given finger shape.
///
/// The hand occupies roughly a 200x150 region with the wrist at the bottom,
/// in native video coordinates.
pub fn synthetic_hand(shape: &FingerShape) -> HandRecord {
    let mut landmarks = Vec::with_capacity(LANDMARK_COUNT);

    // wrist
    landmarks.push(Landmark::new(120.0, 200.0, 0.0));

    for (i, state) in shape.states().iter().enumerate() {
        let x = 60.0 + 30.0 * i as f32;
        let joints = match state {
            FingerState::Extended => [
                (x, 150.0),
                (x, 120.0),
                (x, 100.0),
                (x, 80.0),
            ],
            FingerState::HalfBent => [
                (x, 150.0),
                (x, 130.0),
                (x + 15.0, 130.0),
                (x + 30.0, 130.0),
            ],
            FingerState::Curled => [
                (x, 150.0),
                (x, 130.0),
                (x, 140.0),
                (x, 152.0),
            ],
        };
        for (jx, jy) in joints {
            landmarks.push(Landmark::new(jx, jy, 0.0));
        }
    }

    HandRecord::from_landmarks(landmarks).expect("synthetic hand is never empty")
}

/// Shared control for a scripted performer: the shape the "user" is
/// currently holding, or `None` for no hand on screen
#[derive(Clone, Default)]
pub struct PoseScript {
    shape: Arc<Mutex<Option<FingerShape>>>,
}

impl PoseScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change what the performer is showing
    pub fn set(&self, shape: Option<FingerShape>) {
        *self.shape.lock() = shape;
    }

    pub fn current(&self) -> Option<FingerShape> {
        *self.shape.lock()
    }
}

/// Pose estimator that reads hands off a [`PoseScript`] instead of a model
pub struct ScriptedPoseEstimator {
    script: PoseScript,
    fail_load: bool,
}

impl ScriptedPoseEstimator {
    pub fn new(script: &PoseScript) -> Self {
        Self {
            script: script.clone(),
            fail_load: false,
        }
    }

    /// An estimator whose model load always fails
    pub fn failing_to_load() -> Self {
        Self {
            script: PoseScript::new(),
            fail_load: true,
        }
    }
}

impl PoseEstimator for ScriptedPoseEstimator {
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.fail_load {
            Err(MudraError::ModelLoadError(
                "scripted model load failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn estimate_hands(&mut self, _frame: &VideoFrame) -> Result<Option<HandRecord>> {
        Ok(self.script.current().map(|shape| synthetic_hand(&shape)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::Finger;

    #[test]
    fn test_synthetic_hand_is_complete() {
        let hand = synthetic_hand(&FingerShape::open_palm());
        assert_eq!(hand.landmarks.len(), LANDMARK_COUNT);
        for finger in Finger::ALL {
            assert!(hand.finger_joints(finger).is_some());
        }
    }

    #[test]
    fn test_synthetic_hand_bounding_box_is_nonempty() {
        let hand = synthetic_hand(&FingerShape::fist());
        assert!(hand.bounding_box.width() > 0.0);
        assert!(hand.bounding_box.height() > 0.0);
    }
}
