//! Hand landmark geometry
//!
//! Types for the output of the pose estimator: a 21-point landmark list plus
//! a bounding box, using the standard hand topology (wrist at index 0, then
//! four joints per finger from base to tip).

use serde::{Deserialize, Serialize};

/// Number of landmarks in a full hand record
pub const LANDMARK_COUNT: usize = 21;

/// One 3D keypoint in video-space coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A single finger of the hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers, thumb first
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Landmark index of the finger's base joint
    pub fn base_index(&self) -> usize {
        match self {
            Finger::Thumb => 1,
            Finger::Index => 5,
            Finger::Middle => 9,
            Finger::Ring => 13,
            Finger::Pinky => 17,
        }
    }

    /// Landmark index of the finger's middle joint
    pub fn mid_index(&self) -> usize {
        self.base_index() + 1
    }

    /// Landmark index of the fingertip
    pub fn tip_index(&self) -> usize {
        self.base_index() + 3
    }
}

impl std::fmt::Display for Finger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finger::Thumb => write!(f, "thumb"),
            Finger::Index => write!(f, "index"),
            Finger::Middle => write!(f, "middle"),
            Finger::Ring => write!(f, "ring"),
            Finger::Pinky => write!(f, "pinky"),
        }
    }
}

/// Axis-aligned rectangle around a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner (x, y)
    pub top_left: (f32, f32),
    /// Bottom-right corner (x, y)
    pub bottom_right: (f32, f32),
}

impl BoundingBox {
    pub fn new(top_left: (f32, f32), bottom_right: (f32, f32)) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Smallest box containing all landmarks
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.is_empty() {
            return None;
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;

        for lm in landmarks {
            min_x = min_x.min(lm.x);
            min_y = min_y.min(lm.y);
            max_x = max_x.max(lm.x);
            max_y = max_y.max(lm.y);
        }

        Some(Self::new((min_x, min_y), (max_x, max_y)))
    }

    pub fn width(&self) -> f32 {
        self.bottom_right.0 - self.top_left.0
    }

    pub fn height(&self) -> f32 {
        self.bottom_right.1 - self.top_left.1
    }

    /// Scale from native video coordinates to display coordinates
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            top_left: (self.top_left.0 * sx, self.top_left.1 * sy),
            bottom_right: (self.bottom_right.0 * sx, self.bottom_right.1 * sy),
        }
    }
}

/// One detected hand: landmark list plus bounding box, both in native
/// video-space coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    pub landmarks: Vec<Landmark>,
    pub bounding_box: BoundingBox,
}

impl HandRecord {
    pub fn new(landmarks: Vec<Landmark>, bounding_box: BoundingBox) -> Self {
        Self {
            landmarks,
            bounding_box,
        }
    }

    /// Build a record with the bounding box derived from the landmarks
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Option<Self> {
        let bounding_box = BoundingBox::from_landmarks(&landmarks)?;
        Some(Self {
            landmarks,
            bounding_box,
        })
    }

    /// Landmark triple (base, mid, tip) for a finger, if present
    pub fn finger_joints(&self, finger: Finger) -> Option<(Landmark, Landmark, Landmark)> {
        let base = self.landmarks.get(finger.base_index())?;
        let mid = self.landmarks.get(finger.mid_index())?;
        let tip = self.landmarks.get(finger.tip_index())?;
        Some((*base, *mid, *tip))
    }
}
