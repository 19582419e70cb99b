//! Declarative gesture templates
//!
//! A gesture is described as immutable data: a set of per-finger curl and
//! direction constraints with weights. Templates are plain serde values so a
//! deployment can ship its own pose sequence without code changes.

use crate::gesture::landmarks::Finger;
use serde::{Deserialize, Serialize};

/// How far a finger is bent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerCurl {
    NoCurl,
    HalfCurl,
    FullCurl,
}

/// Which way a finger points, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerDirection {
    VerticalUp,
    VerticalDown,
    HorizontalLeft,
    HorizontalRight,
    DiagonalUpLeft,
    DiagonalUpRight,
    DiagonalDownLeft,
    DiagonalDownRight,
}

/// Required curl for one finger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurlRule {
    pub finger: Finger,
    pub curl: FingerCurl,
    pub weight: f32,
}

/// Required direction for one finger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionRule {
    pub finger: Finger,
    pub direction: FingerDirection,
    pub weight: f32,
}

/// One named gesture described by its finger constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    pub id: String,
    pub curl_rules: Vec<CurlRule>,
    pub direction_rules: Vec<DirectionRule>,
}

impl GestureTemplate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            curl_rules: Vec::new(),
            direction_rules: Vec::new(),
        }
    }

    pub fn with_curl(mut self, finger: Finger, curl: FingerCurl, weight: f32) -> Self {
        self.curl_rules.push(CurlRule {
            finger,
            curl,
            weight,
        });
        self
    }

    pub fn with_direction(
        mut self,
        finger: Finger,
        direction: FingerDirection,
        weight: f32,
    ) -> Self {
        self.direction_rules.push(DirectionRule {
            finger,
            direction,
            weight,
        });
        self
    }

    /// Sum of all rule weights
    pub fn total_weight(&self) -> f32 {
        let curls: f32 = self.curl_rules.iter().map(|r| r.weight).sum();
        let dirs: f32 = self.direction_rules.iter().map(|r| r.weight).sum();
        curls + dirs
    }
}

/// One target pose in the required sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSpec {
    /// Stable identifier, matches the template id
    pub id: String,
    /// Short human label for UI chips
    pub label: String,
    /// Instruction shown while this pose is the current target
    pub prompt: String,
    pub template: GestureTemplate,
}

/// The ordered sequence of poses a user must perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSequence {
    poses: Vec<PoseSpec>,
}

impl PoseSequence {
    pub fn new(poses: Vec<PoseSpec>) -> crate::Result<Self> {
        if poses.is_empty() {
            return Err(crate::MudraError::ConfigError(
                "pose sequence must contain at least one pose".to_string(),
            ));
        }
        for (i, pose) in poses.iter().enumerate() {
            if poses[..i].iter().any(|p| p.id == pose.id) {
                return Err(crate::MudraError::ConfigError(format!(
                    "duplicate pose id '{}' in sequence",
                    pose.id
                )));
            }
        }
        Ok(Self { poses })
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PoseSpec> {
        self.poses.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.poses.len() - 1
    }

    pub fn poses(&self) -> &[PoseSpec] {
        &self.poses
    }

    pub fn templates(&self) -> Vec<GestureTemplate> {
        self.poses.iter().map(|p| p.template.clone()).collect()
    }

    /// The built-in three-pose sequence: open palm, victory, three fingers up
    pub fn default_sequence() -> Self {
        let mut open_palm = GestureTemplate::new("open_palm");
        for finger in Finger::ALL {
            open_palm = open_palm.with_curl(finger, FingerCurl::NoCurl, 1.0);
        }
        for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
            open_palm = open_palm.with_direction(finger, FingerDirection::VerticalUp, 1.0);
        }

        let victory = GestureTemplate::new("victory")
            .with_curl(Finger::Index, FingerCurl::NoCurl, 1.0)
            .with_curl(Finger::Middle, FingerCurl::NoCurl, 1.0)
            .with_curl(Finger::Ring, FingerCurl::FullCurl, 1.0)
            .with_curl(Finger::Pinky, FingerCurl::FullCurl, 1.0)
            .with_curl(Finger::Thumb, FingerCurl::FullCurl, 1.0)
            .with_direction(Finger::Index, FingerDirection::VerticalUp, 1.0)
            .with_direction(Finger::Middle, FingerDirection::VerticalUp, 1.0);

        let mut three_fingers_up = GestureTemplate::new("three_fingers_up");
        for finger in [Finger::Index, Finger::Middle, Finger::Ring] {
            three_fingers_up = three_fingers_up
                .with_curl(finger, FingerCurl::NoCurl, 1.0)
                .with_direction(finger, FingerDirection::VerticalUp, 1.0);
        }
        for finger in [Finger::Thumb, Finger::Pinky] {
            three_fingers_up = three_fingers_up.with_curl(finger, FingerCurl::FullCurl, 1.0);
        }

        Self {
            poses: vec![
                PoseSpec {
                    id: "open_palm".to_string(),
                    label: "Open palm".to_string(),
                    prompt: "Show an open palm".to_string(),
                    template: open_palm,
                },
                PoseSpec {
                    id: "victory".to_string(),
                    label: "Victory".to_string(),
                    prompt: "Show a victory sign".to_string(),
                    template: victory,
                },
                PoseSpec {
                    id: "three_fingers_up".to_string(),
                    label: "Three fingers".to_string(),
                    prompt: "Show 3 fingers!".to_string(),
                    template: three_fingers_up,
                },
            ],
        }
    }
}

impl Default for PoseSequence {
    fn default() -> Self {
        Self::default_sequence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence_shape() {
        let seq = PoseSequence::default_sequence();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.last_index(), 2);
        assert_eq!(seq.get(0).unwrap().id, "open_palm");
        assert_eq!(seq.get(2).unwrap().id, "three_fingers_up");
    }

    #[test]
    fn test_default_sequence_ids_distinct() {
        let seq = PoseSequence::default_sequence();
        for (i, pose) in seq.poses().iter().enumerate() {
            assert!(!seq.poses()[..i].iter().any(|p| p.id == pose.id));
            assert_eq!(pose.id, pose.template.id);
        }
    }

    #[test]
    fn test_three_fingers_up_matches_source_rules() {
        let seq = PoseSequence::default_sequence();
        let template = &seq.get(2).unwrap().template;

        // index/middle/ring extended upward, thumb/pinky fully curled
        assert_eq!(template.curl_rules.len(), 5);
        assert_eq!(template.direction_rules.len(), 3);
        assert!(template
            .curl_rules
            .iter()
            .any(|r| r.finger == Finger::Thumb && r.curl == FingerCurl::FullCurl));
        assert!(template
            .direction_rules
            .iter()
            .all(|r| r.direction == FingerDirection::VerticalUp));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(PoseSequence::new(Vec::new()).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let pose = PoseSequence::default_sequence().get(0).unwrap().clone();
        let result = PoseSequence::new(vec![pose.clone(), pose]);
        assert!(result.is_err());
    }

    #[test]
    fn test_total_weight() {
        let template = GestureTemplate::new("t")
            .with_curl(Finger::Index, FingerCurl::NoCurl, 1.0)
            .with_direction(Finger::Index, FingerDirection::VerticalUp, 0.5);
        assert!((template.total_weight() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sequence_from_json() {
        let json = r#"{
            "poses": [{
                "id": "fist",
                "label": "Fist",
                "prompt": "Make a fist",
                "template": {
                    "id": "fist",
                    "curl_rules": [
                        { "finger": "Index", "curl": "FullCurl", "weight": 1.0 }
                    ],
                    "direction_rules": []
                }
            }]
        }"#;

        let seq: PoseSequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0).unwrap().template.curl_rules[0].curl, FingerCurl::FullCurl);
    }
}
