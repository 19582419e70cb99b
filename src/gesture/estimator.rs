//! Gesture matching
//!
//! Turns a hand landmark record into ranked gesture scores. Finger curl is
//! classified from the bend angle at the finger's middle joint, direction
//! from the base-to-tip vector. A template's score is the weighted fraction
//! of its satisfied rules, so scores are always in [0, 1].

use crate::gesture::landmarks::{Finger, HandRecord, Landmark};
use crate::gesture::template::{FingerCurl, FingerDirection, GestureTemplate};
use serde::{Deserialize, Serialize};

/// Bend angle above which a finger counts as straight, in degrees
const NO_CURL_MIN_ANGLE: f32 = 130.0;
/// Bend angle below which a finger counts as fully curled, in degrees
const FULL_CURL_MAX_ANGLE: f32 = 60.0;

/// Score for one template against one hand record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScore {
    pub id: String,
    /// Fraction of satisfied rule weight, in [0, 1]
    pub score: f32,
}

/// Classify a finger's curl from its (base, mid, tip) joints.
///
/// The angle at the middle joint is ~180 degrees for a straight finger and
/// shrinks toward 0 as the tip folds back onto the base.
pub fn estimate_curl(base: Landmark, mid: Landmark, tip: Landmark) -> FingerCurl {
    let v1 = (base.x - mid.x, base.y - mid.y, base.z - mid.z);
    let v2 = (tip.x - mid.x, tip.y - mid.y, tip.z - mid.z);

    let dot = v1.0 * v2.0 + v1.1 * v2.1 + v1.2 * v2.2;
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1 + v1.2 * v1.2).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1 + v2.2 * v2.2).sqrt();

    if n1 == 0.0 || n2 == 0.0 {
        return FingerCurl::FullCurl;
    }

    let angle = (dot / (n1 * n2)).clamp(-1.0, 1.0).acos().to_degrees();

    if angle >= NO_CURL_MIN_ANGLE {
        FingerCurl::NoCurl
    } else if angle >= FULL_CURL_MAX_ANGLE {
        FingerCurl::HalfCurl
    } else {
        FingerCurl::FullCurl
    }
}

/// Classify a finger's pointing direction from its base-to-tip vector.
///
/// Screen coordinates: y grows downward. Sectors are 45 degrees wide,
/// centered on the eight compass directions.
pub fn estimate_direction(base: Landmark, tip: Landmark) -> FingerDirection {
    let dx = tip.x - base.x;
    let dy = base.y - tip.y; // flip so positive = up

    let angle = dy.atan2(dx).to_degrees();

    match angle {
        a if (67.5..112.5).contains(&a) => FingerDirection::VerticalUp,
        a if (22.5..67.5).contains(&a) => FingerDirection::DiagonalUpRight,
        a if (112.5..157.5).contains(&a) => FingerDirection::DiagonalUpLeft,
        a if (-22.5..22.5).contains(&a) => FingerDirection::HorizontalRight,
        a if (-67.5..-22.5).contains(&a) => FingerDirection::DiagonalDownRight,
        a if (-112.5..-67.5).contains(&a) => FingerDirection::VerticalDown,
        a if (-157.5..-112.5).contains(&a) => FingerDirection::DiagonalDownLeft,
        _ => FingerDirection::HorizontalLeft,
    }
}

/// Matches hand records against a fixed set of gesture templates
#[derive(Debug, Clone)]
pub struct GestureEstimator {
    templates: Vec<GestureTemplate>,
}

impl GestureEstimator {
    pub fn new(templates: Vec<GestureTemplate>) -> Self {
        Self { templates }
    }

    /// Score every template against the hand and return matches at or above
    /// `min_score`, ranked best-first.
    ///
    /// The ranking is deterministic: a stable sort by descending score, so
    /// templates that tie resolve to their declaration order.
    pub fn estimate(&self, hand: &HandRecord, min_score: f32) -> Vec<GestureScore> {
        let curls: Vec<(Finger, FingerCurl)> = Finger::ALL
            .iter()
            .filter_map(|&finger| {
                hand.finger_joints(finger)
                    .map(|(base, mid, tip)| (finger, estimate_curl(base, mid, tip)))
            })
            .collect();
        let directions: Vec<(Finger, FingerDirection)> = Finger::ALL
            .iter()
            .filter_map(|&finger| {
                hand.finger_joints(finger)
                    .map(|(base, _, tip)| (finger, estimate_direction(base, tip)))
            })
            .collect();

        let mut scores: Vec<GestureScore> = self
            .templates
            .iter()
            .map(|template| GestureScore {
                id: template.id.clone(),
                score: score_template(template, &curls, &directions),
            })
            .filter(|gs| gs.score >= min_score)
            .collect();

        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scores
    }

    /// Best match at or above `min_score`, if any
    pub fn best_match(&self, hand: &HandRecord, min_score: f32) -> Option<GestureScore> {
        self.estimate(hand, min_score).into_iter().next()
    }

    pub fn templates(&self) -> &[GestureTemplate] {
        &self.templates
    }
}

fn score_template(
    template: &GestureTemplate,
    curls: &[(Finger, FingerCurl)],
    directions: &[(Finger, FingerDirection)],
) -> f32 {
    let total = template.total_weight();
    if total <= 0.0 {
        return 0.0;
    }

    let mut achieved = 0.0;
    for rule in &template.curl_rules {
        if curls
            .iter()
            .any(|&(finger, curl)| finger == rule.finger && curl == rule.curl)
        {
            achieved += rule.weight;
        }
    }
    for rule in &template.direction_rules {
        if directions
            .iter()
            .any(|&(finger, direction)| finger == rule.finger && direction == rule.direction)
        {
            achieved += rule.weight;
        }
    }

    achieved / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::template::PoseSequence;
    use crate::gesture::testkit::{synthetic_hand, FingerShape};

    fn lm(x: f32, y: f32) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    #[test]
    fn test_curl_straight_finger() {
        // base below mid below tip: angle at mid is 180 degrees
        let curl = estimate_curl(lm(0.0, 150.0), lm(0.0, 120.0), lm(0.0, 80.0));
        assert_eq!(curl, FingerCurl::NoCurl);
    }

    #[test]
    fn test_curl_folded_finger() {
        // tip folded back alongside the base
        let curl = estimate_curl(lm(0.0, 150.0), lm(0.0, 130.0), lm(0.0, 152.0));
        assert_eq!(curl, FingerCurl::FullCurl);
    }

    #[test]
    fn test_curl_half_bent_finger() {
        // tip at a right angle to the base segment
        let curl = estimate_curl(lm(0.0, 150.0), lm(0.0, 130.0), lm(30.0, 130.0));
        assert_eq!(curl, FingerCurl::HalfCurl);
    }

    #[test]
    fn test_direction_sectors() {
        let base = lm(100.0, 100.0);
        assert_eq!(
            estimate_direction(base, lm(100.0, 40.0)),
            FingerDirection::VerticalUp
        );
        assert_eq!(
            estimate_direction(base, lm(100.0, 160.0)),
            FingerDirection::VerticalDown
        );
        assert_eq!(
            estimate_direction(base, lm(160.0, 100.0)),
            FingerDirection::HorizontalRight
        );
        assert_eq!(
            estimate_direction(base, lm(40.0, 100.0)),
            FingerDirection::HorizontalLeft
        );
        assert_eq!(
            estimate_direction(base, lm(160.0, 40.0)),
            FingerDirection::DiagonalUpRight
        );
        assert_eq!(
            estimate_direction(base, lm(40.0, 160.0)),
            FingerDirection::DiagonalDownLeft
        );
    }

    #[test]
    fn test_each_pose_scores_full_against_own_template() {
        let seq = PoseSequence::default_sequence();
        let estimator = GestureEstimator::new(seq.templates());

        let shapes = [
            FingerShape::open_palm(),
            FingerShape::victory(),
            FingerShape::three_fingers_up(),
        ];

        for (i, shape) in shapes.iter().enumerate() {
            let hand = synthetic_hand(shape);
            let best = estimator.best_match(&hand, 0.0).unwrap();
            assert_eq!(best.id, seq.get(i).unwrap().id, "pose index {}", i);
            assert!(best.score > 0.99, "pose index {} score {}", i, best.score);
        }
    }

    #[test]
    fn test_cross_pose_scores_stay_below_acceptance() {
        let seq = PoseSequence::default_sequence();
        let estimator = GestureEstimator::new(seq.templates());

        let shapes = [
            FingerShape::open_palm(),
            FingerShape::victory(),
            FingerShape::three_fingers_up(),
        ];

        for (i, shape) in shapes.iter().enumerate() {
            let hand = synthetic_hand(shape);
            for score in estimator.estimate(&hand, 0.0) {
                if score.id != seq.get(i).unwrap().id {
                    assert!(
                        score.score < 0.9,
                        "pose {} scored {} against {}",
                        i,
                        score.score,
                        score.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_min_score_filters_ranked_list() {
        let seq = PoseSequence::default_sequence();
        let estimator = GestureEstimator::new(seq.templates());
        let hand = synthetic_hand(&FingerShape::open_palm());

        let all = estimator.estimate(&hand, 0.0);
        let filtered = estimator.estimate(&hand, 0.95);
        assert!(all.len() > filtered.len());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "open_palm");
    }

    #[test]
    fn test_ranking_is_best_first() {
        let seq = PoseSequence::default_sequence();
        let estimator = GestureEstimator::new(seq.templates());
        let hand = synthetic_hand(&FingerShape::three_fingers_up());

        let ranked = estimator.estimate(&hand, 0.0);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(ranked[0].id, "three_fingers_up");
    }

    #[test]
    fn test_tie_break_is_declaration_order() {
        // two identical templates under different ids: same score, first wins
        let seq = PoseSequence::default_sequence();
        let mut twin = seq.get(0).unwrap().template.clone();
        twin.id = "open_palm_twin".to_string();
        let estimator = GestureEstimator::new(vec![seq.get(0).unwrap().template.clone(), twin]);

        let hand = synthetic_hand(&FingerShape::open_palm());
        let ranked = estimator.estimate(&hand, 0.0);
        assert_eq!(ranked[0].id, "open_palm");
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn test_empty_template_scores_zero() {
        let estimator = GestureEstimator::new(vec![GestureTemplate::new("empty")]);
        let hand = synthetic_hand(&FingerShape::open_palm());
        assert!(estimator.best_match(&hand, 0.1).is_none());
    }
}
