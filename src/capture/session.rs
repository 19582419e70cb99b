//! Capture session state machine
//!
//! This module is the single source of truth for one gesture capture
//! session. All transitions are pure methods on [`CaptureSession`]:
//! - **Worker**: applies detection/countdown ticks and upload results
//! - **Host UI**: reads snapshots for rendering, never mutates
//! - **Tests**: drive transitions directly, no timers or rendering involved
//!
//! The session moves through six phases: a user action starts detection,
//! each required pose must be held for a configured number of consecutive
//! matching ticks, the final pose triggers a countdown, the countdown
//! triggers the capture, and the captured still is uploaded on confirm.

use crate::capture::config::CaptureConfig;
use crate::gesture::estimator::GestureScore;
use crate::gesture::landmarks::BoundingBox;
use crate::gesture::template::{PoseSequence, PoseSpec};
use crate::video::EncodedImage;
use crate::{MudraError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Phase of a capture session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapturePhase {
    /// Waiting for the user to start
    #[default]
    Idle,
    /// Detection ticks are running against the current target pose
    Detecting,
    /// All poses confirmed, counting down to the shutter
    Countdown,
    /// A still has been captured, awaiting confirm or retake
    Captured,
    /// The still is being uploaded
    Uploading,
    /// Upload failed; the user may retake or retry
    UploadFailed,
}

impl CapturePhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, CapturePhase::Idle)
    }

    pub fn is_detecting(&self) -> bool {
        matches!(self, CapturePhase::Detecting)
    }

    pub fn is_countdown(&self) -> bool {
        matches!(self, CapturePhase::Countdown)
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, CapturePhase::Captured)
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, CapturePhase::Uploading)
    }

    pub fn is_upload_failed(&self) -> bool {
        matches!(self, CapturePhase::UploadFailed)
    }
}

impl std::fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapturePhase::Idle => write!(f, "Idle"),
            CapturePhase::Detecting => write!(f, "Detecting"),
            CapturePhase::Countdown => write!(f, "Countdown"),
            CapturePhase::Captured => write!(f, "Captured"),
            CapturePhase::Uploading => write!(f, "Uploading"),
            CapturePhase::UploadFailed => write!(f, "UploadFailed"),
        }
    }
}

/// Visual feedback for the hand bounding box
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PoseFeedback {
    /// No hand on screen
    #[default]
    None,
    /// The current target pose is being matched
    Match,
    /// A hand is visible but not matching the target
    Mismatch,
}

/// Integrated result of one detection tick
#[derive(Clone, Debug, PartialEq)]
pub enum TickInput {
    /// No hand was found in the frame
    NoHand,
    /// A hand was found; `best` is the top ranked gesture match, if any
    /// cleared the ranked-list floor
    Hand {
        /// Bounding box already scaled to display coordinates
        bounding_box: BoundingBox,
        best: Option<GestureScore>,
    },
}

/// What the driver must do after a detection tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick arrived outside the detecting phase and was dropped
    Ignored,
    /// Hold progress updated, nothing structural changed
    Progress,
    /// The target advanced to this pose index; prompts changed
    PoseAdvanced(usize),
    /// The last pose was confirmed; countdown must start
    SequenceComplete,
}

/// State of one gesture capture session
#[derive(Clone, Debug)]
pub struct CaptureSession {
    id: Uuid,
    config: CaptureConfig,
    poses: PoseSequence,

    model_ready: bool,
    model_failed: bool,

    phase: CapturePhase,
    current_pose_index: usize,
    completed_pose_indices: BTreeSet<usize>,
    hold_count: u32,
    hand_bounding_box: Option<BoundingBox>,
    feedback: PoseFeedback,
    countdown_value: Option<u32>,
    captured_image: Option<EncodedImage>,
    captured_at: Option<DateTime<Utc>>,
    status_message: String,
}

impl CaptureSession {
    /// Create a new session; the pose model is not yet loaded
    pub fn new(config: CaptureConfig, poses: PoseSequence) -> Result<Self> {
        config.validate().map_err(MudraError::ConfigError)?;

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            poses,
            model_ready: false,
            model_failed: false,
            phase: CapturePhase::Idle,
            current_pose_index: 0,
            completed_pose_indices: BTreeSet::new(),
            hold_count: 0,
            hand_bounding_box: None,
            feedback: PoseFeedback::None,
            countdown_value: None,
            captured_image: None,
            captured_at: None,
            status_message: "Loading hand pose model...".to_string(),
        })
    }

    // === Accessors ===

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn current_pose_index(&self) -> usize {
        self.current_pose_index
    }

    pub fn current_pose(&self) -> Option<&PoseSpec> {
        self.poses.get(self.current_pose_index)
    }

    pub fn pose_sequence(&self) -> &PoseSequence {
        &self.poses
    }

    pub fn completed_pose_indices(&self) -> &BTreeSet<usize> {
        &self.completed_pose_indices
    }

    pub fn hold_count(&self) -> u32 {
        self.hold_count
    }

    pub fn hand_bounding_box(&self) -> Option<BoundingBox> {
        self.hand_bounding_box
    }

    pub fn feedback(&self) -> PoseFeedback {
        self.feedback
    }

    pub fn countdown_value(&self) -> Option<u32> {
        self.countdown_value
    }

    pub fn captured_image(&self) -> Option<&EncodedImage> {
        self.captured_image.as_ref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn is_model_ready(&self) -> bool {
        self.model_ready
    }

    pub fn is_model_failed(&self) -> bool {
        self.model_failed
    }

    // === Model lifecycle ===

    /// The pose model finished loading
    pub fn model_loaded(&mut self) {
        self.model_ready = true;
        self.model_failed = false;
        self.status_message = self.ready_message();
    }

    /// The pose model failed to load. Fatal for this session: detection can
    /// never start and the host must reload.
    pub fn model_load_failed(&mut self) {
        self.model_ready = false;
        self.model_failed = true;
        self.status_message = "Error loading the hand pose model. Please refresh.".to_string();
    }

    // === User actions ===

    /// Start detecting; resets pose progress
    pub fn start(&mut self) -> Result<()> {
        if self.model_failed {
            return Err(MudraError::ModelLoadError(
                "hand pose model failed to load".to_string(),
            ));
        }
        if !self.model_ready {
            return Err(MudraError::SessionError(
                "hand pose model is still loading".to_string(),
            ));
        }
        if !self.phase.is_idle() {
            return Err(MudraError::SessionError(format!(
                "cannot start capture from phase {}",
                self.phase
            )));
        }

        self.phase = CapturePhase::Detecting;
        self.current_pose_index = 0;
        self.completed_pose_indices.clear();
        self.hold_count = 0;
        self.feedback = PoseFeedback::None;
        self.hand_bounding_box = None;
        self.countdown_value = None;
        self.captured_image = None;
        self.captured_at = None;
        self.status_message = self.pose_prompt(0);
        Ok(())
    }

    /// Discard any capture and return to idle. Valid from any phase; camera
    /// and model resources are untouched and reused on the next start.
    pub fn retake(&mut self) {
        self.phase = CapturePhase::Idle;
        self.current_pose_index = 0;
        self.completed_pose_indices.clear();
        self.hold_count = 0;
        self.feedback = PoseFeedback::None;
        self.hand_bounding_box = None;
        self.countdown_value = None;
        self.captured_image = None;
        self.captured_at = None;
        self.status_message = self.ready_message();
    }

    // === Detection ===

    /// Integrate one detection tick.
    ///
    /// Hold progress resets whenever the hand disappears, the best match is
    /// not the current target, or its score does not clear the acceptance
    /// threshold. Reaching the hold threshold confirms the pose: the target
    /// advances, or the countdown begins on the last pose.
    pub fn apply_tick(&mut self, input: TickInput) -> TickOutcome {
        if !self.phase.is_detecting() {
            return TickOutcome::Ignored;
        }

        match input {
            TickInput::NoHand => {
                self.hand_bounding_box = None;
                self.feedback = PoseFeedback::None;
                self.hold_count = 0;
                TickOutcome::Progress
            }
            TickInput::Hand {
                bounding_box,
                best,
            } => {
                self.hand_bounding_box = Some(bounding_box);

                let target_id = match self.current_pose() {
                    Some(pose) => pose.id.clone(),
                    None => return TickOutcome::Ignored,
                };

                let matched = best
                    .map(|gs| gs.id == target_id && gs.score > self.config.accept_threshold)
                    .unwrap_or(false);

                if !matched {
                    self.feedback = PoseFeedback::Mismatch;
                    self.hold_count = 0;
                    return TickOutcome::Progress;
                }

                self.feedback = PoseFeedback::Match;
                self.hold_count += 1;

                if self.hold_count < self.config.hold_threshold {
                    return TickOutcome::Progress;
                }

                // Pose confirmed
                self.hold_count = 0;
                self.completed_pose_indices.insert(self.current_pose_index);

                if self.current_pose_index == self.poses.last_index() {
                    self.phase = CapturePhase::Countdown;
                    self.countdown_value = Some(self.config.countdown_start);
                    self.status_message = "Hold still...".to_string();
                    TickOutcome::SequenceComplete
                } else {
                    self.current_pose_index += 1;
                    self.feedback = PoseFeedback::None;
                    self.status_message = self.pose_prompt(self.current_pose_index);
                    TickOutcome::PoseAdvanced(self.current_pose_index)
                }
            }
        }
    }

    // === Countdown & capture ===

    /// Decrement the countdown by one. Returns the new value; `Some(0)` means
    /// the shutter must fire now.
    pub fn countdown_tick(&mut self) -> Option<u32> {
        if !self.phase.is_countdown() {
            return None;
        }
        let value = self.countdown_value?.saturating_sub(1);
        self.countdown_value = Some(value);
        Some(value)
    }

    /// Store the captured still. Clears the countdown and stops detection.
    pub fn complete_capture(&mut self, image: EncodedImage) -> Result<()> {
        if !self.phase.is_countdown() {
            return Err(MudraError::SessionError(format!(
                "cannot complete capture from phase {}",
                self.phase
            )));
        }
        if self.captured_image.is_some() {
            return Err(MudraError::SessionError(
                "a still was already captured this attempt".to_string(),
            ));
        }
        if image.is_empty() {
            return Err(MudraError::CaptureError(
                "captured frame encoded to an empty image".to_string(),
            ));
        }

        self.captured_image = Some(image);
        self.captured_at = Some(Utc::now());
        self.countdown_value = None;
        self.phase = CapturePhase::Captured;
        self.feedback = PoseFeedback::None;
        self.hand_bounding_box = None;
        self.status_message = "Photo captured!".to_string();
        Ok(())
    }

    /// The frame grab at countdown zero yielded nothing. The stream evidently
    /// glitched, so pose progress is discarded and detection restarts from
    /// the first pose.
    pub fn capture_failed(&mut self) {
        self.phase = CapturePhase::Detecting;
        self.countdown_value = None;
        self.current_pose_index = 0;
        self.completed_pose_indices.clear();
        self.hold_count = 0;
        self.feedback = PoseFeedback::None;
        self.hand_bounding_box = None;
        self.status_message = format!("Capture failed. {}", self.pose_prompt(0));
    }

    // === Upload ===

    /// Begin uploading the captured still, returning the payload. Valid from
    /// `Captured`, and from `UploadFailed` as a retry.
    pub fn begin_upload(&mut self) -> Result<EncodedImage> {
        if !self.phase.is_captured() && !self.phase.is_upload_failed() {
            return Err(MudraError::SessionError(format!(
                "cannot upload from phase {}",
                self.phase
            )));
        }
        let image = match self.captured_image.clone() {
            Some(image) => image,
            None => {
                return Err(MudraError::SessionError(
                    "no captured image to upload".to_string(),
                ))
            }
        };

        self.phase = CapturePhase::Uploading;
        self.status_message = "Uploading...".to_string();
        Ok(image)
    }

    /// The upload succeeded; the session resets to idle for reuse
    pub fn upload_succeeded(&mut self) -> Result<()> {
        if !self.phase.is_uploading() {
            return Err(MudraError::SessionError(format!(
                "upload result arrived in phase {}",
                self.phase
            )));
        }
        self.retake();
        self.status_message = "Upload complete!".to_string();
        Ok(())
    }

    /// The upload failed; the collaborator's message is surfaced verbatim
    pub fn upload_failed(&mut self, message: impl Into<String>) -> Result<()> {
        if !self.phase.is_uploading() {
            return Err(MudraError::SessionError(format!(
                "upload result arrived in phase {}",
                self.phase
            )));
        }
        self.phase = CapturePhase::UploadFailed;
        self.status_message = message.into();
        Ok(())
    }

    // === Helpers ===

    fn ready_message(&self) -> String {
        match self.poses.get(0) {
            Some(pose) => format!("Ready to capture. {}", pose.prompt),
            None => "Ready to capture.".to_string(),
        }
    }

    fn pose_prompt(&self, index: usize) -> String {
        match self.poses.get(index) {
            Some(pose) => format!("Pose {}/{}: {}", index + 1, self.poses.len(), pose.prompt),
            None => String::new(),
        }
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            id: self.id,
            phase: self.phase,
            current_pose_index: self.current_pose_index,
            completed_pose_indices: self.completed_pose_indices.iter().copied().collect(),
            hold_count: self.hold_count,
            hand_bounding_box: self.hand_bounding_box,
            feedback: self.feedback,
            countdown_value: self.countdown_value,
            captured_image: self.captured_image.clone(),
            captured_at: self.captured_at,
            status_message: self.status_message.clone(),
            model_ready: self.model_ready,
            model_failed: self.model_failed,
        }
    }
}

/// Immutable snapshot of session state, for rendering and assertions
#[derive(Clone, Debug)]
pub struct CaptureSnapshot {
    pub id: Uuid,
    pub phase: CapturePhase,
    pub current_pose_index: usize,
    pub completed_pose_indices: Vec<usize>,
    pub hold_count: u32,
    pub hand_bounding_box: Option<BoundingBox>,
    pub feedback: PoseFeedback,
    pub countdown_value: Option<u32>,
    pub captured_image: Option<EncodedImage>,
    pub captured_at: Option<DateTime<Utc>>,
    pub status_message: String,
    pub model_ready: bool,
    pub model_failed: bool,
}

/// Thread-safe shared session state
#[derive(Clone)]
pub struct SharedCaptureState {
    inner: Arc<RwLock<CaptureSession>>,
}

impl SharedCaptureState {
    pub fn new(session: CaptureSession) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Get a read lock on the session
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, CaptureSession> {
        self.inner.read()
    }

    /// Get a write lock on the session
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, CaptureSession> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.inner.read().snapshot()
    }

    pub fn phase(&self) -> CapturePhase {
        self.inner.read().phase()
    }

    pub fn status_message(&self) -> String {
        self.inner.read().status_message().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::StillFormat;

    fn ready_session() -> CaptureSession {
        let mut session =
            CaptureSession::new(CaptureConfig::default(), PoseSequence::default_sequence())
                .unwrap();
        session.model_loaded();
        session
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new((10.0, 10.0), (110.0, 130.0))
    }

    fn match_tick(id: &str, score: f32) -> TickInput {
        TickInput::Hand {
            bounding_box: bbox(),
            best: Some(GestureScore {
                id: id.to_string(),
                score,
            }),
        }
    }

    fn still() -> EncodedImage {
        EncodedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            format: StillFormat::Jpeg,
        }
    }

    /// Drive a started session through confirmation of the current pose
    fn confirm_current_pose(session: &mut CaptureSession) -> TickOutcome {
        let id = session.current_pose().unwrap().id.clone();
        let mut outcome = TickOutcome::Progress;
        for _ in 0..session.config().hold_threshold {
            outcome = session.apply_tick(match_tick(&id, 0.95));
        }
        outcome
    }

    #[test]
    fn test_start_requires_loaded_model() {
        let mut session =
            CaptureSession::new(CaptureConfig::default(), PoseSequence::default_sequence())
                .unwrap();
        assert!(session.start().is_err());

        session.model_loaded();
        assert!(session.start().is_ok());
        assert!(session.phase().is_detecting());
    }

    #[test]
    fn test_model_load_failure_is_fatal() {
        let mut session =
            CaptureSession::new(CaptureConfig::default(), PoseSequence::default_sequence())
                .unwrap();
        session.model_load_failed();

        let err = session.start().unwrap_err();
        assert!(!err.is_recoverable());
        assert!(session.status_message().contains("refresh"));
        assert!(session.phase().is_idle());
    }

    #[test]
    fn test_no_hand_resets_hold_and_feedback() {
        let mut session = ready_session();
        session.start().unwrap();

        session.apply_tick(match_tick("open_palm", 0.95));
        session.apply_tick(match_tick("open_palm", 0.95));
        assert_eq!(session.hold_count(), 2);
        assert_eq!(session.feedback(), PoseFeedback::Match);

        session.apply_tick(TickInput::NoHand);
        assert_eq!(session.hold_count(), 0);
        assert_eq!(session.feedback(), PoseFeedback::None);
        assert!(session.hand_bounding_box().is_none());
    }

    #[test]
    fn test_wrong_pose_resets_hold() {
        let mut session = ready_session();
        session.start().unwrap();

        session.apply_tick(match_tick("open_palm", 0.95));
        assert_eq!(session.hold_count(), 1);

        session.apply_tick(match_tick("victory", 0.95));
        assert_eq!(session.hold_count(), 0);
        assert_eq!(session.feedback(), PoseFeedback::Mismatch);
        assert!(session.hand_bounding_box().is_some());
    }

    #[test]
    fn test_score_at_threshold_is_a_mismatch() {
        let mut session = ready_session();
        session.start().unwrap();

        session.apply_tick(match_tick("open_palm", 0.9));
        assert_eq!(session.hold_count(), 0);
        assert_eq!(session.feedback(), PoseFeedback::Mismatch);
    }

    #[test]
    fn test_no_ranked_match_is_a_mismatch() {
        let mut session = ready_session();
        session.start().unwrap();

        session.apply_tick(TickInput::Hand {
            bounding_box: bbox(),
            best: None,
        });
        assert_eq!(session.feedback(), PoseFeedback::Mismatch);
        assert_eq!(session.hold_count(), 0);
    }

    #[test]
    fn test_holding_first_pose_advances_target() {
        let mut session = ready_session();
        session.start().unwrap();

        for i in 1..5 {
            let outcome = session.apply_tick(match_tick("open_palm", 0.95));
            assert_eq!(outcome, TickOutcome::Progress);
            assert_eq!(session.hold_count(), i);
        }

        let outcome = session.apply_tick(match_tick("open_palm", 0.95));
        assert_eq!(outcome, TickOutcome::PoseAdvanced(1));
        assert_eq!(session.current_pose_index(), 1);
        assert_eq!(session.hold_count(), 0);
        assert!(session.completed_pose_indices().contains(&0));
        assert!(session.status_message().contains("victory sign"));
        assert_eq!(session.feedback(), PoseFeedback::None);
    }

    #[test]
    fn test_holding_last_pose_starts_countdown() {
        let mut session = ready_session();
        session.start().unwrap();

        assert_eq!(confirm_current_pose(&mut session), TickOutcome::PoseAdvanced(1));
        assert_eq!(confirm_current_pose(&mut session), TickOutcome::PoseAdvanced(2));
        assert_eq!(confirm_current_pose(&mut session), TickOutcome::SequenceComplete);

        assert!(session.phase().is_countdown());
        assert_eq!(session.countdown_value(), Some(3));
        assert_eq!(session.completed_pose_indices().len(), 3);
    }

    #[test]
    fn test_countdown_decrements_to_zero_then_captures() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }

        assert_eq!(session.countdown_tick(), Some(2));
        assert_eq!(session.countdown_tick(), Some(1));
        assert_eq!(session.countdown_tick(), Some(0));

        session.complete_capture(still()).unwrap();
        assert!(session.phase().is_captured());
        assert!(session.countdown_value().is_none());
        assert!(session.captured_image().is_some());
        assert_eq!(session.status_message(), "Photo captured!");
    }

    #[test]
    fn test_capture_fires_at_most_once_per_attempt() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        while session.countdown_tick() != Some(0) {}

        session.complete_capture(still()).unwrap();
        assert!(session.complete_capture(still()).is_err());
    }

    #[test]
    fn test_capture_failure_restarts_detection() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        while session.countdown_tick() != Some(0) {}

        session.capture_failed();
        assert!(session.phase().is_detecting());
        assert!(session.countdown_value().is_none());
        assert_eq!(session.current_pose_index(), 0);
        assert!(session.completed_pose_indices().is_empty());
        assert!(session.captured_image().is_none());
    }

    #[test]
    fn test_ticks_outside_detecting_are_ignored() {
        let mut session = ready_session();
        assert_eq!(
            session.apply_tick(match_tick("open_palm", 0.95)),
            TickOutcome::Ignored
        );

        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        // now in countdown
        assert_eq!(
            session.apply_tick(match_tick("three_fingers_up", 0.95)),
            TickOutcome::Ignored
        );
        assert_eq!(session.countdown_value(), Some(3));
    }

    #[test]
    fn test_retake_resets_everything() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        while session.countdown_tick() != Some(0) {}
        session.complete_capture(still()).unwrap();

        session.retake();
        assert!(session.phase().is_idle());
        assert_eq!(session.current_pose_index(), 0);
        assert!(session.completed_pose_indices().is_empty());
        assert!(session.captured_image().is_none());
        assert!(session.countdown_value().is_none());
        assert_eq!(session.hold_count(), 0);

        // the session is reusable
        assert!(session.start().is_ok());
    }

    #[test]
    fn test_retake_cancels_pending_countdown() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        assert!(session.countdown_value().is_some());

        session.retake();
        assert!(session.countdown_value().is_none());
        assert!(session.phase().is_idle());
    }

    #[test]
    fn test_upload_failure_surfaces_exact_message() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        while session.countdown_tick() != Some(0) {}
        session.complete_capture(still()).unwrap();

        session.begin_upload().unwrap();
        assert!(session.phase().is_uploading());
        assert_eq!(session.status_message(), "Uploading...");

        session
            .upload_failed("Storage error: bucket not found")
            .unwrap();
        assert!(session.phase().is_upload_failed());
        assert_eq!(session.status_message(), "Storage error: bucket not found");

        // retry is allowed without retaking
        assert!(session.begin_upload().is_ok());
        session.upload_succeeded().unwrap();
        assert!(session.phase().is_idle());
        assert!(session.captured_image().is_none());
    }

    #[test]
    fn test_upload_requires_captured_image() {
        let mut session = ready_session();
        assert!(session.begin_upload().is_err());

        session.start().unwrap();
        assert!(session.begin_upload().is_err());
    }

    #[test]
    fn test_start_is_rejected_while_detecting() {
        let mut session = ready_session();
        session.start().unwrap();
        assert!(session.start().is_err());
    }

    #[test]
    fn test_pose_index_stays_in_range() {
        let mut session = ready_session();
        session.start().unwrap();

        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        assert!(session.current_pose_index() < session.pose_sequence().len());
    }

    #[test]
    fn test_shared_state_snapshot_is_independent() {
        let shared = SharedCaptureState::new(ready_session());

        let before = shared.snapshot();
        assert!(before.phase.is_idle());

        shared.write().start().unwrap();

        assert!(before.phase.is_idle());
        assert!(shared.snapshot().phase.is_detecting());
    }

    #[test]
    fn test_empty_still_rejected() {
        let mut session = ready_session();
        session.start().unwrap();
        for _ in 0..3 {
            confirm_current_pose(&mut session);
        }
        while session.countdown_tick() != Some(0) {}

        let empty = EncodedImage {
            bytes: Vec::new(),
            format: StillFormat::Jpeg,
        };
        assert!(session.complete_capture(empty).is_err());
        assert!(session.phase().is_countdown());
    }
}
