//! Capture worker: the drive loop behind a session
//!
//! Runs a single worker thread that multiplexes user commands with two
//! explicit timers: the detection interval (armed only while detecting) and
//! the countdown interval (armed only while counting down). All session
//! mutation happens on this one thread, so detection and countdown ticks
//! interleave but never overlap, and the result of each collaborator call is
//! integrated against current state the moment it returns.

use crate::capture::config::CaptureConfig;
use crate::capture::session::{
    CaptureSession, CaptureSnapshot, SharedCaptureState, TickInput, TickOutcome,
};
use crate::gesture::estimator::GestureEstimator;
use crate::gesture::pose::PoseEstimator;
use crate::gesture::template::PoseSequence;
use crate::upload::{avatar_filename, AvatarUploader};
use crate::video::{encode_jpeg, FrameSource, VideoFrame};
use crate::{MudraError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Longest the loop sleeps when no timer is armed
const MAX_IDLE_WAIT: Duration = Duration::from_millis(50);

/// A cancellable repeating timer, held as an explicit field rather than a
/// captured closure so every phase transition can cancel it directly.
#[derive(Debug)]
pub struct IntervalTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// Arm the timer. Always overwrites any prior deadline, so at most one
    /// schedule exists per timer.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// If the deadline has passed, advance it by one period and report true.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

/// User actions on a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    /// Begin the pose sequence
    Start,
    /// Discard progress/capture and return to idle
    Retake,
    /// Confirm the captured still and upload it
    Submit,
    /// Stop the worker
    Shutdown,
}

/// Events emitted by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The pose model finished loading
    ModelReady,
    /// Detection ticks started
    DetectionStarted,
    /// The target advanced to this pose index
    PoseAdvanced { index: usize },
    /// All poses confirmed; the countdown is running
    CountdownStarted,
    /// Countdown value changed
    CountdownTick { value: u32 },
    /// A still was captured
    Captured,
    /// Upload succeeded; `url` is for the host's capture callback
    Uploaded { url: String },
    /// Upload failed with the collaborator's message
    UploadFailed { message: String },
    /// A user-visible error occurred
    Error { message: String },
    /// The worker has shut down
    Shutdown,
}

/// Handle for controlling the worker from the host UI
pub struct CaptureHandle {
    command_tx: Sender<CaptureCommand>,
    event_rx: Receiver<CaptureEvent>,
    state: SharedCaptureState,
}

impl CaptureHandle {
    /// Send a command to the worker
    pub fn send_command(&self, cmd: CaptureCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| MudraError::ChannelError(format!("failed to send command: {}", e)))
    }

    /// Begin the pose sequence
    pub fn start(&self) -> Result<()> {
        self.send_command(CaptureCommand::Start)
    }

    /// Discard and return to idle
    pub fn retake(&self) -> Result<()> {
        self.send_command(CaptureCommand::Retake)
    }

    /// Confirm and upload the captured still
    pub fn submit(&self) -> Result<()> {
        self.send_command(CaptureCommand::Submit)
    }

    /// Stop the worker
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(CaptureCommand::Shutdown)
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<CaptureEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, waiting up to `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<CaptureEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Shared session state for rendering
    pub fn state(&self) -> &SharedCaptureState {
        &self.state
    }

    /// Snapshot of the current session
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.state.snapshot()
    }
}

/// Worker that owns the collaborators and drives one capture session
pub struct CaptureWorker {
    config: CaptureConfig,
    state: SharedCaptureState,
    matcher: GestureEstimator,
    estimator: Box<dyn PoseEstimator>,
    frames: Box<dyn FrameSource>,
    uploader: Box<dyn AvatarUploader>,
    command_rx: Receiver<CaptureCommand>,
    event_tx: Sender<CaptureEvent>,
}

impl CaptureWorker {
    /// Create a worker and its handle
    pub fn new(
        config: CaptureConfig,
        poses: PoseSequence,
        estimator: Box<dyn PoseEstimator>,
        frames: Box<dyn FrameSource>,
        uploader: Box<dyn AvatarUploader>,
    ) -> Result<(Self, CaptureHandle)> {
        let matcher = GestureEstimator::new(poses.templates());
        let session = CaptureSession::new(config.clone(), poses)?;
        let state = SharedCaptureState::new(session);

        let (command_tx, command_rx) = bounded(config.channel_buffer_size);
        let (event_tx, event_rx) = bounded(config.channel_buffer_size);

        let handle = CaptureHandle {
            command_tx,
            event_rx,
            state: state.clone(),
        };

        let worker = Self {
            config,
            state,
            matcher,
            estimator,
            frames,
            uploader,
            command_rx,
            event_tx,
        };

        Ok((worker, handle))
    }

    /// Start the worker thread. Returns its join handle.
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) {
        info!("Capture worker started");

        match self.estimator.ensure_loaded() {
            Ok(()) => {
                self.state.write().model_loaded();
                self.emit(CaptureEvent::ModelReady);
                info!("Pose model loaded");
            }
            Err(e) => {
                self.state.write().model_load_failed();
                self.emit(CaptureEvent::Error {
                    message: e.user_message(),
                });
                error!("Pose model failed to load: {}", e);
            }
        }

        let mut detection = IntervalTimer::new(self.config.detection_interval());
        let mut countdown = IntervalTimer::new(self.config.countdown_interval());

        loop {
            let timeout = next_timeout(&detection, &countdown);
            match self.command_rx.recv_timeout(timeout) {
                Ok(cmd) => {
                    if !self.handle_command(cmd, &mut detection, &mut countdown) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command channel disconnected");
                    break;
                }
            }

            if detection.fire(Instant::now()) {
                if self.state.phase().is_detecting() {
                    self.detection_tick(&mut detection, &mut countdown);
                } else {
                    detection.cancel();
                }
            }

            if countdown.fire(Instant::now()) {
                if self.state.phase().is_countdown() {
                    self.countdown_tick(&mut detection, &mut countdown);
                } else {
                    countdown.cancel();
                }
            }
        }

        detection.cancel();
        countdown.cancel();
        self.emit(CaptureEvent::Shutdown);
        info!("Capture worker stopped");
    }

    /// Returns false when the worker should stop
    fn handle_command(
        &mut self,
        cmd: CaptureCommand,
        detection: &mut IntervalTimer,
        countdown: &mut IntervalTimer,
    ) -> bool {
        match cmd {
            CaptureCommand::Start => match self.state.write().start() {
                Ok(()) => {
                    countdown.cancel();
                    detection.arm(Instant::now());
                    self.emit(CaptureEvent::DetectionStarted);
                    debug!("Detection started");
                }
                Err(e) => {
                    debug!("Start rejected: {}", e);
                    self.emit(CaptureEvent::Error {
                        message: e.user_message(),
                    });
                }
            },
            CaptureCommand::Retake => {
                detection.cancel();
                countdown.cancel();
                self.state.write().retake();
                debug!("Session reset");
            }
            CaptureCommand::Submit => self.submit(),
            CaptureCommand::Shutdown => {
                detection.cancel();
                countdown.cancel();
                info!("Capture worker shutdown requested");
                return false;
            }
        }
        true
    }

    /// One detection tick: grab a frame, find a hand, match the target pose,
    /// and integrate the result into the session.
    fn detection_tick(&mut self, detection: &mut IntervalTimer, countdown: &mut IntervalTimer) {
        let frame = match self.frames.grab_frame() {
            Ok(Some(frame)) => frame,
            // stream not ready yet, the tick is a no-op
            Ok(None) => return,
            Err(e) => {
                warn!("Frame grab failed: {}", e);
                self.emit(CaptureEvent::Error {
                    message: e.user_message(),
                });
                return;
            }
        };

        let hand = match self.estimator.estimate_hands(&frame) {
            Ok(hand) => hand,
            Err(e) => {
                warn!("Hand estimation failed: {}", e);
                self.emit(CaptureEvent::Error {
                    message: e.user_message(),
                });
                return;
            }
        };

        let input = match hand {
            None => TickInput::NoHand,
            Some(record) => {
                let (sx, sy) = self.display_scale(&frame);
                let bounding_box = record.bounding_box.scaled(sx, sy);
                let best = self.matcher.best_match(&record, self.config.min_match_score);
                TickInput::Hand { bounding_box, best }
            }
        };

        match self.state.write().apply_tick(input) {
            TickOutcome::PoseAdvanced(index) => {
                debug!("Advanced to pose {}", index);
                self.emit(CaptureEvent::PoseAdvanced { index });
            }
            TickOutcome::SequenceComplete => {
                info!("Pose sequence complete, starting countdown");
                detection.cancel();
                countdown.arm(Instant::now());
                self.emit(CaptureEvent::CountdownStarted);
            }
            TickOutcome::Progress | TickOutcome::Ignored => {}
        }
    }

    /// One countdown tick; fires the shutter on reaching zero.
    fn countdown_tick(&mut self, detection: &mut IntervalTimer, countdown: &mut IntervalTimer) {
        let value = match self.state.write().countdown_tick() {
            Some(value) => value,
            None => {
                countdown.cancel();
                return;
            }
        };
        self.emit(CaptureEvent::CountdownTick { value });
        if value > 0 {
            return;
        }

        countdown.cancel();
        let grabbed = match self.frames.grab_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame grab failed at countdown end: {}", e);
                None
            }
        };

        let result = match grabbed {
            Some(frame) => encode_jpeg(&frame, self.config.jpeg_quality)
                .and_then(|image| self.state.write().complete_capture(image)),
            None => Err(MudraError::CaptureError(
                "the video stream produced no frame".to_string(),
            )),
        };

        match result {
            Ok(()) => {
                info!("Still captured");
                self.emit(CaptureEvent::Captured);
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.state.write().capture_failed();
                detection.arm(Instant::now());
                self.emit(CaptureEvent::Error {
                    message: e.user_message(),
                });
            }
        }
    }

    /// Upload the captured still and integrate the result.
    fn submit(&mut self) {
        let image = match self.state.write().begin_upload() {
            Ok(image) => image,
            Err(e) => {
                // mirrors the UI guard: submitting without a capture is a no-op
                debug!("Submit ignored: {}", e);
                return;
            }
        };

        let filename = avatar_filename();
        info!("Uploading {} ({} bytes)", filename, image.len());

        match self.uploader.upload_avatar(&filename, &image) {
            Ok(response) => {
                if let Err(e) = self.state.write().upload_succeeded() {
                    warn!("Upload result arrived in unexpected phase: {}", e);
                }
                info!("Upload complete: {}", response.public_url);
                self.emit(CaptureEvent::Uploaded {
                    url: response.public_url,
                });
            }
            Err(e) => {
                let message = match &e {
                    MudraError::UploadError(message) => message.clone(),
                    other => other.user_message(),
                };
                if let Err(e) = self.state.write().upload_failed(message.clone()) {
                    warn!("Upload result arrived in unexpected phase: {}", e);
                }
                warn!("Upload failed: {}", message);
                self.emit(CaptureEvent::UploadFailed { message });
            }
        }
    }

    fn display_scale(&self, frame: &VideoFrame) -> (f32, f32) {
        match self.config.display_size {
            Some((dw, dh)) => {
                let (nw, nh) = frame.size();
                if nw == 0 || nh == 0 {
                    (1.0, 1.0)
                } else {
                    (dw as f32 / nw as f32, dh as f32 / nh as f32)
                }
            }
            None => (1.0, 1.0),
        }
    }

    fn emit(&self, event: CaptureEvent) {
        if self.event_tx.try_send(event).is_err() {
            debug!("Event channel full or closed, dropping event");
        }
    }
}

/// Builder for creating a capture worker
pub struct CaptureWorkerBuilder {
    config: CaptureConfig,
    poses: PoseSequence,
}

impl CaptureWorkerBuilder {
    /// Create a new builder with defaults: production tunables and the
    /// built-in three-pose sequence
    pub fn new() -> Self {
        Self {
            config: CaptureConfig::default(),
            poses: PoseSequence::default_sequence(),
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required pose sequence
    pub fn with_poses(mut self, poses: PoseSequence) -> Self {
        self.poses = poses;
        self
    }

    /// Build the worker with the given collaborators
    pub fn build(
        self,
        estimator: Box<dyn PoseEstimator>,
        frames: Box<dyn FrameSource>,
        uploader: Box<dyn AvatarUploader>,
    ) -> Result<(CaptureWorker, CaptureHandle)> {
        CaptureWorker::new(self.config, self.poses, estimator, frames, uploader)
    }
}

impl Default for CaptureWorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn next_timeout(detection: &IntervalTimer, countdown: &IntervalTimer) -> Duration {
    let now = Instant::now();
    let earliest = match (detection.deadline(), countdown.deadline()) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    match earliest {
        Some(deadline) => deadline.saturating_duration_since(now).min(MAX_IDLE_WAIT),
        None => MAX_IDLE_WAIT,
    }
}
