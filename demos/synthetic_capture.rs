//! Runs the full gesture capture flow against synthetic collaborators:
//! a solid-color frame source, a scripted performer that holds each required
//! pose in order, and an uploader that just echoes a URL.
//!
//!   cargo run --example synthetic_capture

use anyhow::Result;
use mudra::capture::{CaptureConfig, CaptureEvent, CapturePhase, CaptureWorkerBuilder};
use mudra::gesture::testkit::{FingerShape, PoseScript, ScriptedPoseEstimator};
use mudra::upload::{AvatarUploader, UploadResponse};
use mudra::video::{EncodedImage, SyntheticFrameSource};
use std::time::Duration;
use tracing::info;

struct EchoUploader;

impl AvatarUploader for EchoUploader {
    fn upload_avatar(
        &mut self,
        filename: &str,
        image: &EncodedImage,
    ) -> mudra::Result<UploadResponse> {
        info!("Pretending to upload {} ({} bytes)", filename, image.len());
        Ok(UploadResponse {
            public_url: format!("https://cdn.example.com/avatars/{}", filename),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mudra=debug,info".into()),
        )
        .init();

    info!("Starting synthetic capture demo");

    let script = PoseScript::new();
    let config = CaptureConfig::new()
        .with_detection_interval_ms(20)
        .with_countdown(3, 200);

    let (worker, handle) = CaptureWorkerBuilder::new().with_config(config).build(
        Box::new(ScriptedPoseEstimator::new(&script)),
        Box::new(SyntheticFrameSource::new(640, 480)),
        Box::new(EchoUploader),
    )?;
    let join = worker.start();

    // the performer holds each required pose in order
    let performance = [
        FingerShape::open_palm(),
        FingerShape::victory(),
        FingerShape::three_fingers_up(),
    ];
    let mut next_pose = performance.iter();

    handle.start()?;
    script.set(next_pose.next().copied());

    loop {
        if let Some(event) = handle.recv_event_timeout(Duration::from_millis(100)) {
            info!("event: {:?}", event);
            match event {
                CaptureEvent::PoseAdvanced { .. } => {
                    script.set(next_pose.next().copied());
                }
                CaptureEvent::Captured => {
                    let snapshot = handle.snapshot();
                    info!(
                        "captured {} bytes; status: {}",
                        snapshot.captured_image.as_ref().map(|i| i.len()).unwrap_or(0),
                        snapshot.status_message
                    );
                    handle.submit()?;
                }
                CaptureEvent::Uploaded { url } => {
                    info!("avatar available at {}", url);
                    handle.shutdown()?;
                }
                CaptureEvent::Shutdown => break,
                _ => {}
            }
        }

        let snapshot = handle.snapshot();
        if snapshot.phase == CapturePhase::Detecting {
            info!(
                "pose {}/{} hold {}: {}",
                snapshot.current_pose_index + 1,
                3,
                snapshot.hold_count,
                snapshot.status_message
            );
        }
    }

    join.join().expect("worker thread panicked");
    info!("Demo complete");
    Ok(())
}
