//! Configuration for a capture session
//!
//! The acceptance threshold, hold length and timer cadences are deployment
//! tunables (camera quality and lighting vary); the defaults reproduce the
//! production values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the capture state machine and its timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Minimum score for a ranked match to count as the target pose
    pub accept_threshold: f32,

    /// Consecutive matching ticks required to confirm a pose
    pub hold_threshold: u32,

    /// Floor below which matches are dropped from the ranked list entirely
    pub min_match_score: f32,

    /// Detection tick interval in milliseconds
    pub detection_interval_ms: u64,

    /// Countdown start value
    pub countdown_start: u32,

    /// Countdown tick interval in milliseconds
    pub countdown_interval_ms: u64,

    /// JPEG quality for the captured still (1-100)
    pub jpeg_quality: u8,

    /// Displayed video size for bounding-box scaling, if it differs from the
    /// native stream size
    pub display_size: Option<(u32, u32)>,

    /// Buffer size for command/event channels
    pub channel_buffer_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.9,
            hold_threshold: 5,
            min_match_score: 0.8,
            detection_interval_ms: 200,
            countdown_start: 3,
            countdown_interval_ms: 1000,
            jpeg_quality: 85,
            display_size: None,
            channel_buffer_size: 100,
        }
    }
}

impl CaptureConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acceptance threshold
    pub fn with_accept_threshold(mut self, threshold: f32) -> Self {
        self.accept_threshold = threshold;
        self
    }

    /// Set the number of consecutive matching ticks required per pose
    pub fn with_hold_threshold(mut self, ticks: u32) -> Self {
        self.hold_threshold = ticks;
        self
    }

    /// Set the detection tick interval
    pub fn with_detection_interval_ms(mut self, ms: u64) -> Self {
        self.detection_interval_ms = ms;
        self
    }

    /// Set the countdown start value and tick interval
    pub fn with_countdown(mut self, start: u32, interval_ms: u64) -> Self {
        self.countdown_start = start;
        self.countdown_interval_ms = interval_ms;
        self
    }

    /// Set the displayed video size for bounding-box scaling
    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display_size = Some((width, height));
        self
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(format!(
                "accept_threshold must be in [0, 1], got {}",
                self.accept_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.min_match_score) {
            return Err(format!(
                "min_match_score must be in [0, 1], got {}",
                self.min_match_score
            ));
        }
        if self.hold_threshold == 0 {
            return Err("hold_threshold must be at least 1".to_string());
        }
        if self.detection_interval_ms == 0 || self.countdown_interval_ms == 0 {
            return Err("timer intervals must be non-zero".to_string());
        }
        if self.countdown_start == 0 {
            return Err("countdown_start must be at least 1".to_string());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(format!(
                "jpeg_quality must be in [1, 100], got {}",
                self.jpeg_quality
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_production_values() {
        let config = CaptureConfig::default();
        assert_eq!(config.accept_threshold, 0.9);
        assert_eq!(config.hold_threshold, 5);
        assert_eq!(config.detection_interval_ms, 200);
        assert_eq!(config.countdown_start, 3);
        assert_eq!(config.countdown_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CaptureConfig::new()
            .with_accept_threshold(0.8)
            .with_hold_threshold(3)
            .with_detection_interval_ms(50)
            .with_countdown(5, 500)
            .with_display_size(640, 360);

        assert_eq!(config.accept_threshold, 0.8);
        assert_eq!(config.hold_threshold, 3);
        assert_eq!(config.detection_interval(), Duration::from_millis(50));
        assert_eq!(config.countdown_start, 5);
        assert_eq!(config.display_size, Some((640, 360)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CaptureConfig::new()
            .with_accept_threshold(1.5)
            .validate()
            .is_err());
        assert!(CaptureConfig::new()
            .with_hold_threshold(0)
            .validate()
            .is_err());
        assert!(CaptureConfig::new()
            .with_detection_interval_ms(0)
            .validate()
            .is_err());
        assert!(CaptureConfig::new().with_countdown(0, 1000).validate().is_err());
    }
}
