pub mod capture;
pub mod gesture;
pub mod upload;
pub mod video;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MudraError {
    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Camera error: {0}")]
    CameraError(String),

    #[error("Detection error: {0}")]
    DetectionError(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl MudraError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The pose model failed to initialize; requires a reload
            MudraError::ModelLoadError(_) => false,
            // Camera/stream problems may require user intervention
            MudraError::CameraError(_) => false,
            // These are typically transient errors
            MudraError::DetectionError(_) => true,
            MudraError::CaptureError(_) => true,
            MudraError::UploadError(_) => true,
            MudraError::ConfigError(_) => false,
            MudraError::ChannelError(_) => false,
            MudraError::SessionError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MudraError::ModelLoadError(_) => {
                "Failed to load the hand pose model. Please reload the page.".to_string()
            }
            MudraError::CameraError(_) => {
                "Camera error. Please check your webcam.".to_string()
            }
            MudraError::DetectionError(_) => {
                "Hand detection failed. Please try again.".to_string()
            }
            MudraError::CaptureError(_) => {
                "Could not capture a photo. Please try again.".to_string()
            }
            MudraError::UploadError(msg) => msg.clone(),
            MudraError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MudraError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MudraError::SessionError(_) => {
                "Capture session error. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MudraError>;
