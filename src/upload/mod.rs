//! Avatar upload collaborator contract
//!
//! Uploads are owned by the host (object storage, HTTP, anything). The
//! engine only needs a filename, a payload, and either a public URL or a
//! human-readable error message to surface.

use crate::video::EncodedImage;
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Successful upload result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub public_url: String,
}

/// Destination for captured avatar photos
pub trait AvatarUploader: Send {
    /// Upload the encoded image under the given filename.
    ///
    /// Errors must carry the collaborator's own message; the engine surfaces
    /// it verbatim (including storage-specific conditions like a missing
    /// bucket).
    fn upload_avatar(&mut self, filename: &str, image: &EncodedImage) -> Result<UploadResponse>;
}

/// Generate a collision-resistant avatar filename from the current time
pub fn avatar_filename() -> String {
    format!("{}-avatar.jpg", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_filename_shape() {
        let name = avatar_filename();
        assert!(name.ends_with("-avatar.jpg"));

        let prefix = name.trim_end_matches("-avatar.jpg");
        assert!(prefix.parse::<i64>().is_ok());
    }

    #[test]
    fn test_avatar_filenames_are_monotonic_or_equal() {
        let a = avatar_filename();
        let b = avatar_filename();
        let ts = |s: &str| s.trim_end_matches("-avatar.jpg").parse::<i64>().unwrap();
        assert!(ts(&b) >= ts(&a));
    }
}
