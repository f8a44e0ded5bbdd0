//! Audio upload allow-list.

use std::path::Path;

/// Filename extensions accepted even when the declared media type is missing or generic
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav"];

/// Whether a file may be uploaded as the studio's audio track.
///
/// Accepts any `audio/*` media type, or one of [`AUDIO_EXTENSIONS`] on the
/// filename. Everything else is ignored by both the client and the server.
pub fn is_audio_upload(file_name: &str, content_type: Option<&str>) -> bool {
    if let Some(ct) = content_type {
        if ct.trim().to_ascii_lowercase().starts_with("audio/") {
            return true;
        }
    }

    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
