//! Audio overview attachment, independent of the dataset flow

use std::path::PathBuf;

use tracing::info;

use crate::app::{AudioPreview, Controller};

impl Controller {
    /// Attach an audio overview, replacing any previous one
    ///
    /// Returns the preview that was replaced.
    pub fn select_audio_preview(&self, path: impl Into<PathBuf>) -> Option<AudioPreview> {
        let preview = AudioPreview::new(path);
        info!("Audio overview: {}", preview.name);
        self.session.lock().audio_preview.replace(preview)
    }

    pub fn clear_audio_preview(&self) -> Option<AudioPreview> {
        self.session.lock().audio_preview.take()
    }
}
