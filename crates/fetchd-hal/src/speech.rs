//! `SpeechService` trait for the robot's text-to-speech engine.

use fetchd_types::FetchError;

/// Text-to-speech passthrough. Synthesis itself is an external concern; the
/// pipeline only needs a fire-and-forget `say`.
pub trait SpeechService: Send + Sync {
    /// Speak `text`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HardwareFault`] if the speech engine rejects
    /// the request. Callers log and carry on – an announcement is never
    /// worth skipping a tracking cycle for.
    fn say(&self, text: &str) -> Result<(), FetchError>;
}
