//! Spoken status announcements.
//!
//! Thin wrapper over the speech service with the pipeline's fixed phrases.
//! Speech is best-effort: a faulted `say` is logged and tracking continues.

use std::sync::Arc;

use fetchd_hal::SpeechService;
use tracing::{debug, warn};

pub struct Announcer {
    speech: Arc<dyn SpeechService>,
}

impl Announcer {
    pub fn new(speech: Arc<dyn SpeechService>) -> Self {
        Self { speech }
    }

    /// Announce a newly detected object category.
    pub fn announce_object(&self, category: &str) {
        self.say(&format!("I have found a {category}"));
    }

    /// Announce arrival at the tracked object.
    pub fn announce_reaching(&self, category: &str) {
        self.say(&format!("I have reached the {category}"));
    }

    /// Announce that tracking has started and the robot is waiting for
    /// detections.
    pub fn announce_searching(&self) {
        self.say("I am looking for objects");
    }

    fn say(&self, text: &str) {
        match self.speech.say(text) {
            Ok(()) => debug!(text, "spoke"),
            Err(e) => warn!(error = %e, text, "speech failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchd_hal::sim::SimSpeech;

    #[test]
    fn phrases_include_category() {
        let speech = Arc::new(SimSpeech::new());
        let announcer = Announcer::new(speech.clone());
        announcer.announce_object("bottle");
        announcer.announce_reaching("bottle");
        assert_eq!(
            speech.spoken(),
            vec!["I have found a bottle", "I have reached the bottle"]
        );
    }
}
