//! Sound cue output.

use std::collections::BTreeSet;

use tracing::{debug, info};

/// Receiver of fire-and-forget sound cues.
pub trait AudioSink {
    fn play(&mut self, cue: &str);
}

/// Discards every cue.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: &str) {}
}

/// Keeps every cue, in order.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<String>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: &str) {
        self.played.push(cue.to_owned());
    }
}

/// Logs cues that exist in the asset manifest; unknown cues are skipped.
#[derive(Debug, Default)]
pub struct LoggingAudio {
    known: BTreeSet<String>,
    pub played: u64,
}

impl LoggingAudio {
    pub fn new(known: BTreeSet<String>) -> Self {
        Self { known, played: 0 }
    }
}

impl AudioSink for LoggingAudio {
    fn play(&mut self, cue: &str) {
        if self.known.contains(cue) {
            self.played += 1;
            info!(cue, "sound");
        } else {
            debug!(cue, "sound cue not in manifest, skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_audio_skips_unknown_cues() {
        let mut audio = LoggingAudio::new(["explosion".to_owned()].into_iter().collect());
        audio.play("explosion");
        audio.play("laser");
        assert_eq!(audio.played, 1);
    }
}
