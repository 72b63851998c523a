use std::time::Instant;

/// Minimum length of a combined transcript worth analyzing or submitting.
pub const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Accumulates recognized speech pushed in by a transcript source.
///
/// Finalized fragments are committed permanently; the interim fragment is a
/// provisional tail that the source may revise any number of times before
/// finalizing. Duration is wall-clock from `start` to `stop`.
#[derive(Debug, Default)]
pub struct TranscriptRecorder {
    committed: String,
    interim: String,
    listening: bool,
    started_at: Option<Instant>,
    frozen_duration: Option<f64>,
}

impl TranscriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Begin a fresh recording, discarding any previous text.
    pub fn start(&mut self) {
        self.committed.clear();
        self.interim.clear();
        self.listening = true;
        self.started_at = Some(Instant::now());
        self.frozen_duration = None;
    }

    /// Commit a finalized recognition fragment. Ignored while not listening.
    pub fn push_final(&mut self, fragment: &str) {
        if !self.listening || fragment.is_empty() {
            return;
        }
        self.committed.push_str(fragment);
        self.committed.push(' ');
    }

    /// Replace the provisional tail. Ignored while not listening.
    pub fn push_interim(&mut self, fragment: &str) {
        if !self.listening {
            return;
        }
        self.interim.clear();
        self.interim.push_str(fragment);
    }

    /// Stop recording: the pending interim fragment is folded into the
    /// committed transcript and the elapsed duration is frozen.
    pub fn stop(&mut self) {
        if !self.listening {
            return;
        }
        self.listening = false;
        if !self.interim.is_empty() {
            let interim = std::mem::take(&mut self.interim);
            self.committed.push_str(&interim);
            self.committed.push(' ');
        }
        self.frozen_duration = self
            .started_at
            .map(|started| started.elapsed().as_secs_f64());
    }

    /// Committed transcript plus the in-progress interim fragment.
    pub fn combined(&self) -> String {
        let mut text = self.committed.clone();
        text.push_str(&self.interim);
        text.trim().to_string()
    }

    /// Seconds elapsed: frozen after `stop`, live while listening, 0 before
    /// any recording.
    pub fn elapsed_seconds(&self) -> f64 {
        if let Some(frozen) = self.frozen_duration {
            return frozen;
        }
        self.started_at
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn word_count(&self) -> usize {
        self.combined().split_whitespace().count()
    }

    /// Whether enough was said to be worth analyzing.
    pub fn has_enough_speech(&self) -> bool {
        self.combined().len() >= MIN_TRANSCRIPT_CHARS
    }

    pub fn reset(&mut self) {
        self.committed.clear();
        self.interim.clear();
        self.listening = false;
        self.started_at = None;
        self.frozen_duration = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interim_is_provisional_until_finalized() {
        let mut recorder = TranscriptRecorder::new();
        recorder.start();
        recorder.push_interim("hel");
        recorder.push_interim("hello there");
        assert_eq!(recorder.combined(), "hello there");

        recorder.push_final("hello there");
        recorder.push_interim("how");
        assert_eq!(recorder.combined(), "hello there how");
    }

    #[test]
    fn stop_folds_interim_into_committed() {
        let mut recorder = TranscriptRecorder::new();
        recorder.start();
        recorder.push_final("the first part");
        recorder.push_interim("and the rest");
        recorder.stop();

        assert_eq!(recorder.combined(), "the first part and the rest");
        assert!(!recorder.is_listening());
        assert!(recorder.elapsed_seconds() >= 0.0);
    }

    #[test]
    fn pushes_ignored_while_not_listening() {
        let mut recorder = TranscriptRecorder::new();
        recorder.push_final("ghost");
        recorder.push_interim("ghost");
        assert_eq!(recorder.combined(), "");

        recorder.start();
        recorder.push_final("real");
        recorder.stop();
        recorder.push_final("late");
        assert_eq!(recorder.combined(), "real");
    }

    #[test]
    fn start_discards_previous_recording() {
        let mut recorder = TranscriptRecorder::new();
        recorder.start();
        recorder.push_final("first take");
        recorder.stop();

        recorder.start();
        assert_eq!(recorder.combined(), "");
        assert_eq!(recorder.word_count(), 0);

        recorder.push_final("second take");
        recorder.reset();
        assert_eq!(recorder.combined(), "");
        assert!(!recorder.is_listening());
        assert_eq!(recorder.elapsed_seconds(), 0.0);
    }

    #[test]
    fn short_recordings_are_flagged() {
        let mut recorder = TranscriptRecorder::new();
        recorder.start();
        recorder.push_final("hi");
        assert!(!recorder.has_enough_speech());
        recorder.push_final("there is more to say now");
        assert!(recorder.has_enough_speech());
    }
}
