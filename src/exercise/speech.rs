//! Speech capability seams and the speaking-exercise session.
//!
//! Text-to-speech and speech-to-text are platform capabilities, not
//! something this crate implements. They enter through the
//! [`SpeechSynthesizer`] and [`SpeechRecognizer`] traits; exercise
//! logic never touches a platform singleton directly. Capability
//! absence is detected at construction and surfaces as a disabled
//! state, never as an error path.

use super::transcript::{match_transcript, TranscriptMatch};

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub name: String,
    pub language: String,
    pub default: bool,
}

/// The platform's mutable voice list, wrapped as an injected catalog.
/// Voice sets load asynchronously on some platforms, hence the change
/// subscription.
pub trait VoiceCatalog {
    fn list(&self) -> Vec<Voice>;
    fn subscribe(&mut self, listener: Box<dyn Fn(&[Voice]) + Send>);

    /// Best voice for a language tag: an exact match, else a
    /// same-primary-subtag match, else none.
    fn voice_for(&self, language: &str) -> Option<Voice> {
        let voices = self.list();
        let primary = language.split('-').next().unwrap_or(language);
        voices
            .iter()
            .find(|v| v.language.eq_ignore_ascii_case(language))
            .or_else(|| {
                voices.iter().find(|v| {
                    v.language
                        .split('-')
                        .next()
                        .is_some_and(|p| p.eq_ignore_ascii_case(primary))
                })
            })
            .cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started,
    /// Character offset of the word about to be spoken, for highlight.
    WordBoundary(usize),
    Ended,
    Error(String),
}

/// Text-to-speech capability.
pub trait SpeechSynthesizer {
    fn available(&self) -> bool;
    fn speak(&mut self, text: &str, voice: Option<&Voice>, rate: f32);
    fn cancel(&mut self);
    /// Drain events produced since the last poll.
    fn poll(&mut self) -> Vec<SynthesisEvent>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    PermissionDenied,
    NoSpeech,
    Unavailable,
    Other(String),
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "microphone permission denied"),
            Self::NoSpeech => write!(f, "no speech detected"),
            Self::Unavailable => write!(f, "speech recognition unavailable"),
            Self::Other(msg) => write!(f, "recognition error: {msg}"),
        }
    }
}

impl std::error::Error for RecognitionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Interim(String),
    Final(String),
    Error(RecognitionError),
}

/// Speech-to-text capability.
pub trait SpeechRecognizer {
    fn available(&self) -> bool;
    fn start(&mut self, language: &str);
    fn stop(&mut self);
    /// Drain events produced since the last poll.
    fn poll(&mut self) -> Vec<RecognitionEvent>;
}

/// Where a speaking attempt currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeakingPhase {
    /// The platform offers no recognizer; the exercise renders disabled.
    Unsupported,
    Idle,
    Listening,
    Passed(TranscriptMatch),
    Failed(TranscriptMatch),
    Error(RecognitionError),
}

/// One speaking-challenge attempt loop: listen, collect interim
/// transcripts for live display, grade the final transcript against the
/// target phrase.
pub struct SpeakingSession<R: SpeechRecognizer> {
    recognizer: R,
    target: String,
    language: String,
    phase: SpeakingPhase,
    interim: String,
}

impl<R: SpeechRecognizer> SpeakingSession<R> {
    pub fn new(recognizer: R, target: &str, language: &str) -> Self {
        let phase = if recognizer.available() {
            SpeakingPhase::Idle
        } else {
            SpeakingPhase::Unsupported
        };
        Self {
            recognizer,
            target: target.to_string(),
            language: language.to_string(),
            phase,
            interim: String::new(),
        }
    }

    pub fn phase(&self) -> &SpeakingPhase {
        &self.phase
    }

    /// Live transcript shown while listening.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Begin (or restart) listening. A restart cancels the in-flight
    /// recognition first; there is never more than one.
    pub fn start(&mut self) {
        if self.phase == SpeakingPhase::Unsupported {
            return;
        }
        if self.phase == SpeakingPhase::Listening {
            self.recognizer.stop();
        }
        self.interim.clear();
        self.phase = SpeakingPhase::Listening;
        self.recognizer.start(&self.language);
    }

    pub fn stop(&mut self) {
        if self.phase == SpeakingPhase::Listening {
            self.recognizer.stop();
        }
    }

    /// Drain recognizer events and advance the phase. The first final
    /// transcript (or error) while listening settles the attempt.
    pub fn process_events(&mut self) {
        for event in self.recognizer.poll() {
            if self.phase != SpeakingPhase::Listening {
                continue;
            }
            match event {
                RecognitionEvent::Interim(text) => self.interim = text,
                RecognitionEvent::Final(text) => {
                    self.interim = text.clone();
                    let result = match_transcript(&self.target, &text);
                    self.phase = if result.passed() {
                        SpeakingPhase::Passed(result)
                    } else {
                        SpeakingPhase::Failed(result)
                    };
                }
                RecognitionEvent::Error(err) => {
                    self.phase = SpeakingPhase::Error(err);
                }
            }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.phase, SpeakingPhase::Passed(_))
    }
}

impl<R: SpeechRecognizer> Drop for SpeakingSession<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Plays authored phrases aloud with word-boundary tracking for
/// highlight. Starting a new utterance cancels the current one.
pub struct TtsPlayer<S: SpeechSynthesizer> {
    synthesizer: S,
    speaking: bool,
    /// Character offset of the word currently being spoken.
    word_offset: Option<usize>,
}

impl<S: SpeechSynthesizer> TtsPlayer<S> {
    pub fn new(synthesizer: S) -> Self {
        Self {
            synthesizer,
            speaking: false,
            word_offset: None,
        }
    }

    pub fn available(&self) -> bool {
        self.synthesizer.available()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn word_offset(&self) -> Option<usize> {
        self.word_offset
    }

    /// Speak a phrase. `rate` below 1.0 gives the slowed-down variant
    /// used by listening exercises.
    pub fn speak(&mut self, text: &str, voice: Option<&Voice>, rate: f32) {
        if !self.synthesizer.available() {
            return;
        }
        if self.speaking {
            self.synthesizer.cancel();
        }
        self.speaking = true;
        self.word_offset = None;
        self.synthesizer.speak(text, voice, rate);
    }

    pub fn cancel(&mut self) {
        if self.speaking {
            self.synthesizer.cancel();
            self.speaking = false;
            self.word_offset = None;
        }
    }

    /// Drain synthesis events and update speaking/highlight state.
    pub fn process_events(&mut self) {
        for event in self.synthesizer.poll() {
            match event {
                SynthesisEvent::Started => self.speaking = true,
                SynthesisEvent::WordBoundary(offset) => self.word_offset = Some(offset),
                SynthesisEvent::Ended | SynthesisEvent::Error(_) => {
                    self.speaking = false;
                    self.word_offset = None;
                }
            }
        }
    }
}

impl<S: SpeechSynthesizer> Drop for TtsPlayer<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
