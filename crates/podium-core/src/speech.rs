//! Speech capabilities
//!
//! Dictation and read-aloud are injected as trait objects so that sessions
//! and their tests never reach for a platform speech service directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Receives finished transcripts from a [`SpeechInput`]
pub type TranscriptSink = Box<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("Speech is not available on this platform")]
    Unavailable,
    #[error("Speech failed: {0}")]
    Failed(String),
}

/// Speech recognition used for dictating arguments
pub trait SpeechInput: Send + Sync {
    /// Start listening; transcripts go to every subscribed sink
    fn start(&self) -> Result<(), SpeechError>;

    fn stop(&self);

    fn subscribe(&self, sink: TranscriptSink);

    fn is_listening(&self) -> bool;
}

/// Speech synthesis used to read AI turns aloud
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Stop any utterance in progress
    fn cancel(&self);

    fn is_speaking(&self) -> bool;
}

/// No speech hardware: dictation is unavailable and read-aloud is a no-op
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SpeechInput for Silent {
    fn start(&self) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn stop(&self) {}

    fn subscribe(&self, _sink: TranscriptSink) {}

    fn is_listening(&self) -> bool {
        false
    }
}

impl SpeechOutput for Silent {
    fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Scripted speech for tests: records utterances and replays transcripts on demand
#[derive(Clone, Default)]
pub struct ScriptedSpeech {
    spoken: Arc<Mutex<Vec<String>>>,
    sinks: Arc<Mutex<Vec<TranscriptSink>>>,
    listening: Arc<AtomicBool>,
    speaking: Arc<AtomicBool>,
}

impl ScriptedSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts passed to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Deliver a transcript as if it had been recognized. Ignored unless listening.
    pub fn hear(&self, transcript: &str) {
        if !self.listening.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(sinks) = self.sinks.lock() {
            for sink in sinks.iter() {
                sink(transcript.to_string());
            }
        }
    }
}

impl std::fmt::Debug for ScriptedSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSpeech")
            .field("spoken", &self.spoken())
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl SpeechInput for ScriptedSpeech {
    fn start(&self) -> Result<(), SpeechError> {
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn subscribe(&self, sink: TranscriptSink) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.push(sink);
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl SpeechOutput for ScriptedSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        self.speaking.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&self) {
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}
