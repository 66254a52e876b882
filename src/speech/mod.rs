//! Speech capabilities
//!
//! The controller treats capture, recognition and synthesis as opaque
//! providers. Providers report progress by posting `Event`s to the queue
//! they were constructed with; they never call into the controller.

pub mod console;

use crate::error::{CaptureError, RecognitionError, SynthesisError};
use crate::persona::VoiceProfile;
use std::sync::Arc;

pub use console::{ConsoleMicrophone, ConsoleRecognizer, ConsoleSynthesizer};

/// Microphone access
///
/// The stream is single-owner: acquiring while a stream is live releases the old one first.
#[async_trait::async_trait]
pub trait Microphone: Send + Sync {
    /// Request the microphone (may wait on a permission prompt)
    async fn acquire(&self) -> Result<(), CaptureError>;

    /// Release the stream; no-op when nothing is held
    fn release(&self);

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Speech-to-text
///
/// After a successful `start`, posts `RecognizerStarted`, zero or more
/// `RecognizerResult`, then exactly one of `RecognizerEnded` or `RecognizerError`.
pub trait Recognizer: Send + Sync {
    fn start(&self) -> Result<(), RecognitionError>;

    /// Ask the recognizer to finalize; it still reports `RecognizerEnded`
    fn stop(&self);

    fn is_active(&self) -> bool;
}

/// Text-to-speech
///
/// Posts `SynthesisStarted` then `SynthesisEnded` (or `SynthesisFailed`).
/// A new `speak` cancels the utterance in progress.
pub trait Synthesizer: Send + Sync {
    fn speak(&self, text: &str, voice: VoiceProfile) -> Result<(), SynthesisError>;

    /// Stop speaking; idempotent and silent when nothing is playing
    fn cancel(&self);

    fn is_speaking(&self) -> bool;
}

/// The capability set a runtime drives
#[derive(Clone)]
pub struct SpeechDevices {
    pub microphone: Arc<dyn Microphone>,
    pub recognizer: Arc<dyn Recognizer>,
    pub synthesizer: Arc<dyn Synthesizer>,
}
