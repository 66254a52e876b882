//! User-facing capability failures
//!
//! Each variant's `Display` text is what the status line shows. Plumbing
//! failures (HTTP, socket setup, storage I/O) stay in `anyhow`.

use thiserror::Error;

/// Microphone acquisition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied.")]
    PermissionDenied,

    #[error("No microphone available: {0}")]
    Unavailable(String),
}

/// Speech recognition failures, keyed by the recognizer's error code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("No speech detected. Please try again.")]
    NoSpeech,

    #[error("Network error. Check your connection.")]
    Network,

    #[error("Microphone access denied. Please allow microphone access.")]
    NotAllowed,

    #[error("Speech recognition was stopped.")]
    Aborted,

    #[error("Speech Recognition not available.")]
    Unsupported,

    #[error("Speech error: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Map a recognizer error code (`no-speech`, `network`, ...) to a variant
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Speech synthesis failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("Speech synthesis not supported")]
    Unsupported,

    #[error("interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_codes() {
        assert_eq!(RecognitionError::from_code("no-speech"), RecognitionError::NoSpeech);
        assert_eq!(RecognitionError::from_code("network"), RecognitionError::Network);
        assert_eq!(
            RecognitionError::from_code("audio-capture").to_string(),
            "Speech error: audio-capture"
        );
    }
}
