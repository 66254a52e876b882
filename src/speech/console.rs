use super::{Microphone, Recognizer, Synthesizer};
use crate::controller::{Event, EventSender, Segment};
use crate::error::{CaptureError, RecognitionError, SynthesisError};
use crate::persona::VoiceProfile;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Terminal stand-in for a microphone: the "stream" is the user's keyboard
#[derive(Default)]
pub struct ConsoleMicrophone {
    held: AtomicBool,
}

impl ConsoleMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Microphone for ConsoleMicrophone {
    async fn acquire(&self) -> Result<(), CaptureError> {
        if self.held.swap(true, Ordering::SeqCst) {
            debug!("Releasing previous console capture");
        }
        Ok(())
    }

    fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Recognizer fed with typed lines: each line is one final segment, after
/// which the recognizer endpoints
pub struct ConsoleRecognizer {
    events: EventSender,
    active: AtomicBool,
}

impl ConsoleRecognizer {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            active: AtomicBool::new(false),
        }
    }

    /// Deliver a typed utterance; returns false when not listening
    pub fn feed(&self, line: &str) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }

        let _ = self
            .events
            .send(Event::RecognizerResult(vec![Segment::final_text(line.trim())]));
        let _ = self.events.send(Event::RecognizerEnded);
        true
    }
}

impl Recognizer for ConsoleRecognizer {
    fn start(&self) -> Result<(), RecognitionError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(RecognitionError::Other("already-started".to_string()));
        }
        let _ = self.events.send(Event::RecognizerStarted);
        Ok(())
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(Event::RecognizerEnded);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Synthesizer that "speaks" by printing the words at the voice's pace
pub struct ConsoleSynthesizer {
    events: EventSender,
    words_per_minute: u32,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleSynthesizer {
    pub fn new(events: EventSender, words_per_minute: u32) -> Self {
        Self {
            events,
            words_per_minute: words_per_minute.max(1),
            current: Mutex::new(None),
        }
    }

    fn word_delay(&self, voice: &VoiceProfile) -> Duration {
        let words_per_sec = self.words_per_minute as f32 * voice.rate.max(0.1) / 60.0;
        Duration::from_secs_f32(1.0 / words_per_sec)
    }
}

impl Synthesizer for ConsoleSynthesizer {
    fn speak(&self, text: &str, voice: VoiceProfile) -> Result<(), SynthesisError> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| SynthesisError::Other("synthesizer lock poisoned".to_string()))?;
        if let Some(previous) = current.take() {
            previous.abort();
        }

        let events = self.events.clone();
        let delay = self.word_delay(&voice);
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let name = voice.display_name;

        *current = Some(tokio::spawn(async move {
            let _ = events.send(Event::SynthesisStarted);
            print!("🔊 {}: ", name);
            for word in words {
                print!("{} ", word);
                std::io::stdout().flush().ok();
                tokio::time::sleep(delay).await;
            }
            println!();
            let _ = events.send(Event::SynthesisEnded);
        }));

        Ok(())
    }

    fn cancel(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(handle) = current.take() {
                if !handle.is_finished() {
                    info!("Speech cancelled");
                    println!();
                }
                handle.abort();
            }
        }
    }

    fn is_speaking(&self) -> bool {
        self.current
            .lock()
            .map(|current| current.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}
