//! Terminal frontend: stdin commands in, status lines out

use crate::backend::{ApiKeys, ApiService};
use crate::controller::{Event, EventSender, StatusView};
use crate::persona::Persona;
use crate::runtime::Renderer;
use crate::speech::ConsoleRecognizer;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub const HELP: &str = "\
Commands:
  r, /record         start recording (or stop the current recording)
  /cancel            stop speech and recording, close settings
  /persona NAME      default | friendly_teacher | tech_support | storyteller
  /clear             clear conversation history
  /settings, /close  open or close the settings panel
  /keys k=v ...      configure API keys (gemini, openweather, tavily)
  /help              show this help
  /quit              exit
While recording, type what you would say and press Enter.";

/// One parsed line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Event(Event),
    /// Anything that is not a command: an utterance for the recognizer
    Speech(String),
    Help,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "r" | "/record" if arg.is_empty() => Input::Event(Event::Activate),
        "/cancel" | "/esc" => Input::Event(Event::Cancel),
        "/clear" => Input::Event(Event::ClearHistory),
        "/settings" => Input::Event(Event::OpenSettings),
        "/close" => Input::Event(Event::CloseSettings),
        "/quit" | "/exit" => Input::Event(Event::Shutdown),
        "/help" => Input::Help,
        "/persona" => match arg.parse::<Persona>() {
            Ok(persona) => Input::Event(Event::SelectPersona(persona)),
            Err(e) => Input::Invalid(e.to_string()),
        },
        "/keys" => parse_keys(arg),
        c if c.starts_with('/') => Input::Invalid(format!("unknown command {}", c)),
        _ => Input::Speech(line.to_string()),
    }
}

fn parse_keys(arg: &str) -> Input {
    let mut keys = ApiKeys::new();
    for pair in arg.split_whitespace() {
        let Some((name, value)) = pair.split_once('=') else {
            return Input::Invalid(format!("expected service=value, got {}", pair));
        };
        let Some(service) = ApiService::parse(name) else {
            return Input::Invalid(format!("unknown service {}", name));
        };
        keys.insert(service, value);
    }
    Input::Event(Event::SaveApiKeys(keys))
}

/// Read stdin until EOF or `/quit`, turning lines into events
pub async fn read_input(recognizer: Arc<ConsoleRecognizer>, events: EventSender) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Input::Event(event) => {
                let quit = event == Event::Shutdown;
                if events.send(event).is_err() || quit {
                    return Ok(());
                }
            }
            Input::Speech(text) => {
                if !recognizer.feed(&text) {
                    println!("(not recording; press r to start)");
                }
            }
            Input::Help => println!("{}", HELP),
            Input::Invalid(reason) => println!("{}", reason),
        }
    }

    info!("Console input closed");
    if events.send(Event::Shutdown).is_err() {
        warn!("Runtime already stopped");
    }
    Ok(())
}

/// Prints the parts of the view that changed since the last render
#[derive(Default)]
pub struct ConsoleRenderer {
    last: Option<StatusView>,
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, view: &StatusView) {
        let last = self.last.take().unwrap_or_default();

        if view.state != last.state || view.connected != last.connected {
            let link = if view.connected { "online" } else { "offline" };
            println!("[{}] {} ({})", link, view.headline(), view.detail());
        }
        if view.transcript != last.transcript {
            if let Some(transcript) = &view.transcript {
                println!("  you: {}", transcript);
            }
        }
        if view.error != last.error {
            if let Some(error) = &view.error {
                println!("  ❌ {}", error);
            }
        }
        if view.audio_status != last.audio_status {
            if let Some(status) = &view.audio_status {
                println!("  {}", status);
            }
        }
        if view.notice != last.notice {
            if let Some(notice) = &view.notice {
                println!("  ✅ {}", notice);
            }
        }
        if view.settings_open != last.settings_open {
            let f = view.features;
            if view.settings_open {
                println!(
                    "  settings: ai_chat={} weather={} web_search={} (use /keys, /close)",
                    f.ai_chat, f.weather, f.web_search
                );
            } else {
                println!("  settings closed");
            }
        }
        if view.history_len != last.history_len {
            println!("  history: {} conversation(s)", view.history_len);
        }

        self.last = Some(view.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("r"), Input::Event(Event::Activate));
        assert_eq!(parse_line(" /cancel "), Input::Event(Event::Cancel));
        assert_eq!(
            parse_line("/persona storyteller"),
            Input::Event(Event::SelectPersona(Persona::Storyteller))
        );
        assert!(matches!(parse_line("/persona pirate"), Input::Invalid(_)));
        assert!(matches!(parse_line("/bogus"), Input::Invalid(_)));
    }

    #[test]
    fn test_parse_speech() {
        assert_eq!(parse_line("hello there"), Input::Speech("hello there".to_string()));
        // "r" followed by words is speech, not the record shortcut
        assert_eq!(parse_line("r is a letter"), Input::Speech("r is a letter".to_string()));
    }

    #[test]
    fn test_parse_keys() {
        let Input::Event(Event::SaveApiKeys(keys)) =
            parse_line("/keys gemini=abc tavily= openweather=xyz")
        else {
            panic!("expected SaveApiKeys");
        };
        assert_eq!(keys.get(ApiService::Gemini), Some("abc"));
        assert_eq!(keys.get(ApiService::Tavily), None);
        assert_eq!(keys.len(), 2);

        assert!(matches!(parse_line("/keys nope=1"), Input::Invalid(_)));
    }
}
