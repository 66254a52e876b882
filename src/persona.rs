use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Response style selected by the user and announced to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Default,
    FriendlyTeacher,
    TechSupport,
    Storyteller,
}

/// Speech parameters for one persona
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceProfile {
    /// Speaking rate multiplier (1.0 = normal)
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub display_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown persona '{0}' (expected one of: default, friendly_teacher, tech_support, storyteller)")]
pub struct UnknownPersona(pub String);

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::Default,
        Persona::FriendlyTeacher,
        Persona::TechSupport,
        Persona::Storyteller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Default => "default",
            Persona::FriendlyTeacher => "friendly_teacher",
            Persona::TechSupport => "tech_support",
            Persona::Storyteller => "storyteller",
        }
    }

    pub fn voice(&self) -> VoiceProfile {
        match self {
            Persona::Default => VoiceProfile {
                rate: 0.9,
                pitch: 1.0,
                volume: 0.9,
                display_name: "Assistant",
            },
            Persona::FriendlyTeacher => VoiceProfile {
                rate: 0.85,
                pitch: 1.1,
                volume: 0.9,
                display_name: "Friendly Teacher",
            },
            Persona::TechSupport => VoiceProfile {
                rate: 0.95,
                pitch: 0.9,
                volume: 0.9,
                display_name: "Tech Support",
            },
            Persona::Storyteller => VoiceProfile {
                rate: 0.8,
                pitch: 1.2,
                volume: 0.9,
                display_name: "Storyteller",
            },
        }
    }

    /// Voice for a persona tag sent by the backend; unknown tags use the default voice
    pub fn voice_for_tag(tag: &str) -> VoiceProfile {
        tag.parse::<Persona>().unwrap_or_default().voice()
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Persona::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_personas() {
        for persona in Persona::ALL {
            assert_eq!(persona.as_str().parse::<Persona>(), Ok(persona));
        }
    }

    #[test]
    fn test_unknown_persona_tag_uses_default_voice() {
        assert!("pirate".parse::<Persona>().is_err());
        assert_eq!(Persona::voice_for_tag("pirate").display_name, "Assistant");
        assert_eq!(Persona::voice_for_tag("storyteller").rate, 0.8);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Persona::FriendlyTeacher).unwrap();
        assert_eq!(json, "\"friendly_teacher\"");
    }
}
