use voice_agent::backend::{
    ApiKeys, ApiKeysStatus, ApiService, AvailableFeatures, ClientMessage, ServerMessage,
    SessionCreated, SessionStatus,
};
use voice_agent::Persona;

#[test]
fn test_user_transcript_serialization() {
    let msg = ClientMessage::UserTranscript {
        text: "hello".to_string(),
    };

    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json, serde_json::json!({"type": "user_transcript", "text": "hello"}));
}

#[test]
fn test_persona_serialization() {
    let msg = ClientMessage::Persona {
        persona: Persona::FriendlyTeacher,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"type\":\"persona\""));
    assert!(json.contains("\"persona\":\"friendly_teacher\""));
}

#[test]
fn test_server_message_types() {
    let ack: ServerMessage = serde_json::from_str(r#"{"type": "ack_transcript"}"#).unwrap();
    assert_eq!(ack, ServerMessage::AckTranscript);

    let end: ServerMessage = serde_json::from_str(r#"{"type": "audio_end"}"#).unwrap();
    assert_eq!(end, ServerMessage::AudioEnd);

    let final_msg: ServerMessage =
        serde_json::from_str(r#"{"type": "final", "text": "hello"}"#).unwrap();
    assert_eq!(
        final_msg,
        ServerMessage::Final {
            text: "hello".to_string()
        }
    );

    let error: ServerMessage =
        serde_json::from_str(r#"{"type": "error", "message": "boom"}"#).unwrap();
    assert_eq!(
        error,
        ServerMessage::Error {
            message: "boom".to_string()
        }
    );
}

#[test]
fn test_llm_response_optional_fields() {
    let bare: ServerMessage =
        serde_json::from_str(r#"{"type": "llm_response", "text": "Hi there!"}"#).unwrap();
    assert_eq!(
        bare,
        ServerMessage::LlmResponse {
            text: "Hi there!".to_string(),
            persona: None,
            api_keys_status: None,
        }
    );

    let full: ServerMessage = serde_json::from_str(
        r#"{
            "type": "llm_response",
            "text": "It is sunny.",
            "persona": "storyteller",
            "api_keys_status": {"gemini": true, "openweather": true, "tavily": false}
        }"#,
    )
    .unwrap();

    let ServerMessage::LlmResponse {
        persona,
        api_keys_status,
        ..
    } = full
    else {
        panic!("expected llm_response");
    };
    assert_eq!(persona.as_deref(), Some("storyteller"));

    let features: AvailableFeatures = api_keys_status.unwrap().into();
    assert!(features.ai_chat);
    assert!(features.weather);
    assert!(!features.web_search);
}

#[test]
fn test_unknown_server_message_is_rejected() {
    assert!(serde_json::from_str::<ServerMessage>(r#"{"type": "mystery"}"#).is_err());
}

#[test]
fn test_api_keys_status_defaults_missing_services() {
    let status: ApiKeysStatus = serde_json::from_str(r#"{"gemini": true}"#).unwrap();
    assert!(status.gemini);
    assert!(!status.tavily);
}

#[test]
fn test_api_keys_body_is_flat_object() {
    let mut keys = ApiKeys::new();
    keys.insert(ApiService::Openweather, " ow-key ");
    keys.insert(ApiService::Gemini, "g-key");
    keys.insert(ApiService::Tavily, "   ");

    let json: serde_json::Value = serde_json::to_value(&keys).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"gemini": "g-key", "openweather": "ow-key"})
    );
}

#[test]
fn test_session_http_bodies() {
    let created: SessionCreated = serde_json::from_str(r#"{"session_id": "abc-123"}"#).unwrap();
    assert_eq!(created.session_id, "abc-123");

    let status: SessionStatus = serde_json::from_str(
        r#"{"available_features": {"ai_chat": true, "weather": false, "web_search": true}}"#,
    )
    .unwrap();
    assert!(status.available_features.ai_chat);
    assert!(status.available_features.web_search);
}
