use chrono::{TimeDelta, TimeZone, Utc};
use chutes_openai_proxy::models::openai::ChatRequest;
use chutes_openai_proxy::transform::*;
use std::collections::HashSet;
use std::fs;

fn load(name: &str) -> ChatRequest {
    let json = fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_transform_keeps_only_last_message() {
    let chat_req = load("chat_request_simple.json");

    // Validate
    assert!(validate_chat_request(&chat_req).is_ok());
    assert_eq!(chat_req.messages.len(), 4);
    assert!(!chat_req.stream);

    // Transform
    let envelope = transform_request(&chat_req).unwrap();

    assert_eq!(envelope.messages.len(), 1);
    assert_eq!(envelope.messages[0].role, "user");
    assert_eq!(envelope.messages[0].content, serde_json::json!("And borrowing?"));

    // Verify model mapping
    assert_eq!(envelope.model, "Qwen/Qwen2.5-72B-Instruct");
    assert_eq!(envelope.chute_name, "chutes-qwen-qwen2-5-72b-instruct");
}

#[test]
fn test_structured_content_passes_through() {
    let chat_req = load("chat_request_parts.json");
    assert!(chat_req.stream);

    let envelope = transform_request(&chat_req).unwrap();
    let content = &envelope.messages[0].content;

    assert!(content.is_array());
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[1]["image_url"]["url"], "https://example.com/cat.png");
    assert_eq!(envelope.chute_name, "chutes-opengvlab-internvl2-5-78b");
}

#[test]
fn test_wire_field_names() {
    let chat_req = load("chat_request_simple.json");
    let now = Utc.with_ymd_and_hms(2025, 1, 30, 8, 15, 42).unwrap() + TimeDelta::milliseconds(7);

    let envelope = transform_request_at(&chat_req, now).unwrap();
    let wire = serde_json::to_value(&envelope).unwrap();

    assert_eq!(wire["chuteName"], "chutes-qwen-qwen2-5-72b-instruct");
    assert_eq!(wire["messages"][0]["createdOn"], "2025-01-30T08:15:42.007Z");
    assert!(wire["messages"][0]["id"].is_string());
    assert!(wire.get("chute_name").is_none());
}

#[test]
fn test_message_ids_are_unique() {
    let chat_req = load("chat_request_simple.json");

    let ids: HashSet<String> = (0..50)
        .map(|_| transform_request(&chat_req).unwrap().messages[0].id.clone())
        .collect();

    assert_eq!(ids.len(), 50);
    assert!(ids.iter().all(|id| uuid::Uuid::parse_str(id).is_ok()));
}

#[test]
fn test_missing_model_defaults() {
    let chat_req: ChatRequest =
        serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();

    assert_eq!(chat_req.model, DEFAULT_MODEL);
    assert!(!chat_req.stream);

    let envelope = transform_request(&chat_req).unwrap();
    assert_eq!(envelope.chute_name, DEFAULT_CHUTE);
}

#[test]
fn test_every_listed_model_maps_to_its_chute() {
    for (public, chute) in MODEL_MAPPING {
        let mut chat_req = load("chat_request_simple.json");
        chat_req.model = public.to_string();

        let envelope = transform_request(&chat_req).unwrap();
        assert_eq!(envelope.model, *public);
        assert_eq!(envelope.chute_name, *chute);
    }
}

#[test]
fn test_unlisted_model_is_echoed_with_fallback_chute() {
    let mut chat_req = load("chat_request_simple.json");
    chat_req.model = "meta-llama/Llama-4-Scout".to_string();

    let envelope = transform_request(&chat_req).unwrap();
    assert_eq!(envelope.model, "meta-llama/Llama-4-Scout");
    assert_eq!(envelope.chute_name, DEFAULT_CHUTE);
}

#[test]
fn test_empty_conversation_is_rejected() {
    let mut chat_req = load("chat_request_simple.json");
    chat_req.messages.clear();

    assert!(validate_chat_request(&chat_req).is_err());
    assert!(transform_request(&chat_req).is_err());
}
