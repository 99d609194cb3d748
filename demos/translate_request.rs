use chutes_openai_proxy::models::openai::{ChatMessage, ChatRequest};
use chutes_openai_proxy::transform::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create an OpenAI chat request with some history
    let chat_request = ChatRequest {
        model: "Qwen/Qwen2.5-72B-Instruct".to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: "You are a professional Rust engineer.".into(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: "What is Rust?".into(),
            },
        ],
        stream: true,
    };

    println!("Original OpenAI Request:");
    println!("{}", serde_json::to_string_pretty(&chat_request)?);
    println!("\n{}", "=".repeat(80));

    // Validate the request
    validate_chat_request(&chat_request)?;
    println!("\nRequest validation passed");

    // Map the model name
    let chute = map_model_name(&chat_request.model);
    println!("Model mapping: {} -> {}", chat_request.model, chute);

    // Transform to the Chutes envelope
    let envelope = transform_request(&chat_request)?;
    println!("\n{}", "=".repeat(80));
    println!("\nChutes Envelope (last message only):");
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    let json_bytes = serde_json::to_vec(&envelope)?;
    println!("\nSerialized size: {} bytes", json_bytes.len());

    Ok(())
}
