use chutes_openai_proxy::streaming::{Frame, LineSplitter, SSEEventGenerator, parse_line};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Chutes Stream Re-framing Demo\n");
    println!("{}", "=".repeat(80));

    // Load a recorded backend stream
    let raw = fs::read_to_string("tests/fixtures/chutes_stream.txt")?;
    println!("\nOriginal Chutes Stream:");
    println!("{}", raw);
    println!("{}", "=".repeat(80));

    let mut splitter = LineSplitter::new();
    let mut generator = SSEEventGenerator::new("deepseek-ai/DeepSeek-R1".to_string());
    let mut total_text = String::new();

    // Simulate small network chunks that cut lines in half
    for (i, chunk) in raw.as_bytes().chunks(64).enumerate() {
        let lines = splitter.feed(chunk);
        println!(
            "Chunk {} ({} bytes): {} complete line(s), {} bytes buffered",
            i + 1,
            chunk.len(),
            lines.len(),
            splitter.pending()
        );

        for line in lines {
            let Some(frame) = parse_line(&line) else {
                continue;
            };
            if let Frame::Delta(text) = &frame {
                total_text.push_str(text);
            }
            let event = generator.generate_event(frame);
            println!("   SSE: {}", event.trim_end());
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("Content chunks: {}", generator.chunks_sent());
    println!("Sentinel sent: {}", generator.is_done());
    println!("Assembled text: \"{}\"", total_text);

    Ok(())
}
