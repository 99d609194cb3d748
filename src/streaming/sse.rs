use bytes::Bytes;
use futures::{Stream, StreamExt, future};

use crate::models::openai::ChatCompletionChunk;

use super::frame::{DONE_SENTINEL, Frame, FrameStream};

/// Converts backend frames to OpenAI chunk SSE records
pub struct SSEEventGenerator {
    model_name: String,
    chunks_sent: usize,
    done_sent: bool,
}

impl SSEEventGenerator {
    pub fn new(model_name: String) -> Self {
        Self {
            model_name,
            chunks_sent: 0,
            done_sent: false,
        }
    }

    /// Render one frame as a complete `data: ...\n\n` record
    pub fn generate_event(&mut self, frame: Frame) -> String {
        match frame {
            Frame::Delta(text) => {
                self.chunks_sent += 1;
                self.format_chunk(&text)
            }
            Frame::Done => {
                self.done_sent = true;
                Self::format_done()
            }
        }
    }

    fn format_chunk(&self, text: &str) -> String {
        let chunk = ChatCompletionChunk::delta(&self.model_name, text);
        // serializing plain strings and integers cannot fail
        let data = serde_json::to_string(&chunk).unwrap_or_default();
        format!("data: {}\n\n", data)
    }

    pub fn format_done() -> String {
        format!("data: {}\n\n", DONE_SENTINEL)
    }

    /// Number of content chunks emitted so far
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    pub fn is_done(&self) -> bool {
        self.done_sent
    }
}

/// Streaming mode: re-frame the backend stream as OpenAI chunk records
///
/// A body read error cannot change the already-sent status, so it is logged
/// and the stream simply ends.
pub fn transform_to_sse(
    frames: FrameStream,
    model: String,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
    let mut generator = SSEEventGenerator::new(model);

    frames
        .take_while(|frame| {
            if let Err(e) = frame {
                tracing::warn!(error = %e, "Upstream stream failed, closing response");
            }
            future::ready(frame.is_ok())
        })
        .filter_map(move |frame| {
            let event = frame.ok().map(|frame| {
                let event = generator.generate_event(frame);
                if generator.is_done() {
                    tracing::info!(chunks = generator.chunks_sent(), "Stream complete");
                }
                Ok(Bytes::from(event))
            });
            future::ready(event)
        })
}
