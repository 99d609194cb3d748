use futures::{Stream, StreamExt, stream};
use std::collections::VecDeque;
use std::pin::Pin;

use crate::models::chutes::ChutesStreamChunk;
use crate::provider::ByteStream;

use super::lines::LineSplitter;

/// Prefix of every payload-carrying SSE line
pub const DATA_PREFIX: &str = "data: ";

/// Payload that ends the event stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// One meaningful event of the backend stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental assistant text
    Delta(String),
    /// End of generation
    Done,
}

/// Finite, non-restartable sequence of frames read from one response body
pub type FrameStream = Pin<Box<dyn Stream<Item = std::io::Result<Frame>> + Send>>;

/// Interpret a single line of the backend stream
///
/// Returns `None` for anything that carries no content: blank lines, lines
/// without the `data: ` prefix, malformed JSON, and payloads without a delta.
pub fn parse_line(line: &str) -> Option<Frame> {
    let data = line.strip_prefix(DATA_PREFIX)?;
    if data == DONE_SENTINEL {
        return Some(Frame::Done);
    }

    match serde_json::from_str::<ChutesStreamChunk>(data) {
        Ok(chunk) => chunk.text_delta().map(|text| Frame::Delta(text.to_string())),
        Err(e) => {
            tracing::debug!(error = %e, payload = data, "Skipping malformed stream line");
            None
        }
    }
}

struct FrameReader {
    body: ByteStream,
    splitter: LineSplitter,
    pending: VecDeque<String>,
    finished: bool,
}

/// Lazily turn a response body into frames
///
/// The sequence ends after [`Frame::Done`], at the end of the body, or after
/// yielding the first read error. Lines are pulled one body chunk at a time.
pub fn frames(body: ByteStream) -> FrameStream {
    let reader = FrameReader {
        body,
        splitter: LineSplitter::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(reader, |mut reader| async move {
        loop {
            while let Some(line) = reader.pending.pop_front() {
                match parse_line(&line) {
                    Some(Frame::Done) => {
                        reader.pending.clear();
                        reader.finished = true;
                        return Some((Ok(Frame::Done), reader));
                    }
                    Some(frame) => return Some((Ok(frame), reader)),
                    None => continue,
                }
            }

            if reader.finished {
                return None;
            }

            match reader.body.next().await {
                Some(Ok(chunk)) => {
                    let lines = reader.splitter.feed(&chunk);
                    reader.pending.extend(lines);
                }
                Some(Err(e)) => {
                    reader.finished = true;
                    return Some((Err(e), reader));
                }
                None => {
                    reader.finished = true;
                    reader.pending.extend(reader.splitter.finish());
                }
            }
        }
    }))
}
