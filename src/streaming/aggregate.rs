use futures::StreamExt;

use crate::error::{ProxyError, Result};
use crate::models::openai::ChatCompletion;

use super::frame::{Frame, FrameStream};

/// Non-streaming mode: concatenate every delta into a single completion
///
/// Reading stops at the done sentinel or the end of the body. A stream that
/// produced no text at all is an [`ProxyError::EmptyResponse`].
pub async fn collect_completion(mut frames: FrameStream, model: &str) -> Result<ChatCompletion> {
    let mut content = String::new();
    let mut deltas = 0usize;

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Frame::Delta(text)) => {
                deltas += 1;
                content.push_str(&text);
            }
            Ok(Frame::Done) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read upstream response");
                return Err(ProxyError::StreamError(e.to_string()));
            }
        }
    }

    if content.is_empty() {
        tracing::warn!(model, "Upstream stream carried no content");
        return Err(ProxyError::EmptyResponse);
    }

    tracing::info!(model, deltas, chars = content.len(), "Aggregated completion");
    Ok(ChatCompletion::assistant(model, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    fn frames_of(items: Vec<std::io::Result<Frame>>) -> FrameStream {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn test_concatenates_in_order() {
        let frames = frames_of(vec![
            Ok(Frame::Delta("Hel".to_string())),
            Ok(Frame::Delta("lo".to_string())),
            Ok(Frame::Done),
        ]);

        let completion = collect_completion(frames, "m").await.unwrap();
        assert_eq!(completion.content(), "Hello");
        assert_eq!(completion.model, "m");
    }

    #[tokio::test]
    async fn test_empty_stream_is_error() {
        let frames = frames_of(vec![Ok(Frame::Done)]);
        let result = collect_completion(frames, "m").await;
        assert!(matches!(result, Err(ProxyError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_read_error_is_surfaced() {
        let frames = frames_of(vec![
            Ok(Frame::Delta("partial".to_string())),
            Err(std::io::Error::other("reset by peer")),
        ]);
        let result = collect_completion(frames, "m").await;
        assert!(matches!(result, Err(ProxyError::StreamError(_))));
    }

    #[tokio::test]
    async fn test_end_of_body_without_done() {
        let body: crate::provider::ByteStream = Box::pin(stream::iter(vec![Ok(
            Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n"),
        )]));

        let completion = collect_completion(crate::streaming::frames(body), "m")
            .await
            .unwrap();
        assert_eq!(completion.content(), "ok");
    }
}
