//! Decodes the upstream server-sent-event stream into bare content
//! fragments.
//!
//! The upstream frames incremental output as `data: <json>` lines ending in
//! a literal `[DONE]` payload. The relay forwards only the delta text, with
//! no framing of its own, so the caller can concatenate chunks directly.

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const STREAM_TERMINATOR: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct DeltaChunk {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: DeltaContent,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaContent {
    content: Option<String>,
}

enum LineOutcome {
    Fragment(String),
    Terminated,
    Skip,
}

fn decode_line(line: &str) -> LineOutcome {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Skip;
    };
    if payload == STREAM_TERMINATOR {
        return LineOutcome::Terminated;
    }
    match serde_json::from_str::<DeltaChunk>(payload) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default();
            if content.is_empty() {
                LineOutcome::Skip
            } else {
                LineOutcome::Fragment(content)
            }
        }
        // Keep-alive artifacts and partial frames are not errors.
        Err(_) => LineOutcome::Skip,
    }
}

struct DecoderState<S> {
    upstream: S,
    buffer: String,
    done: bool,
}

/// Turn an upstream byte stream into a stream of content fragments.
///
/// Lines are buffered across chunk boundaries, the terminator is consumed
/// without being emitted, and transport errors end the stream after being
/// surfaced once.
pub fn content_fragments<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let state = DecoderState {
        upstream,
        buffer: String::new(),
        done: false,
    };
    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            while let Some(index) = state.buffer.find('\n') {
                let line: String = state.buffer.drain(..=index).collect();
                match decode_line(line.trim_end_matches('\n')) {
                    LineOutcome::Fragment(text) => {
                        return Some((Ok(Bytes::from(text)), state));
                    }
                    LineOutcome::Terminated => {
                        state.done = true;
                        return None;
                    }
                    LineOutcome::Skip => {}
                }
            }
            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&chunk));
                }
                Some(Err(error)) => {
                    state.done = true;
                    return Some((Err(error), state));
                }
                None => {
                    // A final line may arrive without a trailing newline.
                    let remainder = std::mem::take(&mut state.buffer);
                    state.done = true;
                    if let LineOutcome::Fragment(text) = decode_line(&remainder) {
                        return Some((Ok(Bytes::from(text)), state));
                    }
                    return None;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn delta_line(text: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}\n\n")
    }

    async fn collect(chunks: Vec<&str>) -> String {
        let upstream = stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk.to_string())))
                .collect::<Vec<_>>(),
        );
        let fragments: Vec<_> = content_fragments(upstream).collect().await;
        fragments
            .into_iter()
            .map(|fragment| {
                let bytes = fragment.expect("no transport errors in test stream");
                String::from_utf8(bytes.to_vec()).expect("valid utf-8")
            })
            .collect()
    }

    #[tokio::test]
    async fn reassembles_deltas_without_framing() {
        let first = delta_line("Hello");
        let second = delta_line(" world");
        let output = collect(vec![first.as_str(), second.as_str(), "data: [DONE]\n\n"]).await;
        assert_eq!(output, "Hello world");
    }

    #[tokio::test]
    async fn handles_frames_split_across_chunks() {
        let output = collect(vec![
            "data: {\"choices\":[{\"delta\":{\"cont",
            "ent\":\"Hi\"}}]}\n\ndata: [DONE]\n\n",
        ])
        .await;
        assert_eq!(output, "Hi");
    }

    #[tokio::test]
    async fn terminator_is_consumed_and_later_data_ignored() {
        let trailing = delta_line("late");
        let first = delta_line("only");
        let output = collect(vec![first.as_str(), "data: [DONE]\n\n", trailing.as_str()]).await;
        assert_eq!(output, "only");
    }

    #[tokio::test]
    async fn keep_alive_lines_are_ignored() {
        let first = delta_line("ok");
        let output = collect(vec![": ping\n\n", "data: not-json\n\n", first.as_str()]).await;
        assert_eq!(output, "ok");
    }

    #[tokio::test]
    async fn empty_deltas_produce_no_fragments() {
        let output = collect(vec![
            "data: {\"choices\":[{\"delta\":{}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;
        assert_eq!(output, "");
    }
}
