//! Incremental parser for `data:` line streams
//!
//! The character generator answers with newline-delimited lines of the form
//! `data: {json}` and finishes with `data: [DONE]`. Chunks from the network
//! can split a line anywhere (even inside a multi-byte character), so bytes
//! are buffered until a full line is available.

use futures::StreamExt;
use serde_json::Value;

use crate::api::client::ByteStream;
use crate::error::LoomError;

/// Sentinel payload marking the end of the stream
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data:";

/// Receives the parsed stream
pub trait StreamHandler {
    /// One parsed JSON payload, in arrival order
    fn on_chunk(&mut self, chunk: Value);
    /// The stream finished (sentinel seen or body ended)
    fn on_complete(&mut self);
    /// The request or the body failed; no completion follows
    fn on_error(&mut self, error: LoomError);
}

/// Adapts three closures into a [`StreamHandler`]
pub struct StreamCallbacks<C, D, E> {
    pub on_chunk: C,
    pub on_complete: D,
    pub on_error: E,
}

impl<C, D, E> StreamHandler for StreamCallbacks<C, D, E>
where
    C: FnMut(Value),
    D: FnMut(),
    E: FnMut(LoomError),
{
    fn on_chunk(&mut self, chunk: Value) {
        (self.on_chunk)(chunk)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }

    fn on_error(&mut self, error: LoomError) {
        (self.on_error)(error)
    }
}

/// Parsed unit of the stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(Value),
    Done,
}

/// Splits raw bytes into `data:` events
#[derive(Debug, Default)]
pub struct LineParser {
    buffer: Vec<u8>,
    done: bool,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume a chunk of bytes and return every complete event in it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.parse_line(&line) {
                let finished = event == StreamEvent::Done;
                events.push(event);
                if finished {
                    self.done = true;
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flush a trailing line that had no newline
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.buffer);
        match self.parse_line(&line) {
            Some(event) => {
                if event == StreamEvent::Done {
                    self.done = true;
                }
                vec![event]
            }
            None => Vec::new(),
        }
    }

    fn parse_line(&self, raw: &[u8]) -> Option<StreamEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();

        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            return Some(StreamEvent::Done);
        }

        match serde_json::from_str(payload) {
            Ok(value) => Some(StreamEvent::Chunk(value)),
            Err(e) => {
                tracing::warn!("Skipping malformed stream line: {} ({})", payload, e);
                None
            }
        }
    }
}

/// Feed a byte stream through the parser into `handler`
///
/// Calls `on_complete` once when the sentinel arrives or the body ends, or
/// `on_error` once if reading the body fails.
pub async fn drive<H: StreamHandler>(mut body: ByteStream, handler: &mut H) {
    let mut parser = LineParser::new();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for event in parser.feed(&bytes) {
                    match event {
                        StreamEvent::Chunk(value) => handler.on_chunk(value),
                        StreamEvent::Done => {
                            handler.on_complete();
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                handler.on_error(LoomError::Stream(e.to_string()));
                return;
            }
        }
    }

    for event in parser.finish() {
        if let StreamEvent::Chunk(value) = event {
            handler.on_chunk(value);
        }
    }
    handler.on_complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use futures::stream;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<Value>,
        completed: usize,
        errors: Vec<String>,
    }

    impl StreamHandler for Recorder {
        fn on_chunk(&mut self, chunk: Value) {
            self.chunks.push(chunk);
        }
        fn on_complete(&mut self) {
            self.completed += 1;
        }
        fn on_error(&mut self, error: LoomError) {
            self.errors.push(error.to_string());
        }
    }

    fn body_of(parts: Vec<Result<Vec<u8>>>) -> ByteStream {
        stream::iter(parts).boxed()
    }

    #[tokio::test]
    async fn test_chunks_then_done_completes_once() {
        let body = body_of(vec![Ok(
            b"data: {\"step\": 1}\ndata: {\"step\": 2}\ndata: [DONE]\n".to_vec(),
        )]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert_eq!(recorder.chunks, vec![json!({"step": 1}), json!({"step": 2})]);
        assert_eq!(recorder.completed, 1);
        assert!(recorder.errors.is_empty());
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let body = body_of(vec![
            Ok(b"data: {\"na".to_vec()),
            Ok(b"me\": \"Aria\"}\n\ndata: {\"name\"".to_vec()),
            Ok(b": \"Bren\"}\nda".to_vec()),
            Ok(b"ta: [DONE]\n".to_vec()),
        ]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert_eq!(
            recorder.chunks,
            vec![json!({"name": "Aria"}), json!({"name": "Bren"})]
        );
        assert_eq!(recorder.completed, 1);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_between_chunks() {
        let line = "data: {\"name\": \"아리아\"}\n".as_bytes().to_vec();
        let (head, tail) = line.split_at(20);
        let body = body_of(vec![Ok(head.to_vec()), Ok(tail.to_vec())]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert_eq!(recorder.chunks, vec![json!({"name": "아리아"})]);
        assert_eq!(recorder.completed, 1);
    }

    #[tokio::test]
    async fn test_nothing_after_done_is_delivered() {
        let body = body_of(vec![
            Ok(b"data: [DONE]\ndata: {\"late\": true}\n".to_vec()),
            Ok(b"data: {\"later\": true}\n".to_vec()),
        ]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert!(recorder.chunks.is_empty());
        assert_eq!(recorder.completed, 1);
    }

    #[tokio::test]
    async fn test_body_ending_without_sentinel_still_completes() {
        let body = body_of(vec![Ok(b"data: {\"partial\": true}".to_vec())]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert_eq!(recorder.chunks, vec![json!({"partial": true})]);
        assert_eq!(recorder.completed, 1);
    }

    #[tokio::test]
    async fn test_read_failure_reports_error_without_completion() {
        let body = body_of(vec![
            Ok(b"data: {\"step\": 1}\n".to_vec()),
            Err(LoomError::Custom("connection reset".into())),
        ]);
        let mut recorder = Recorder::default();

        drive(body, &mut recorder).await;

        assert_eq!(recorder.chunks.len(), 1);
        assert_eq!(recorder.completed, 0);
        assert_eq!(recorder.errors.len(), 1);
    }

    #[test]
    fn test_parser_skips_comments_and_malformed_lines() {
        let mut parser = LineParser::new();
        let events = parser.feed(b": keep-alive\nevent: progress\ndata: {oops\ndata: {\"ok\": 1}\r\n");
        assert_eq!(events, vec![StreamEvent::Chunk(json!({"ok": 1}))]);
        assert!(!parser.is_done());
    }

    #[test]
    fn test_callbacks_adapter() {
        let mut seen = Vec::new();
        let mut done = 0;
        {
            let mut callbacks = StreamCallbacks {
                on_chunk: |v: Value| seen.push(v),
                on_complete: || done += 1,
                on_error: |_e: LoomError| {},
            };
            callbacks.on_chunk(json!(1));
            callbacks.on_complete();
        }
        assert_eq!(seen, vec![json!(1)]);
        assert_eq!(done, 1);
    }
}
