// src/sse.rs
// Incremental decoder for text/event-stream bodies carrying JSON `data` payloads

use crate::error::{BridgeError, Result};
use futures::stream::{Stream, StreamExt, unfold};
use serde_json::Value;
use std::pin::Pin;

/// Pull-based SSE decoder.
///
/// Bytes are pushed in whatever fragments the transport delivers; complete
/// events are pulled out with [`SseDecoder::next_event`]. Only the `data` field
/// is interpreted. Comment lines (`:keepalive`), lines without a colon and any
/// other field are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Start of the first line not yet processed
    start: usize,
    /// `buffer[start..scanned]` holds no newline
    scanned: usize,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes
    pub fn push(&mut self, chunk: &[u8]) {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete event, if one is fully buffered
    pub fn next_event(&mut self) -> Option<Result<Value>> {
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let line = self.buffer[self.start..end].to_vec();
            self.start = end + 1;
            self.scanned = self.start;
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.scanned = self.buffer.len();
        None
    }

    /// Flush whatever is left once the underlying stream has ended.
    ///
    /// A trailing line without a newline and a pending event without the
    /// terminating blank line are both still dispatched.
    pub fn finish(&mut self) -> Option<Result<Value>> {
        let line = self.buffer.split_off(self.start);
        self.buffer.clear();
        self.start = 0;
        self.scanned = 0;
        if !line.is_empty() {
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &[u8]) -> Option<Result<Value>> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }

        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(e) => {
                return Some(Err(BridgeError::StreamDecode(format!(
                    "invalid UTF-8 in event stream: {}",
                    e
                ))));
            }
        };

        let Some((field, value)) = line.split_once(':') else {
            return None;
        };
        if field.trim() != "data" {
            return None;
        }

        let value = value.strip_prefix(' ').unwrap_or(value);
        match self.data.as_mut() {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
        None
    }

    fn dispatch(&mut self) -> Option<Result<Value>> {
        let data = self.data.take()?;
        Some(serde_json::from_str(&data).map_err(|e| {
            BridgeError::StreamDecode(format!("invalid JSON in data field ({}): {}", e, data))
        }))
    }
}

struct DecodeState<S> {
    chunks: Pin<Box<S>>,
    decoder: SseDecoder,
    finished: bool,
}

/// Decode a stream of byte chunks into a lazy, finite stream of JSON documents.
///
/// The returned stream ends after the first error (decode or transport) and
/// cannot be restarted; a fresh call is needed per body.
pub fn decode_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<Value>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = DecodeState {
        chunks: Box::pin(chunks),
        decoder: SseDecoder::new(),
        finished: false,
    };

    unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            if let Some(item) = state.decoder.next_event() {
                state.finished = item.is_err();
                return Some((item, state));
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => state.decoder.push(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    let err = BridgeError::LaunchService(format!("event stream interrupted: {}", e));
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    return state.decoder.finish().map(|item| (item, state));
                }
            }
        }
    })
}
