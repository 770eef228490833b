//! Stream decoder for the answering service's response body.
//!
//! The body is newline-delimited text. Only lines starting with `data: `
//! carry protocol records; everything else (blank separators, `event:` lines,
//! `:` heartbeats) is skipped. Each record is JSON with a `type` field:
//!
//! ```text
//! data: {"type":"token","content":"BFS "}
//! data: {"type":"sources","sources":[{"resource_id":"r1","index":1,...}]}
//! data: {"type":"done"}
//! ```
//!
//! Records that fail to parse, or carry a `type` we don't know, are dropped
//! and decoding carries on.

use std::collections::VecDeque;

use futures::{Stream, StreamExt};
use log::{debug, warn};
use serde::Deserialize;

use super::types::{Source, StreamEvent};

/// Prefix marking a protocol-significant line.
pub const EVENT_PREFIX: &str = "data: ";

/// Wire shape of a record, discriminated by `type`.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Token { content: String },
    Sources { sources: Vec<Source> },
    Done,
    NoContext,
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

impl From<WireEvent> for StreamEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Token { content } => StreamEvent::Token(content),
            WireEvent::Sources { sources } => StreamEvent::Sources(sources),
            WireEvent::Done => StreamEvent::Done,
            WireEvent::NoContext => StreamEvent::NoContext,
            WireEvent::Error { message } => {
                StreamEvent::Error(message.unwrap_or_else(|| "unknown error".to_string()))
            }
        }
    }
}

/// Resumable line parser.
///
/// Holds at most one partial line between calls to [`feed`](Self::feed). The
/// buffer is raw bytes so a multi-byte character split across two network
/// reads is reassembled before it is decoded.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    partial: Vec<u8>,
    dropped: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk and return the events completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            let event = if self.partial.is_empty() {
                self.decode_line(head)
            } else {
                self.partial.extend_from_slice(head);
                let line = std::mem::take(&mut self.partial);
                self.decode_line(&line)
            };
            events.extend(event);
        }

        self.partial.extend_from_slice(rest);
        events
    }

    /// End of data. Whatever partial line is still buffered is discarded.
    ///
    /// Returns how many marker lines were dropped as malformed or
    /// unrecognized over the whole body.
    pub fn finish(&mut self) -> usize {
        if self.pending() > 0 {
            debug!(
                "Discarding {} bytes of unterminated line at end of stream",
                self.pending()
            );
            self.partial.clear();
        }
        if self.dropped > 0 {
            warn!("Answer body had {} unreadable records", self.dropped);
        }
        self.dropped
    }

    /// Bytes buffered while waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        let payload = line.strip_prefix(EVENT_PREFIX)?;

        match serde_json::from_str::<WireEvent>(payload) {
            Ok(event) => Some(event.into()),
            Err(e) => {
                self.dropped += 1;
                debug!("Dropping record ({e}): {payload}");
                None
            }
        }
    }
}

/// Decode every chunk of an in-memory body. Convenience for replaying
/// captured responses.
pub fn decode_all<I, B>(chunks: I) -> Vec<StreamEvent>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut decoder = StreamDecoder::new();
    let events: Vec<StreamEvent> = chunks
        .into_iter()
        .flat_map(|chunk| decoder.feed(chunk.as_ref()))
        .collect();
    decoder.finish();
    events
}

/// Lazily decode a fallible byte stream (e.g. `reqwest::Response::bytes_stream`).
///
/// The returned stream yields events as soon as their line is complete. A
/// transport error is yielded once and ends the stream.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Result<StreamEvent, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = (body, StreamDecoder::new(), VecDeque::new(), false);
    futures::stream::unfold(state, |(mut body, mut decoder, mut ready, failed)| async move {
        loop {
            if let Some(event) = ready.pop_front() {
                return Some((Ok(event), (body, decoder, ready, failed)));
            }
            if failed {
                return None;
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.feed(chunk.as_ref())),
                Some(Err(e)) => return Some((Err(e), (body, decoder, ready, true))),
                None => {
                    decoder.finish();
                    return None;
                }
            }
        }
    })
}
