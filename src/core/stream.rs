//! Incremental decoding of run bodies into [`StreamEvent`]s.
//!
//! The service frames runs as Server-Sent Events. Frames may be split across
//! transport chunks at any byte, so decoding buffers until a full line is
//! available and dispatches an event on each blank line.

use std::collections::VecDeque;

use futures_util::{stream, StreamExt};
use memchr::memchr;
use serde_json::Value;

use crate::api::Message;
use crate::core::backend::ByteStream;
use crate::core::error::{summarize_error_value, RelayError};

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

pub type EventStream = futures_util::stream::BoxStream<'static, Result<StreamEvent, RelayError>>;

/// A single dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a transport chunk, returning every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(relative) = memchr(b'\n', &self.buffer[start..]) {
            let newline = start + relative;
            let mut end = newline;
            if end > start && self.buffer[end - 1] == b'\r' {
                end -= 1;
            }
            // Lines never split a UTF-8 sequence: `\n` cannot occur inside one.
            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            start = newline + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        frames
    }

    /// Flush a trailing unterminated line and any frame still being built.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer).trim_end_matches('\r').to_string();
            self.buffer.clear();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: self.data.join("\n"),
            id: self.id.take(),
        };
        self.data.clear();
        Some(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEventKind {
    /// An incremental fragment (`messages` stream mode).
    Delta,
    /// The message so far (`messages/partial`).
    Partial,
    /// The finished message (`messages/complete`).
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Metadata(Value),
    Message {
        kind: MessageEventKind,
        message: Message,
        metadata: Option<Value>,
    },
    Other {
        event: String,
        data: Value,
    },
    End,
}

impl StreamEvent {
    pub fn is_assistant_delta(&self) -> bool {
        matches!(
            self,
            StreamEvent::Message {
                kind: MessageEventKind::Delta,
                message,
                ..
            } if message.is_assistant()
        )
    }

    /// Text carried by an assistant delta.
    pub fn delta_text(&self) -> Option<String> {
        match self {
            StreamEvent::Message {
                kind: MessageEventKind::Delta,
                message,
                ..
            } if message.is_assistant() => Some(message.text()),
            _ => None,
        }
    }
}

/// Turn one frame into zero or more events. An `error` frame becomes
/// [`RelayError::Run`].
pub fn decode_frame(frame: &SseFrame) -> Result<Vec<StreamEvent>, RelayError> {
    let data = if frame.data.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str::<Value>(&frame.data).map_err(|err| {
            RelayError::Decode(format!("invalid `{}` event payload: {err}", frame.event))
        })?
    };

    // Subgraph events carry their namespace after a `|`.
    let name = frame.event.split('|').next().unwrap_or_default();
    match name {
        "metadata" | "messages/metadata" => Ok(vec![StreamEvent::Metadata(data)]),
        "messages" => decode_message_tuple(data).map(|event| vec![event]),
        "messages/partial" => decode_message_list(data, MessageEventKind::Partial),
        "messages/complete" => decode_message_list(data, MessageEventKind::Complete),
        "error" => Err(RelayError::Run(summarize_error_value(&data))),
        "end" => Ok(vec![StreamEvent::End]),
        _ => Ok(vec![StreamEvent::Other {
            event: frame.event.clone(),
            data,
        }]),
    }
}

fn decode_message_tuple(data: Value) -> Result<StreamEvent, RelayError> {
    let (chunk, metadata) = match data {
        Value::Array(mut items) if !items.is_empty() => {
            let metadata = if items.len() > 1 {
                Some(items.swap_remove(1))
            } else {
                None
            };
            (items.swap_remove(0), metadata)
        }
        other => (other, None),
    };
    let message = parse_message(chunk)?;
    Ok(StreamEvent::Message {
        kind: MessageEventKind::Delta,
        message,
        metadata,
    })
}

fn decode_message_list(
    data: Value,
    kind: MessageEventKind,
) -> Result<Vec<StreamEvent>, RelayError> {
    let Value::Array(items) = data else {
        return Err(RelayError::Decode(
            "expected a list of messages".to_string(),
        ));
    };
    items
        .into_iter()
        .map(|item| {
            parse_message(item).map(|message| StreamEvent::Message {
                kind,
                message,
                metadata: None,
            })
        })
        .collect()
}

fn parse_message(value: Value) -> Result<Message, RelayError> {
    serde_json::from_value(value)
        .map_err(|err| RelayError::Decode(format!("invalid message in stream: {err}")))
}

struct DecodeState {
    body: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamEvent, RelayError>>,
    body_done: bool,
    finished: bool,
}

impl DecodeState {
    fn enqueue(&mut self, frame: &SseFrame) {
        match decode_frame(frame) {
            Ok(events) => self.pending.extend(events.into_iter().map(Ok)),
            Err(err) => self.pending.push_back(Err(err)),
        }
    }
}

/// Decode a run body into events. The sequence ends after the first `End`
/// or error; a body that closes without an `end` frame still yields `End`.
pub fn decode_events(body: ByteStream) -> EventStream {
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        body_done: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some(item) = state.pending.pop_front() {
                if matches!(item, Ok(StreamEvent::End) | Err(_)) {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }

            if state.body_done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for frame in state.decoder.push(&chunk) {
                        state.enqueue(&frame);
                    }
                }
                Some(Err(err)) => state.pending.push_back(Err(err)),
                None => {
                    state.body_done = true;
                    if let Some(frame) = state.decoder.finish() {
                        state.enqueue(&frame);
                    }
                    state.pending.push_back(Ok(StreamEvent::End));
                }
            }
        }
    })
    .boxed()
}
