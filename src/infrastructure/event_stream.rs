// Incremental decoder for text/event-stream bodies
use bytes::{Buf, BytesMut};

const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

/// Splits an event-stream byte stream into message payloads.
///
/// Only the `data` and `event` fields matter here: `data` lines are joined with
/// `\n` and dispatched on a blank line. Events with a custom `event:` type are
/// skipped, as a browser `onmessage` handler would never see them.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: BytesMut,
    data: Vec<String>,
    event_type: Option<String>,
    started: bool,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every payload it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        // A byte order mark may only appear once, ahead of the first line
        if !self.started {
            if self.buffer.len() < BYTE_ORDER_MARK.len()
                && BYTE_ORDER_MARK.starts_with(&self.buffer[..])
            {
                return Vec::new();
            }
            if self.buffer.starts_with(BYTE_ORDER_MARK) {
                self.buffer.advance(BYTE_ORDER_MARK.len());
            }
            self.started = true;
        }

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(newline);
            self.buffer.advance(1);

            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            if let Some(payload) = self.process_line(line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    fn process_line(&mut self, line: &[u8]) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line[0] == b':' {
            return None;
        }

        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            // id and retry only matter for automatic reconnection
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event_type = self.event_type.take();
        let data = std::mem::take(&mut self.data);

        if data.is_empty() {
            return None;
        }
        match event_type.as_deref() {
            None | Some("") | Some("message") => Some(data.join("\n")),
            Some(other) => {
                tracing::debug!("Skipping event-stream event of type {}", other);
                None
            }
        }
    }
}
