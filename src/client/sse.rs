/// Incremental decoder for the `text/event-stream` framing of the
/// compatible-mode endpoint: `data: <json>` lines terminated by `[DONE]`.
///
/// Transport chunks do not align with event boundaries, so the decoder
/// buffers a partial trailing line until the next chunk (or `finish`).
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport chunk, returning the data payloads of every
    /// complete event it closed. `[DONE]` markers are swallowed.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(data) = Self::parse_line(line.trim_end()) {
                events.push(data);
            }
        }
        events
    }

    /// Drains whatever complete line is still buffered when the transport
    /// closes without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(line.trim_end())
    }

    fn parse_line(line: &str) -> Option<String> {
        let data = line.strip_prefix("data:")?.trim_start();
        if data.is_empty() || data == "[DONE]" {
            None
        } else {
            Some(data.to_string())
        }
    }
}
