//! Incremental `text/event-stream` frame parser.
//!
//! Feeds arbitrary byte chunks in, yields decoded [`StreamEvent`]s out.
//! Frames that fail to decode are dropped with a debug log; the stream as a
//! whole keeps going (a malformed frame is not a transport failure).

use notify_types::StreamEvent;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
    data: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk, returning every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(newline) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line terminates the frame.
                if !self.data.is_empty() {
                    match StreamEvent::from_sse_data(&self.data) {
                        Ok(event) => events.push(event),
                        Err(e) => debug!(error = %e, "dropping undecodable sse frame"),
                    }
                    self.data.clear();
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(data.trim_start());
            }
            // `event:` lines are advisory (the payload is self-tagged) and
            // `:` comment lines are keep-alives; both are skipped.
        }
        events
    }
}
