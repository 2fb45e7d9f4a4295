//! Decoding of the backend's `data:`-framed event stream
//!
//! Each logical line looks like `data: <payload>` where the payload is either
//! a JSON object carrying `debateId` or `content`, or the literal `[DONE]`.
//! Chunks arrive with arbitrary boundaries, so [`LineDecoder`] keeps the
//! unfinished tail of the previous chunk until the rest of the line shows up.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Payload marking the end of one AI response
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data:";

/// One decoded stream line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text of the AI response
    Fragment(String),
    /// Remote debate identifier, sent once at the start of a session
    RemoteId(String),
    /// End of the response
    Done,
    /// A `data:` line whose payload could not be understood
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(rename = "debateId")]
    debate_id: Option<Value>,
    content: Option<String>,
}

/// Decode one line. Returns `None` for lines that carry no event
/// (blank lines, `:` comments, other SSE fields).
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim_end_matches('\r');
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();

    if payload == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    let event = match serde_json::from_str::<Payload>(payload) {
        Ok(Payload {
            debate_id: Some(Value::String(id)),
            ..
        }) => StreamEvent::RemoteId(id),
        Ok(Payload {
            debate_id: Some(Value::Number(id)),
            ..
        }) => StreamEvent::RemoteId(id.to_string()),
        Ok(Payload {
            content: Some(content),
            ..
        }) => StreamEvent::Fragment(content),
        _ => StreamEvent::Malformed(payload.to_string()),
    };
    Some(event)
}

/// Incremental byte-to-event decoder for one response stream
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event it completes, in arrival order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            events.extend(decode_line(&text));
        }

        // Servers do not always terminate the last line of a chunk. An
        // unterminated tail that already decodes cleanly is consumed now,
        // anything else waits for more bytes.
        if let Some(event) = self.complete_tail() {
            self.buffer.clear();
            events.push(event);
        }

        for event in &events {
            if let StreamEvent::Malformed(raw) = event {
                warn!(line = %raw, "Skipping malformed stream line");
            }
        }
        events
    }

    /// Flush whatever is left once the stream has closed
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        let events: Vec<StreamEvent> = decode_line(text.trim()).into_iter().collect();
        for event in &events {
            if let StreamEvent::Malformed(raw) = event {
                warn!(line = %raw, "Discarding incomplete stream line");
            }
        }
        events
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes held back waiting for the end of a line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn complete_tail(&self) -> Option<StreamEvent> {
        let text = std::str::from_utf8(&self.buffer).ok()?;
        match decode_line(text)? {
            StreamEvent::Malformed(_) => None,
            event => Some(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_variants() {
        assert_eq!(
            decode_line(r#"data: {"debateId":"abc"}"#),
            Some(StreamEvent::RemoteId("abc".to_string()))
        );
        assert_eq!(
            decode_line(r#"data: {"content":"Hello"}"#),
            Some(StreamEvent::Fragment("Hello".to_string()))
        );
        assert_eq!(decode_line("data: [DONE]"), Some(StreamEvent::Done));
        assert_eq!(decode_line("data:[DONE]\r"), Some(StreamEvent::Done));
        assert_eq!(
            decode_line("data: not json"),
            Some(StreamEvent::Malformed("not json".to_string()))
        );
        assert_eq!(decode_line(": keep-alive"), None);
        assert_eq!(decode_line("event: message"), None);
        assert_eq!(decode_line(""), None);
    }

    #[test]
    fn test_fragment_whitespace_is_preserved() {
        assert_eq!(
            decode_line(r#"data: {"content":" world"}"#),
            Some(StreamEvent::Fragment(" world".to_string()))
        );
    }

    #[test]
    fn test_unknown_object_is_malformed() {
        assert!(matches!(
            decode_line(r#"data: {"status":"ok"}"#),
            Some(StreamEvent::Malformed(_))
        ));
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"conte").is_empty());
        assert!(decoder.pending() > 0);
        let events = decoder.push(b"nt\":\"Hi\"}\ndata: [DONE]\n");
        assert_eq!(
            events,
            vec![StreamEvent::Fragment("Hi".to_string()), StreamEvent::Done]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let line = "data: {\"content\":\"café\"}\n".as_bytes();
        let split = line.len() - 4;
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(
            decoder.push(&line[split..]),
            vec![StreamEvent::Fragment("café".to_string())]
        );
    }

    #[test]
    fn test_unterminated_complete_line_is_consumed() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"data: [DONE]"), vec![StreamEvent::Done]);
        assert_eq!(decoder.pending(), 0);
        assert!(decoder.push(b"\n\n").is_empty());
    }

    #[test]
    fn test_malformed_line_does_not_stop_decoding() {
        let mut decoder = LineDecoder::new();
        let events = decoder.push(b"data: {oops\ndata: {\"content\":\"a\"}\n");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Malformed(_)));
        assert_eq!(events[1], StreamEvent::Fragment("a".to_string()));
    }

    #[test]
    fn test_finish_flushes_tail() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"cut").is_empty());
        let events = decoder.finish();
        assert!(matches!(events.as_slice(), [StreamEvent::Malformed(_)]));
        assert_eq!(decoder.pending(), 0);
    }

    proptest! {
        #[test]
        fn prop_fragments_survive_any_chunking(
            fragments in proptest::collection::vec(".{0,12}", 1..8),
            cuts in proptest::collection::vec(0usize..400, 0..6),
        ) {
            let mut wire = String::new();
            for fragment in &fragments {
                let payload = serde_json::json!({ "content": fragment });
                wire.push_str(&format!("data: {payload}\n\n"));
            }
            wire.push_str("data: [DONE]\n\n");
            let bytes = wire.as_bytes();

            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c % (bytes.len() + 1)).collect();
            cuts.sort_unstable();
            cuts.dedup();

            let mut decoder = LineDecoder::new();
            let mut events = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
                events.extend(decoder.push(&bytes[start..cut]));
                start = cut;
            }

            let text: String = events
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::Fragment(f) => Some(f.as_str()),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(text, fragments.concat());
            prop_assert_eq!(events.last(), Some(&StreamEvent::Done));
        }
    }
}
