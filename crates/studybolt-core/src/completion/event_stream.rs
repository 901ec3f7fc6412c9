/// Incremental `text/event-stream` decoder.
///
/// Bytes are fed in whatever chunks the network delivers; complete events come
/// out as their joined `data` payloads. Only the `data` field is retained.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning the payloads of every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_events() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b"data: {\"a\":1}\n\ndata: [DONE]\n\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn events_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        assert!(decoder.push(b"lo\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec!["hello".to_string()]);
    }

    #[test]
    fn multibyte_characters_split_across_chunks() {
        let text = "data: ñandú\n\n".as_bytes();
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(&text[..7]).is_empty());
        assert_eq!(decoder.push(&text[7..]), vec!["ñandú".to_string()]);
    }

    #[test]
    fn comments_and_other_fields_ignored() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b": keep-alive\n\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn multi_line_data_joined() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b"data: one\ndata: two\n\n");
        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
        assert!(decoder.finish().is_empty());
    }
}
