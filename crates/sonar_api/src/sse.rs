/// One drained unit from the SSE parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Raw `data:` payload of one event, still unparsed.
    Data(String),
    /// The `[DONE]` sentinel. Iteration stops here; the sentinel is never
    /// handed to the JSON layer.
    Done,
}

/// Incremental parser for SSE text streams.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete frames.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut frames = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            if let Some(payload) = extract_data_payload(&frame) {
                if payload == "[DONE]" {
                    frames.push(SseFrame::Done);
                } else {
                    frames.push(SseFrame::Data(payload));
                }
            }
        }

        frames
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<SseFrame> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::{SseFrame, SseStreamParser};

    #[test]
    fn parse_sse_frames_incrementally() {
        let mut parser = SseStreamParser::default();
        let mut frames = Vec::new();

        frames.extend(parser.feed(b"data: {\"choices\":[]}\n\n"));
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], SseFrame::Data(_)));

        frames.extend(parser.feed(b"data: [DONE]\n\n"));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], SseFrame::Done);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn done_sentinel_is_not_treated_as_payload() {
        let frames = SseStreamParser::parse_frames("data: [DONE]\n\n");
        assert_eq!(frames, vec![SseFrame::Done]);
    }
}
