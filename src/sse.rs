use log::debug;
use serde_json::Value;

/// Push-based decoder for the chat endpoint's event-stream body.
///
/// Network chunks go in through [`feed`](SseDecoder::feed); completed content
/// fragments come out. Lines may be split across chunks: incomplete input
/// stays buffered, and a `data:` line whose JSON payload does not parse yet
/// is pushed back and retried once more bytes arrive. A line is never
/// dropped, only deferred. The `[DONE]` sentinel ends the stream; everything
/// after it is ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    done: bool,
}

enum ParsedLine {
    Skip,
    Done,
    Token(String),
    Defer,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume one network chunk and return every content fragment completed
    /// by it, in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        if self.done {
            return tokens;
        }

        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        while let Some(newline_pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer[..newline_pos].to_string();
            self.buffer.drain(..newline_pos + 1);
            if line.ends_with('\r') {
                line.pop();
            }

            match parse_line(&line) {
                ParsedLine::Skip => continue,
                ParsedLine::Done => {
                    debug!("event stream completed with [DONE]");
                    self.done = true;
                    self.buffer.clear();
                    return tokens;
                }
                ParsedLine::Token(token) => tokens.push(token),
                ParsedLine::Defer => {
                    // Payload is not parseable yet; put the line back in
                    // front of the unread input so the next chunk can
                    // complete it.
                    self.buffer.insert_str(0, &line);
                    break;
                }
            }
        }

        tokens
    }

    /// Drain whatever still parses at true end of stream. Malformed trailing
    /// fragments are discarded.
    pub fn finish(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let remainder = std::mem::take(&mut self.buffer);
        let remainder = remainder.trim();
        if remainder.is_empty() {
            return None;
        }
        match parse_line(remainder) {
            ParsedLine::Token(token) => Some(token),
            _ => None,
        }
    }
}

fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return ParsedLine::Skip;
    }
    if trimmed.starts_with("event:") || trimmed.starts_with("id:") || trimmed.starts_with("retry:")
    {
        return ParsedLine::Skip;
    }

    let Some(payload) = trimmed.strip_prefix("data:") else {
        return ParsedLine::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return ParsedLine::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(json) => match delta_content(&json) {
            Some(token) => ParsedLine::Token(token),
            None => ParsedLine::Skip,
        },
        Err(err) => {
            debug!("re-buffering undecodable data line: {}", err);
            ParsedLine::Defer
        }
    }
}

/// Incremental text fragment at `choices[0].delta.content`, if present.
fn delta_content(json: &Value) -> Option<String> {
    json.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n",
            content
        )
    }

    #[test]
    fn assembles_tokens_across_chunks() {
        let mut decoder = SseDecoder::new();
        let mut out = String::new();

        for token in decoder.feed(delta_line("Hel").as_bytes()) {
            out.push_str(&token);
        }
        for token in decoder.feed(delta_line("lo").as_bytes()) {
            out.push_str(&token);
        }
        for token in decoder.feed(b"data: [DONE]\n") {
            out.push_str(&token);
        }

        assert_eq!(out, "Hello");
        assert!(decoder.is_done());
    }

    #[test]
    fn line_split_across_chunks_is_not_dropped() {
        let mut decoder = SseDecoder::new();
        let line = delta_line("whole");
        let (first, second) = line.split_at(18);

        assert!(decoder.feed(first.as_bytes()).is_empty());
        let tokens = decoder.feed(second.as_bytes());
        assert_eq!(tokens, vec!["whole".to_string()]);
    }

    #[test]
    fn raw_newline_inside_payload_is_deferred_and_recovered() {
        let mut decoder = SseDecoder::new();
        // The server leaks a raw newline inside the JSON string; the first
        // segment is a complete but unparseable line.
        let tokens =
            decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"one \n");
        assert!(tokens.is_empty());
        let tokens = decoder.feed(b"two\"}}]}\n");
        assert_eq!(tokens, vec!["one two".to_string()]);
    }

    #[test]
    fn comments_blanks_and_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let tokens = decoder.feed(b": keep-alive\n\nevent: message\nid: 4\nretry: 100\n");
        assert!(tokens.is_empty());

        let tokens = decoder.feed(delta_line("ok").as_bytes());
        assert_eq!(tokens, vec!["ok".to_string()]);
    }

    #[test]
    fn input_after_done_is_ignored() {
        let mut decoder = SseDecoder::new();
        let mut input = delta_line("before");
        input.push_str("data: [DONE]\n");
        input.push_str(&delta_line("after"));

        let tokens = decoder.feed(input.as_bytes());
        assert_eq!(tokens, vec!["before".to_string()]);
        assert!(decoder.feed(delta_line("later").as_bytes()).is_empty());
    }

    #[test]
    fn crlf_lines_are_handled() {
        let mut decoder = SseDecoder::new();
        let tokens = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\r\ndata: [DONE]\r\n",
        );
        assert_eq!(tokens, vec!["hi".to_string()]);
        assert!(decoder.is_done());
    }

    #[test]
    fn finish_flushes_parseable_tail_and_discards_garbage() {
        let mut decoder = SseDecoder::new();
        assert!(decoder
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")
            .is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"choi").is_empty());
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn payload_without_delta_content_is_skipped() {
        let mut decoder = SseDecoder::new();
        let tokens = decoder.feed(b"data: {\"choices\":[{\"finish_reason\":\"stop\"}]}\n");
        assert!(tokens.is_empty());
        assert!(!decoder.is_done());
    }
}
