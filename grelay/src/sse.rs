//! Incremental server-sent-event decoding.
//!
//! The decoder buffers raw bytes and emits the `data` payload of every
//! complete line. Network reads carry no framing guarantees: a single read
//! may hold several events, half an event, or half a UTF-8 sequence, so the
//! buffer is kept as bytes and only complete newline-terminated lines are
//! decoded. Feeding the same byte stream under any re-chunking yields the
//! same payload sequence.

use crate::RelayError;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the next chunk of body bytes and returns the `data`
    /// payloads of every line completed by it.
    ///
    /// Non-`data` lines (comments, `event:` fields, blank separators) are
    /// skipped. The terminal sentinel `[DONE]` is returned as a payload
    /// like any other.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>, RelayError> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_index).collect();
            let line = std::str::from_utf8(&line)
                .map_err(|err| RelayError::stream(err.to_string()))?
                .trim();

            if !line.starts_with("data:") {
                continue;
            }

            let payload = line.trim_start_matches("data:").trim();
            payloads.push(payload.to_string());
        }

        Ok(payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut SseDecoder, bytes: &[u8]) -> Vec<String> {
        decoder.feed(bytes).expect("feed should decode")
    }

    #[test]
    fn decodes_multiple_events_from_one_read() {
        let mut decoder = SseDecoder::new();
        let payloads = collect(&mut decoder, b"data: one\n\ndata: two\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["one", "two", "[DONE]"]);
    }

    #[test]
    fn holds_partial_lines_until_completed() {
        let mut decoder = SseDecoder::new();
        assert!(collect(&mut decoder, b"data: hel").is_empty());
        assert_eq!(collect(&mut decoder, b"lo\n"), vec!["hello"]);
    }

    #[test]
    fn byte_at_a_time_matches_single_read() {
        let wire = b"data: {\"a\":1}\n\ndata: [DONE]\n\n";

        let mut whole = SseDecoder::new();
        let expected = collect(&mut whole, wire);

        let mut split = SseDecoder::new();
        let mut actual = Vec::new();
        for byte in wire {
            actual.extend(collect(&mut split, &[*byte]));
        }

        assert_eq!(actual, expected);
    }

    #[test]
    fn tolerates_split_multibyte_text() {
        // "سلام" is four characters over eight bytes.
        let wire = "data: سلام\n".as_bytes();
        let mut decoder = SseDecoder::new();

        let mut payloads = Vec::new();
        for byte in wire {
            payloads.extend(collect(&mut decoder, &[*byte]));
        }

        assert_eq!(payloads, vec!["سلام"]);
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let payloads = collect(&mut decoder, b"data: one\r\n\r\ndata: two\r\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn skips_comment_and_field_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = collect(
            &mut decoder,
            b": keep-alive\nevent: message\nretry: 500\ndata: payload\n",
        );
        assert_eq!(payloads, vec!["payload"]);
    }

    #[test]
    fn invalid_utf8_in_a_complete_line_is_a_stream_error() {
        let mut decoder = SseDecoder::new();
        let err = decoder
            .feed(b"data: \xff\xfe\n")
            .expect_err("invalid utf-8 must fail");
        assert_eq!(err.kind, crate::RelayErrorKind::Stream);
    }
}
