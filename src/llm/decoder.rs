//! Reassembly of streamed model answers.
//!
//! A chat endpoint in streaming mode answers with newline-delimited JSON
//! objects, each optionally carrying a `message.content` fragment. Network
//! chunk boundaries do not line up with line boundaries, so the decoder keeps
//! the unfinished tail of the byte stream between chunks.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

/// Incremental NDJSON decoder that concatenates `message.content` fragments
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    text: String,
    skipped: usize,
}

impl StreamDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of bytes, consuming every complete line it closes
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        while let Some(boundary) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=boundary).collect();
            self.ingest_line(&line[..boundary]);
        }
    }

    /// Text decoded so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of complete lines that could not be parsed
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// End of stream: try the trailing partial line once, then return the text
    pub fn finish(mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        let rest = trim_line(&rest);

        if !rest.is_empty() {
            match parse_fragment(rest) {
                Some(fragment) => self.text.push_str(&fragment),
                None => debug!(bytes = rest.len(), "Discarding trailing partial line"),
            }
        }

        self.text
    }

    fn ingest_line(&mut self, line: &[u8]) {
        let line = trim_line(line);
        if line.is_empty() {
            return;
        }

        match parse_fragment(line) {
            Some(fragment) => self.text.push_str(&fragment),
            None => {
                self.skipped += 1;
                warn!(
                    line = %String::from_utf8_lossy(line),
                    "Could not parse a line from the model stream"
                );
            }
        }
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

/// Parsed line -> its content fragment (empty when the object carries none).
/// `None` means the line was not valid JSON.
fn parse_fragment(line: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(line).ok()?;
    let fragment = value
        .pointer("/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(fragment.to_string())
}

/// Drain a chunked byte stream through a [`StreamDecoder`]
pub async fn decode_stream<S, B, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut decoder = StreamDecoder::new();
    futures::pin_mut!(stream);

    while let Some(chunk) = stream.next().await {
        decoder.push(chunk?.as_ref());
    }

    Ok(decoder.finish())
}

/// Unwrap the first complete fenced code block (```` ``` ```` or ```` ```json ````).
///
/// Backticks that do not open a well-formed fence, such as ```` ``` ````
/// mentioned inline in prose, are skipped. Falls back to the whole text when
/// no complete fence is present. The result is trimmed either way.
pub fn extract_fenced(text: &str) -> &str {
    fenced_body(text).unwrap_or(text).trim()
}

fn fenced_body(text: &str) -> Option<&str> {
    text.match_indices("```")
        .find_map(|(open, ticks)| fence_at(&text[open + ticks.len()..]))
}

/// Body of a fence whose opening ticks end right before `after_ticks`
fn fence_at(after_ticks: &str) -> Option<&str> {
    let header_end = after_ticks.find('\n')?;

    let tag = after_ticks[..header_end].trim();
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }

    let body = &after_ticks[header_end + 1..];
    if body.starts_with("```") {
        return Some("");
    }
    let close = body.find("\n```")?;
    Some(&body[..close])
}
