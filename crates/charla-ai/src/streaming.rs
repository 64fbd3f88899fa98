//! Server-sent-events framing for streamed completions.
//!
//! The chat completions endpoint streams token deltas as SSE `data:` payloads
//! terminated by a `[DONE]` sentinel. The framer assembles payloads from raw
//! lines; sentinel handling is left to the caller.

use futures_util::StreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::CompletionError;

/// Accumulates `data:` lines into complete event payloads.
///
/// Multi-line data fields are joined with `\n` per the SSE spec; fields other
/// than `data` (`id:`, `retry:`, comments) are ignored because the endpoint
/// does not use them.
#[derive(Debug, Default)]
pub(crate) struct DataFramer {
    buf: String,
}

impl DataFramer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one line; a blank line completes the pending payload.
    pub(crate) fn push_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.buf.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.buf));
        }
        if let Some(data) = line.strip_prefix("data: ") {
            if !self.buf.is_empty() {
                self.buf.push('\n');
            }
            self.buf.push_str(data);
        }
        None
    }

    /// Flush a payload left unterminated at end of stream.
    pub(crate) fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

/// Read an SSE response body, calling `on_data` with each event payload.
pub(crate) async fn for_each_data(
    response: reqwest::Response,
    mut on_data: impl FnMut(String),
) -> Result<(), CompletionError> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    let mut lines = reader.lines();

    let mut framer = DataFramer::new();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| CompletionError::Connection(e.to_string()))?
    {
        if let Some(payload) = framer.push_line(&line) {
            on_data(payload);
        }
    }
    if let Some(payload) = framer.finish() {
        on_data(payload);
    }

    Ok(())
}
