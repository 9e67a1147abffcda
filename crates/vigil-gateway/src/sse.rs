//! Incremental server-sent-events frame decoder.
//!
//! The backend pushes frames as `data: <json>` lines terminated by a blank
//! line. Network chunks split frames at arbitrary byte boundaries, so the
//! decoder buffers until a complete line is available. Multiple `data:`
//! lines in one frame are joined with a newline; comment lines (leading
//! `:`) and other SSE fields (`event:`, `id:`, `retry:`) are ignored.

use vigil_core::{Result, VigilError};

/// Stateful decoder; feed it raw body chunks, collect frame payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one body chunk and returns every frame completed by it.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::MalformedMessage`] when a completed line is
    /// not valid UTF-8. Lines can only end at a newline byte, which never
    /// occurs inside a UTF-8 sequence, so chunk boundaries alone cannot
    /// trigger this.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = std::str::from_utf8(&raw[..newline])
                .map_err(|err| VigilError::malformed(format!("stream line is not UTF-8: {err}")))?;
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.is_empty() {
                // Blank line terminates a frame; a frame with no data lines
                // (e.g. a lone comment) produces nothing.
                if !self.data_lines.is_empty() {
                    frames.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data_lines
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
        }

        Ok(frames)
    }
}
