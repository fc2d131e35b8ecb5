//! Incremental UTF-8 decoding for streamed response bodies.
use anyhow::{Result, bail};

/// Decodes successive binary chunks from one response body into text
/// fragments. A multi-byte character split across two network reads is
/// held back until its remaining bytes arrive, so fragments never corrupt
/// or lose a character. Single-use: create one per request.
#[derive(Default)]
pub struct StreamDecoder {
    partial: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning the longest completely-decodable
    /// prefix as a fragment. Returns `None` when the chunk completes no
    /// new character. Fails on byte sequences that are invalid rather
    /// than merely incomplete.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Option<String>> {
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                if text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(text.to_string()))
                }
            }
            // error_len of None means the trailing bytes are the start of
            // a character whose remainder hasn't arrived yet
            Err(err) if err.error_len().is_none() => {
                self.partial = bytes.split_off(err.valid_up_to());
                if bytes.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(String::from_utf8(bytes)?))
                }
            }
            Err(err) => {
                bail!(
                    "invalid UTF-8 at byte {} of response stream",
                    err.valid_up_to()
                )
            }
        }
    }

    /// Signal end-of-stream. Any held-back bytes are flushed as one final
    /// fragment with unfinished sequences replaced.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.partial);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}
