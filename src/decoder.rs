//! Incremental UTF-8 decoding of a chunked byte stream.
//!
//! Transports deliver bytes with no regard for character boundaries. The
//! decoder keeps an incomplete trailing sequence until the bytes that finish
//! it arrive, so a chunk boundary never corrupts a character. Invalid input
//! decodes to U+FFFD instead of failing.

/// Replacement for bytes that are not valid UTF-8.
const REPLACEMENT: char = '\u{FFFD}';

/// A streaming UTF-8 decoder.
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Creates a decoder with nothing buffered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk, returning every complete character it finishes.
    ///
    /// A trailing sequence that is a valid prefix of a longer character is
    /// held back and completed by the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest = &input[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &rest[valid + len..];
                        }
                        None => {
                            self.pending = rest[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Ends the stream. An incomplete trailing sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
