//! ICY title text
//!
//! Decoding of the `StreamTitle` entry carried in metadata blocks, and the
//! artist/title form handed to subscribers.

const STREAM_TITLE: &str = "StreamTitle=";

/// A stream title, split into artist and title where possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    /// The title exactly as the server sent it
    pub raw: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl StreamMetadata {
    /// `"Artist - Title"` splits at the first `" - "`; anything else is all title.
    pub fn from_icy_title(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (artist, title) = match trimmed.find(" - ") {
            Some(pos) => (trimmed[..pos].trim(), trimmed[pos + 3..].trim()),
            None => ("", trimmed),
        };
        Self {
            raw: raw.to_string(),
            title: non_empty(title),
            artist: non_empty(artist),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Extract the `StreamTitle` value from a raw ICY metadata block.
///
/// The block is `;`-separated `key=value` text, NUL-padded to a multiple of
/// 16 bytes. Text after the first NUL is ignored. Every `StreamTitle=` entry
/// replaces the previous one; a single quote at either end of the value is
/// stripped. Returns `None` if the block names no title.
pub fn extract_stream_title(raw_block: &[u8]) -> Option<String> {
    let end = raw_block
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(raw_block.len());
    let text = String::from_utf8_lossy(&raw_block[..end]);

    let mut title = None;
    for token in text.split(';').filter(|t| !t.is_empty()) {
        if let Some(value) = token.strip_prefix(STREAM_TITLE) {
            let value = value.strip_prefix('\'').unwrap_or(value);
            let value = value.strip_suffix('\'').unwrap_or(value);
            title = Some(value.to_string());
        }
    }
    title
}
