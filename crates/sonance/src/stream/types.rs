//! Stream types
//!
//! Core types shared by all input transports.

/// Which transport serves a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Http,
    File,
}

/// Stream-level metadata exposed to decoders
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub url: String,
    pub kind: StreamKind,
    /// Total length in bytes, when the source announces it
    pub size: Option<u64>,
    /// Advisory only: whether `seek` can be expected to succeed
    pub seekable: bool,
    /// Bytes delivered to the caller so far
    pub offset: u64,
    pub mime: Option<String>,
    /// Station or stream name (`icy-name` / `x-audiocast-name`)
    pub meta_name: Option<String>,
    /// Current title; replaced as ICY metadata blocks arrive
    pub meta_title: Option<String>,
}

impl StreamInfo {
    pub fn new(url: impl Into<String>, kind: StreamKind) -> Self {
        Self {
            url: url.into(),
            kind,
            size: None,
            seekable: false,
            offset: 0,
            mime: None,
            meta_name: None,
            meta_title: None,
        }
    }

    /// Probe hint (file extension) from the MIME type, falling back to the URL
    pub fn format_hint(&self) -> Option<&'static str> {
        if let Some(hint) = self.mime.as_deref().and_then(hint_from_mime) {
            return Some(hint);
        }

        let lower = self.url.to_lowercase();
        let path = lower.split('?').next().unwrap_or(&lower);
        let (_, ext) = path.rsplit_once('.')?;
        match ext {
            "mp3" => Some("mp3"),
            "aac" | "adts" => Some("aac"),
            "ogg" | "oga" => Some("ogg"),
            "flac" => Some("flac"),
            "wav" => Some("wav"),
            "m4a" | "mp4" => Some("mp4"),
            _ => None,
        }
    }
}

fn hint_from_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.to_lowercase();
    if mime.contains("audio/mpeg") || mime.contains("audio/mp3") {
        Some("mp3")
    } else if mime.contains("audio/aac") || mime.contains("audio/aacp") {
        Some("aac")
    } else if mime.contains("audio/ogg") || mime.contains("application/ogg") {
        Some("ogg")
    } else if mime.contains("audio/flac") {
        Some("flac")
    } else if mime.contains("audio/wav") || mime.contains("audio/x-wav") {
        Some("wav")
    } else if mime.contains("audio/mp4") {
        Some("mp4")
    } else {
        None
    }
}

/// Outcome of one pump call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing new yet; call again later
    Pending,
    /// This many bytes were added to the stream buffer
    Received(usize),
    /// The source has no more data to fetch
    Eof,
}
