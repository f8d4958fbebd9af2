//! Blocking reader for decoders
//!
//! Decoders expect `Read + Seek` that blocks until data is there. `StreamReader`
//! puts that face on a non-blocking [`InputStream`]: it keeps pumping and
//! sleeping until bytes arrive, the stream ends, or nothing has come in for
//! the stall timeout.

use std::io::{self, Read, Seek, SeekFrom};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, ProbeResult};
use tracing::debug;

use crate::config::reader::{POLL_INTERVAL_MS, STALL_TIMEOUT_SECS};
use crate::error::{InputError, Result};
use crate::stream::{InputStream, StreamInfo, StreamMetadata};

pub struct StreamReader {
    stream: Box<dyn InputStream>,
    poll_interval: Duration,
    stall_timeout: Duration,
}

impl StreamReader {
    pub fn new(stream: Box<dyn InputStream>) -> Self {
        Self::with_timing(
            stream,
            Duration::from_millis(POLL_INTERVAL_MS),
            Duration::from_secs(STALL_TIMEOUT_SECS),
        )
    }

    pub fn with_timing(
        stream: Box<dyn InputStream>,
        poll_interval: Duration,
        stall_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            poll_interval,
            stall_timeout,
        }
    }

    pub fn info(&self) -> &StreamInfo {
        self.stream.info()
    }

    pub fn subscribe(&mut self) -> Option<Receiver<StreamMetadata>> {
        self.stream.subscribe()
    }

    pub fn into_inner(self) -> Box<dyn InputStream> {
        self.stream
    }
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let started = Instant::now();
        loop {
            let n = self.stream.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            if self.stream.at_end() {
                return Ok(0);
            }
            if started.elapsed() >= self.stall_timeout {
                let url = self.stream.info().url.clone();
                debug!(%url, "read stalled");
                return Err(InputError::Timeout(format!(
                    "no data from {url} for {:?}",
                    self.stall_timeout
                ))
                .into());
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl Seek for StreamReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.stream.seek(pos)?)
    }
}

impl MediaSource for StreamReader {
    fn is_seekable(&self) -> bool {
        self.stream.info().seekable
    }

    fn byte_len(&self) -> Option<u64> {
        self.stream.info().size
    }
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("stream", &self.stream)
            .field("poll_interval", &self.poll_interval)
            .field("stall_timeout", &self.stall_timeout)
            .finish()
    }
}

/// Detect the container format of `reader` with symphonia's default probe.
///
/// The stream's MIME type (or URL extension) is passed along as a hint.
/// Blocks until enough data has arrived to identify the format.
pub fn probe(reader: StreamReader) -> Result<ProbeResult> {
    let mut hint = Hint::new();
    if let Some(ext) = reader.info().format_hint() {
        hint.with_extension(ext);
    }
    if let Some(mime) = reader.info().mime.as_deref() {
        hint.mime_type(mime);
    }

    let mss = MediaSourceStream::new(Box::new(reader), Default::default());
    symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| InputError::Probe(e.to_string()))
}
