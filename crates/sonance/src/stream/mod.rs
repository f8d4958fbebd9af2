//! Stream handling
//!
//! Input transports behind one [`InputStream`] interface: a non-blocking
//! HTTP/ICY client and local files. [`open`] picks the transport from the
//! URL scheme.

use std::fmt;
use std::io::SeekFrom;
use std::path::Path;

use crossbeam_channel::Receiver;

use crate::config::TransportConfig;
use crate::error::{InputError, Result};

pub mod connection;
pub mod file;
pub mod header;
pub mod http;
pub mod icy;
pub mod metadata;
pub mod ring;
pub mod types;
pub mod url;

pub use connection::{Connection, Connector, TcpConnector};
pub use file::FileInputStream;
pub use http::{ConnEvent, ConnState, HttpInputStream};
pub use metadata::StreamMetadata;
pub use types::{Progress, StreamInfo, StreamKind};
pub use url::HttpUrl;

const FILE_SCHEME: &str = "file://";

/// A readable input source as seen by decoders.
///
/// Reads never block. A read that returns 0 means "nothing yet" unless
/// [`at_end`](Self::at_end) is true.
pub trait InputStream: Send + Sync + fmt::Debug {
    fn info(&self) -> &StreamInfo;

    /// Advance the transport without reading.
    fn pump(&mut self) -> Result<Progress>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    fn at_end(&self) -> bool;

    /// Release all resources. Safe to call more than once.
    fn close(&mut self);

    /// Title change notifications, for transports that carry them
    fn subscribe(&mut self) -> Option<Receiver<StreamMetadata>> {
        None
    }
}

impl InputStream for HttpInputStream {
    fn info(&self) -> &StreamInfo {
        HttpInputStream::info(self)
    }

    fn pump(&mut self) -> Result<Progress> {
        HttpInputStream::pump(self)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        HttpInputStream::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        HttpInputStream::seek(self, pos)
    }

    fn at_end(&self) -> bool {
        HttpInputStream::at_end(self)
    }

    fn close(&mut self) {
        HttpInputStream::close(self)
    }

    fn subscribe(&mut self) -> Option<Receiver<StreamMetadata>> {
        Some(HttpInputStream::subscribe(self))
    }
}

impl InputStream for FileInputStream {
    fn info(&self) -> &StreamInfo {
        FileInputStream::info(self)
    }

    fn pump(&mut self) -> Result<Progress> {
        FileInputStream::pump(self)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        FileInputStream::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        FileInputStream::seek(self, pos)
    }

    fn at_end(&self) -> bool {
        FileInputStream::at_end(self)
    }

    fn close(&mut self) {
        FileInputStream::close(self)
    }
}

/// Open `url` with the transport its scheme calls for.
///
/// `http://` URLs get an [`HttpInputStream`]; `file://` URLs and absolute
/// paths get a [`FileInputStream`]. The configuration is validated before
/// anything is opened.
pub fn open(url: &str, config: &TransportConfig) -> Result<Box<dyn InputStream>> {
    config.validate()?;

    if url.starts_with(url::HTTP_SCHEME) {
        return Ok(Box::new(HttpInputStream::open(url, config)?));
    }

    let path = url.strip_prefix(FILE_SCHEME).unwrap_or(url);
    if Path::new(path).is_absolute() {
        return Ok(Box::new(FileInputStream::open(path, url)?));
    }

    match url.split_once("://") {
        Some((scheme, _)) if scheme != "file" => {
            Err(InputError::UnsupportedScheme(scheme.to_string()))
        }
        _ => Err(InputError::InvalidUrl(url.to_string())),
    }
}
