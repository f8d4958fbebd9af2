//! Sonance — Streaming Input Layer
//!
//! Non-blocking HTTP/ICY and local-file input streams for an audio decoder.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::io::Read;
//!
//! use sonance::config::TransportConfig;
//! use sonance::source::StreamReader;
//!
//! let stream = sonance::stream::open("http://radio.example:8000/live", &TransportConfig::default())?;
//! let mut reader = StreamReader::new(stream);
//! let mut chunk = [0u8; 4096];
//! let n = reader.read(&mut chunk)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod source;
pub mod stream;

pub use config::TransportConfig;
pub use error::{InputError, Result};
pub use stream::{open, InputStream, StreamInfo, StreamMetadata};
