//! Local file input stream

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{InputError, Result};
use crate::stream::types::{Progress, StreamInfo, StreamKind};

pub struct FileInputStream {
    path: PathBuf,
    file: Option<File>,
    eof: bool,
    info: StreamInfo,
}

impl FileInputStream {
    /// Open `path` for reading. `url` is what the caller asked for and is
    /// reported back in [`StreamInfo::url`].
    pub fn open(path: impl AsRef<Path>, url: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let meta = file.metadata()?;
        if meta.is_dir() {
            return Err(InputError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }

        let mut info = StreamInfo::new(url, StreamKind::File);
        info.size = Some(meta.len());
        info.seekable = true;
        info.mime = mime_from_extension(&path).map(str::to_string);
        debug!(path = %path.display(), size = meta.len(), mime = ?info.mime, "file opened");

        Ok(Self {
            path,
            file: Some(file),
            eof: false,
            info,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Files never wait: report `Eof` after the last byte, `Pending` otherwise.
    pub fn pump(&mut self) -> Result<Progress> {
        if self.at_end() {
            Ok(Progress::Eof)
        } else {
            Ok(Progress::Pending)
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        if buf.is_empty() {
            return Ok(0);
        }
        let n = loop {
            match file.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            self.eof = true;
        }
        self.info.offset += n as u64;
        Ok(n)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let Some(file) = self.file.as_mut() else {
            return Err(InputError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "stream is closed",
            )));
        };
        let offset = file.seek(pos)?;
        self.info.offset = offset;
        self.eof = false;
        Ok(offset)
    }

    pub fn at_end(&self) -> bool {
        self.file.is_none() || self.eof
    }

    pub fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), "file closed");
        }
    }
}

impl std::fmt::Debug for FileInputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileInputStream")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .field("eof", &self.eof)
            .field("offset", &self.info.offset)
            .finish()
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "aac" | "adts" => Some("audio/aac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "wav" => Some("audio/wav"),
        "m4a" | "mp4" => Some("audio/mp4"),
        _ => None,
    }
}
