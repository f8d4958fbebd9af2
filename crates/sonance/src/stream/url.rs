//! `http://host[:port][/path]` parsing
//!
//! Used when a session is opened and again for every redirect target.

use std::fmt;

use crate::config::network::DEFAULT_HTTP_PORT;
use crate::error::{InputError, Result};

pub(crate) const HTTP_SCHEME: &str = "http://";

/// Location of an HTTP resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HttpUrl {
    /// Split `url` into host, port and path.
    ///
    /// A missing path becomes `/`, a missing port becomes 80. A colon that
    /// appears only after the first slash, an empty host, and a port that is
    /// not a positive integer are all rejected.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || InputError::InvalidUrl(url.to_string());

        let rest = url.strip_prefix(HTTP_SCHEME).ok_or_else(invalid)?;
        let slash = rest.find('/');
        let colon = rest.find(':');

        if let (Some(s), Some(c)) = (slash, colon) {
            if s <= c {
                return Err(invalid());
            }
        }

        let host_end = colon.or(slash).unwrap_or(rest.len());
        if host_end == 0 {
            return Err(invalid());
        }
        let host = &rest[..host_end];

        let port = match colon {
            Some(c) if slash != Some(c + 1) => {
                let digits_end = slash.unwrap_or(rest.len());
                parse_port(&rest[c + 1..digits_end]).ok_or_else(invalid)?
            }
            _ => DEFAULT_HTTP_PORT,
        };

        let path = match slash {
            Some(s) => &rest[s..],
            None => "/",
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// Value for the `Host:` request header
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_HTTP_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(digits: &str) -> Option<u16> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}
