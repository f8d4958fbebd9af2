//! HTTP/ICY response header parsing
//!
//! Understands the status lines sent by HTTP/1.x and Shoutcast servers and a
//! fixed set of header fields. Field names are matched case-sensitively, as
//! they are sent by the servers this transport talks to.

use crate::error::{InputError, Result};
use crate::stream::url::HttpUrl;

/// End of the header block
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

const CONTENT_LENGTH: &str = "Content-Length:";
const CONTENT_TYPE: &str = "Content-Type:";
const ICY_METAINT: &str = "icy-metaint:";
const ICY_NAME: &str = "icy-name:";
const AUDIOCAST_NAME: &str = "x-audiocast-name:";
const LOCATION: &str = "Location:";

/// Fields extracted from an accepted response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// Seekability implied by the status line and `Content-Length`.
    /// Advisory only; sessions always report themselves as not seekable.
    pub seekable_hint: bool,
    pub content_length: Option<u64>,
    /// Audio bytes between ICY metadata blocks (0 = no in-band metadata)
    pub icy_metaint: usize,
    pub name: Option<String>,
    pub mime: Option<String>,
}

/// What the session should do with a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderVerdict {
    /// 200/206: the body follows the header block
    Accept(ResponseHead),
    /// 301/302 with a parseable `Location`
    Redirect(HttpUrl),
}

/// Interpret a complete header block (terminator included or not).
pub fn parse_response(block: &[u8]) -> Result<HeaderVerdict> {
    let text = String::from_utf8_lossy(block);
    let mut lines = text.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let (status, seekable_hint) = parse_status_line(status_line)?;
    let fields = lines.take_while(|line| !line.is_empty());

    match status {
        200 | 206 => {
            let mut head = ResponseHead {
                status,
                seekable_hint,
                ..Default::default()
            };
            for line in fields {
                apply_field(&mut head, line);
            }
            if head.content_length.map_or(true, |len| len == 0) {
                head.seekable_hint = false;
            }
            Ok(HeaderVerdict::Accept(head))
        }
        301 | 302 => {
            let location = fields
                .filter_map(|line| field_value(line, LOCATION))
                .next()
                .ok_or(InputError::BadRedirect)?;
            let target = HttpUrl::parse(location).map_err(|_| InputError::BadRedirect)?;
            Ok(HeaderVerdict::Redirect(target))
        }
        code => Err(InputError::HttpStatus(code)),
    }
}

/// Status code and seekability implied by the status line
fn parse_status_line(line: &str) -> Result<(u16, bool)> {
    let (code, seekable) = if let Some(rest) = line.strip_prefix("HTTP/1.0 ") {
        (leading_number(rest), false)
    } else if let Some(rest) = line.strip_prefix("HTTP/1.1 ") {
        (leading_number(rest), true)
    } else if line.starts_with("ICY 200 OK") {
        (Some(200), false)
    } else if line.starts_with("ICY 400 Server Full") {
        (Some(400), false)
    } else if line.starts_with("ICY 404") {
        (Some(404), false)
    } else {
        return Err(InputError::Protocol(format!(
            "unrecognized status line: {line:?}"
        )));
    };

    let code = code
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| InputError::Protocol(format!("malformed status line: {line:?}")))?;
    Ok((code, seekable))
}

fn apply_field(head: &mut ResponseHead, line: &str) {
    if let Some(value) = field_value(line, CONTENT_LENGTH) {
        if head.content_length.is_none() {
            head.content_length = leading_number(value);
        }
    } else if let Some(value) = field_value(line, ICY_METAINT) {
        head.icy_metaint = leading_number(value)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
    } else if let Some(value) =
        field_value(line, ICY_NAME).or_else(|| field_value(line, AUDIOCAST_NAME))
    {
        head.name = Some(value.to_string());
    } else if let Some(value) = field_value(line, CONTENT_TYPE) {
        head.mime = Some(value.to_string());
    }
}

/// Value of `line` if it starts with `name`, leading spaces removed
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)
        .map(|value| value.trim_start_matches(' '))
}

/// Decimal number at the start of `s`, after optional spaces
fn leading_number(s: &str) -> Option<u64> {
    let s = s.trim_start_matches(' ');
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    s[..end].parse().ok()
}
