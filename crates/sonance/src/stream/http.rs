//! HTTP/ICY input stream
//!
//! A single-threaded, non-blocking HTTP client. Every call to [`pump`]
//! advances the connection by at most one step (connect, send the request,
//! read the response header, or receive body bytes) and returns
//! [`Progress::Pending`] instead of waiting. [`read`] pumps once and then
//! serves bytes out of the session buffer, removing ICY metadata blocks on
//! the way.
//!
//! [`pump`]: HttpInputStream::pump
//! [`read`]: HttpInputStream::read

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::{InputError, Result};
use crate::stream::connection::{is_transient, Connection, Connector, TcpConnector};
use crate::stream::header::{parse_response, HeaderVerdict, ResponseHead, HEADER_TERMINATOR};
use crate::stream::icy::{IcyDemuxer, MetaBlock};
use crate::stream::metadata::StreamMetadata;
use crate::stream::ring::ByteBuffer;
use crate::stream::types::{Progress, StreamInfo, StreamKind};
use crate::stream::url::HttpUrl;

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No socket. Buffered bytes may still be drained.
    Closed,
    /// Connect issued, waiting for the socket to become writable
    Connecting,
    /// Request sent, collecting the response header
    AwaitingHeader,
    /// Receiving the body
    Open,
    /// Redirect accepted; the next pump connects to the new location
    Reopening,
}

/// Things that move a session between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnEvent {
    ConnectStarted,
    RequestSent,
    HeaderAccepted,
    Redirected,
    EndOfData,
    Failed,
    Closed,
}

impl ConnState {
    /// State after `event`. Events that do not apply leave the state unchanged.
    pub fn on(self, event: ConnEvent) -> ConnState {
        use ConnEvent as E;
        use ConnState as S;
        match (self, event) {
            (_, E::Failed) | (_, E::Closed) => S::Closed,
            (S::Closed | S::Reopening, E::ConnectStarted) => S::Connecting,
            (S::Connecting, E::RequestSent) => S::AwaitingHeader,
            (S::AwaitingHeader, E::HeaderAccepted) => S::Open,
            (S::AwaitingHeader, E::Redirected) => S::Reopening,
            (S::Open, E::EndOfData) => S::Closed,
            (state, _) => state,
        }
    }

    /// States in which the session owns a socket
    pub fn has_socket(self) -> bool {
        matches!(self, ConnState::Connecting | ConnState::AwaitingHeader | ConnState::Open)
    }
}

/// One HTTP input stream
pub struct HttpInputStream {
    url: HttpUrl,
    state: ConnState,
    conn: Option<Box<dyn Connection>>,
    connector: Arc<dyn Connector>,
    buffer: ByteBuffer,
    redirects: u32,
    max_redirects: u32,
    user_agent: String,
    prebuffer_threshold: usize,
    prebuffer: bool,
    demux: IcyDemuxer,
    info: StreamInfo,
    subscribers: Vec<Sender<StreamMetadata>>,
}

impl HttpInputStream {
    /// Start opening `url` over plain TCP.
    ///
    /// Fails for malformed URLs, unresolvable hosts, or sockets that cannot
    /// be created. The connection itself completes during later pumps.
    pub fn open(url: &str, config: &TransportConfig) -> Result<Self> {
        Self::open_with(url, config, Arc::new(TcpConnector))
    }

    /// Like [`open`](Self::open), with a caller-supplied connector
    pub fn open_with(
        url: &str,
        config: &TransportConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        config.validate()?;
        let parsed = HttpUrl::parse(url)?;
        if let Some(proxy) = &config.proxy {
            debug!(host = %proxy.host, "proxy configured; connecting directly");
        }

        let mut stream = Self {
            url: parsed,
            state: ConnState::Closed,
            conn: None,
            connector,
            buffer: ByteBuffer::with_capacity(config.buffer_capacity),
            redirects: 0,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent.clone(),
            prebuffer_threshold: config.prebuffer_threshold,
            prebuffer: false,
            demux: IcyDemuxer::new(0),
            info: StreamInfo::new(url, StreamKind::Http),
            subscribers: Vec::new(),
        };
        stream.start_connect()?;
        Ok(stream)
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Location currently being fetched (changes on redirect)
    pub fn url(&self) -> &HttpUrl {
        &self.url
    }

    pub fn redirect_count(&self) -> u32 {
        self.redirects
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Bytes waiting in the session buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// True while delivery is held back to build a margin
    pub fn is_prebuffering(&self) -> bool {
        self.prebuffer
    }

    /// Receive a [`StreamMetadata`] every time the stream title changes
    pub fn subscribe(&mut self) -> Receiver<StreamMetadata> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Advance the connection by one non-blocking step.
    ///
    /// Fatal conditions close the socket, clear the buffer, leave the session
    /// `Closed`, and are returned once; later pumps report [`Progress::Eof`].
    pub fn pump(&mut self) -> Result<Progress> {
        if self.state == ConnState::Reopening {
            if let Err(e) = self.start_connect() {
                return Err(self.fail(e));
            }
        }
        if self.state == ConnState::Connecting {
            self.finish_connect()?;
        }
        if self.state == ConnState::AwaitingHeader {
            self.read_header()?;
        }

        self.debug_check_socket();
        match self.state {
            ConnState::Open => {}
            ConnState::Closed => return Ok(Progress::Eof),
            _ => return Ok(Progress::Pending),
        }

        self.update_prebuffer();
        let progress = self.fill();
        self.update_prebuffer();
        Ok(progress)
    }

    /// Read audio bytes into `buf`. See [`read_units`](Self::read_units).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_units(buf, 1)
    }

    /// Read a whole number of `unit`-sized elements into `buf`.
    ///
    /// Returns the number of bytes copied, always a multiple of `unit`. Zero
    /// means either "nothing available yet" or end of stream; use
    /// [`at_end`](Self::at_end) to tell them apart.
    pub fn read_units(&mut self, buf: &mut [u8], unit: usize) -> Result<usize> {
        self.pump()?;
        if unit == 0 || buf.len() < unit {
            return Ok(0);
        }

        match self.state {
            ConnState::Open => {
                if self.prebuffer || self.buffer.len() < self.demux.metaint() {
                    return Ok(0);
                }
            }
            ConnState::Closed if !self.buffer.is_empty() => {}
            _ => return Ok(0),
        }

        match self.demux.take_block(&mut self.buffer) {
            Ok(MetaBlock::NotDue) => {}
            Ok(MetaBlock::Consumed { title }) => {
                if let Some(title) = title {
                    self.set_title(title);
                }
            }
            Ok(MetaBlock::Incomplete { needed }) => {
                if self.state == ConnState::Closed {
                    debug!(
                        buffered = self.buffer.len(),
                        needed, "discarding truncated metadata block"
                    );
                    self.buffer.clear();
                }
                return Ok(0);
            }
            Err(e) => return Err(self.fail(e)),
        }

        let mut n = self.demux.deliverable(self.buffer.len()).min(buf.len());
        n -= n % unit;
        let n = self.buffer.take_into(&mut buf[..n]);
        self.demux.advance(n);
        debug_assert!(self.demux.offset() <= self.demux.metaint());
        self.info.offset += n as u64;
        Ok(n)
    }

    /// Seeking is not implemented for HTTP streams.
    pub fn seek(&mut self, _pos: std::io::SeekFrom) -> Result<u64> {
        Err(InputError::SeekUnsupported)
    }

    /// True once the connection is closed and every buffered byte was read
    pub fn at_end(&self) -> bool {
        self.state == ConnState::Closed && self.buffer.is_empty()
    }

    /// Release the socket and buffer. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!(url = %self.url, state = ?self.state, "closing stream");
        }
        self.buffer.clear();
        self.state = self.state.on(ConnEvent::Closed);
        self.debug_check_socket();
    }

    /// A socket is held exactly in the states that need one
    fn debug_check_socket(&self) {
        debug_assert_eq!(
            self.conn.is_some(),
            self.state.has_socket(),
            "socket ownership out of step with {:?}",
            self.state
        );
    }

    fn start_connect(&mut self) -> Result<()> {
        let conn = self.connector.connect(&self.url.host, self.url.port)?;
        self.conn = Some(conn);
        self.buffer.clear();
        self.state = self.state.on(ConnEvent::ConnectStarted);
        debug!(url = %self.url, "connect started");
        Ok(())
    }

    /// Connecting → AwaitingHeader once the socket is writable
    fn finish_connect(&mut self) -> Result<()> {
        let request = self.request();
        let Some(conn) = self.conn.as_mut() else {
            return Err(self.fail(InputError::Protocol("connecting without a socket".into())));
        };
        match conn.poll_connected() {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) if is_transient(&e) => return Ok(()),
            Err(source) => {
                let err = InputError::Connect {
                    host: self.url.host.clone(),
                    port: self.url.port,
                    source,
                };
                return Err(self.fail(err));
            }
        }

        match conn.send(request.as_bytes()) {
            Ok(n) if n == request.len() => {
                self.state = self.state.on(ConnEvent::RequestSent);
                debug!(url = %self.url, offset = self.info.offset, "request sent");
                Ok(())
            }
            Ok(n) => Err(self.fail(InputError::Protocol(format!(
                "short request write ({n} of {} bytes)",
                request.len()
            )))),
            Err(e) if is_transient(&e) => Ok(()),
            Err(e) => Err(self.fail(InputError::Io(e))),
        }
    }

    fn request(&self) -> String {
        format!(
            "GET {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Connection: close\r\n\
             User-Agent: {}\r\n\
             Range: bytes={}-\r\n\
             Icy-Metadata: 1\r\n\
             \r\n",
            self.url.path,
            self.url.host_header(),
            self.user_agent,
            self.info.offset
        )
    }

    /// Collect the response header and act on it
    fn read_header(&mut self) -> Result<()> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(self.fail(InputError::Protocol("awaiting header without a socket".into())));
        };
        let received = match self.buffer.fill_with(|free| conn.recv(free)) {
            None => {
                return Err(self.fail(InputError::Protocol(
                    "response header exceeds buffer capacity".into(),
                )))
            }
            Some(Ok(0)) => {
                return Err(self.fail(InputError::Protocol(
                    "connection closed before response header".into(),
                )))
            }
            Some(Ok(n)) => n,
            Some(Err(e)) if is_transient(&e) => return Ok(()),
            Some(Err(e)) => return Err(self.fail(InputError::Io(e))),
        };

        let Some(pos) = self.buffer.find(HEADER_TERMINATOR) else {
            debug!(received, buffered = self.buffer.len(), "partial response header");
            return Ok(());
        };
        let header_len = pos + HEADER_TERMINATOR.len();

        match parse_response(&self.buffer.as_slice()[..header_len]) {
            Ok(HeaderVerdict::Accept(head)) => {
                self.buffer.consume(header_len);
                self.accept(head)
            }
            Ok(HeaderVerdict::Redirect(target)) => self.redirect(target),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn accept(&mut self, head: ResponseHead) -> Result<()> {
        // Audio is only released once a full interval is buffered
        if head.icy_metaint > self.buffer.capacity() {
            return Err(self.fail(InputError::Protocol(format!(
                "icy-metaint {} exceeds buffer capacity {}",
                head.icy_metaint,
                self.buffer.capacity()
            ))));
        }
        if self.info.size.is_none() {
            self.info.size = head.content_length;
        }
        if head.mime.is_some() {
            self.info.mime = head.mime;
        }
        if head.name.is_some() {
            self.info.meta_name = head.name;
        }
        self.info.seekable = false;
        self.demux = IcyDemuxer::new(head.icy_metaint);
        self.prebuffer = true;
        self.state = self.state.on(ConnEvent::HeaderAccepted);
        debug!(
            url = %self.url,
            status = head.status,
            size = ?self.info.size,
            mime = ?self.info.mime,
            name = ?self.info.meta_name,
            icy_metaint = head.icy_metaint,
            seekable_hint = head.seekable_hint,
            "response accepted"
        );
        Ok(())
    }

    fn redirect(&mut self, target: HttpUrl) -> Result<()> {
        if self.redirects >= self.max_redirects {
            return Err(self.fail(InputError::TooManyRedirects(self.max_redirects)));
        }
        self.redirects += 1;
        debug!(from = %self.url, to = %target, count = self.redirects, "following redirect");
        self.conn = None;
        self.buffer.clear();
        self.url = target;
        self.state = self.state.on(ConnEvent::Redirected);
        Ok(())
    }

    /// Receive body bytes into the buffer's free space
    fn fill(&mut self) -> Progress {
        let Some(conn) = self.conn.as_mut() else {
            return Progress::Eof;
        };
        match self.buffer.fill_with(|free| conn.recv(free)) {
            // Full: wait for the reader to drain
            None => Progress::Pending,
            Some(Ok(0)) => {
                debug!(url = %self.url, buffered = self.buffer.len(), "end of data");
                self.end_of_data();
                Progress::Eof
            }
            Some(Ok(n)) => Progress::Received(n),
            Some(Err(e)) if is_transient(&e) => Progress::Pending,
            Some(Err(e)) => {
                warn!(url = %self.url, error = %e, "receive failed; draining buffered data");
                self.end_of_data();
                Progress::Eof
            }
        }
    }

    fn end_of_data(&mut self) {
        self.conn = None;
        self.state = self.state.on(ConnEvent::EndOfData);
    }

    fn update_prebuffer(&mut self) {
        let buffered = self.buffer.len();
        if buffered == 0 || buffered < self.demux.metaint() {
            self.prebuffer = true;
        } else if buffered > self.prebuffer_threshold {
            self.prebuffer = false;
        }
    }

    fn set_title(&mut self, title: String) {
        if self.info.meta_title.as_deref() == Some(title.as_str()) {
            return;
        }
        debug!(title = %title, "stream title");
        if !self.subscribers.is_empty() {
            let metadata = StreamMetadata::from_icy_title(&title);
            self.subscribers.retain(|tx| tx.send(metadata.clone()).is_ok());
        }
        self.info.meta_title = Some(title);
    }

    /// Abandon the current attempt after a fatal error
    fn fail(&mut self, err: InputError) -> InputError {
        warn!(url = %self.url, state = ?self.state, error = %err, "stream failed");
        self.conn = None;
        self.buffer.clear();
        self.state = self.state.on(ConnEvent::Failed);
        err
    }
}

impl std::fmt::Debug for HttpInputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInputStream")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("buffer", &self.buffer)
            .field("redirects", &self.redirects)
            .field("icy_metaint", &self.demux.metaint())
            .field("prebuffer", &self.prebuffer)
            .finish()
    }
}
