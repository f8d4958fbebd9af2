//! Non-blocking byte connections
//!
//! The HTTP session drives a [`Connection`] through short, non-blocking calls.
//! Readiness is probed without waiting: `poll_connected` asks the socket for a
//! pending error and for its peer address, and `recv`/`send` report
//! `WouldBlock` instead of stalling the calling thread.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use crate::error::{InputError, Result};

/// One transport connection owned by a session
pub trait Connection: Send + Sync {
    /// `Ok(true)` once the connection is established, `Ok(false)` while it is
    /// still in progress, `Err` if it failed.
    fn poll_connected(&mut self) -> io::Result<bool>;

    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// `Ok(0)` means the peer closed the connection.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens connections for sessions
pub trait Connector: Send + Sync {
    /// Resolve `host` and start a non-blocking connect.
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>>;
}

/// Transient conditions that mean "try again later"
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Plain TCP connector
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>> {
        let addr = (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| InputError::Resolve(host.to_string()))?;

        let connect_err = |source| InputError::Connect {
            host: host.to_string(),
            port,
            source,
        };

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(connect_err)?;
        socket.set_nonblocking(true).map_err(connect_err)?;

        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(e) if connect_in_progress(&e) => {}
            Err(e) => return Err(connect_err(e)),
        }
        debug!(%addr, host, "connecting");

        Ok(Box::new(TcpConnection { socket, addr }))
    }
}

fn connect_in_progress(err: &io::Error) -> bool {
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::EINPROGRESS) {
        return true;
    }
    err.kind() == io::ErrorKind::WouldBlock
}

struct TcpConnection {
    socket: Socket,
    addr: SocketAddr,
}

impl Connection for TcpConnection {
    fn poll_connected(&mut self) -> io::Result<bool> {
        if let Some(err) = self.socket.take_error()? {
            return Err(err);
        }
        match self.socket.peer_addr() {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.write(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.read(buf)
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        debug!(addr = %self.addr, "closing connection");
    }
}
