//! Transport seam between [`ProfileClient`](crate::ProfileClient) and the
//! device service.
//!
//! Device discovery, pairing and service start-up happen elsewhere; a
//! [`Channel`] is handed over already connected to the service endpoint.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use mcinstall_proto::Value;

/// A blocking, bidirectional property-list message channel.
///
/// Implementations impose their own timeouts, if any.
pub trait Channel {
    /// Sends one message.
    fn send(&mut self, message: &Value) -> io::Result<()>;

    /// Blocks until one message arrives.
    fn receive(&mut self) -> io::Result<Value>;

    /// Releases transport resources ahead of drop.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, message: &Value) -> io::Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> io::Result<Value> {
        (**self).receive()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, message: &Value) -> io::Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> io::Result<Value> {
        (**self).receive()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A [`Channel`] over a byte stream using length-prefixed plist frames.
#[derive(Debug)]
pub struct FramedChannel<S> {
    /// The underlying stream.
    stream: S,
}

impl<S: Read + Write> FramedChannel<S> {
    /// Wraps a stream that is already connected to the service.
    pub const fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl FramedChannel<TcpStream> {
    /// Connects to a forwarded service port.
    pub fn connect_tcp(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[cfg(unix)]
impl FramedChannel<std::os::unix::net::UnixStream> {
    /// Connects to a service exposed on a Unix socket.
    pub fn connect_unix(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let stream = std::os::unix::net::UnixStream::connect(path)?;
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> Channel for FramedChannel<S> {
    fn send(&mut self, message: &Value) -> io::Result<()> {
        mcinstall_proto::encode(&mut self.stream, message)
    }

    fn receive(&mut self) -> io::Result<Value> {
        mcinstall_proto::decode(&mut self.stream)
    }

    fn close(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
