/*! Outgoing datagram sink used by keep-alive probing.
*/

use std::io::Error as IoError;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::channel::mpsc::UnboundedSender;
use thiserror::Error;

/// Error that can happen when handing a datagram to a `Transport`.
#[derive(Debug, Error)]
pub enum SendError {
    /// Socket failed to send the datagram.
    #[error("IO error: {0}")]
    Io(IoError),
    /// The receiving side of the transport is gone.
    #[error("Transport is closed")]
    Closed,
    /// Message has no destination address.
    #[error("Message has no destination address")]
    NoDestination,
}

impl From<IoError> for SendError {
    fn from(error: IoError) -> SendError {
        SendError::Io(error)
    }
}

/// Something that can send a datagram to a socket address without blocking
/// for long.
pub trait Transport: Send + Sync {
    /// Send `buf` as a single datagram to `addr`.
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), SendError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), SendError> {
        (**self).send_to(buf, addr)
    }
}

impl Transport for std::net::UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), SendError> {
        std::net::UdpSocket::send_to(self, buf, addr)?;
        Ok(())
    }
}

/// Never waits for the socket to become writable: a full send buffer is
/// reported as `WouldBlock`.
impl Transport for tokio::net::UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), SendError> {
        self.try_send_to(buf, addr)?;
        Ok(())
    }
}

/// Hands datagrams to whatever owns the receiving half, usually a task that
/// writes them into a `UdpFramed` sink.
impl Transport for UnboundedSender<(Vec<u8>, SocketAddr)> {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), SendError> {
        self.unbounded_send((buf.to_vec(), addr))
            .map_err(|_| SendError::Closed)
    }
}
