/*! Reusable datagram buffer paired with the address of the remote peer.
*/

use std::io::Error as IoError;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use kad_packet::*;

use crate::transport::{SendError, Transport};

/// Capacity of a `Message` buffer, enough for any UDP datagram.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/** Buffer for one datagram together with the address it came from or goes
to.

A single `Message` can be reused for many sends and receives, it keeps its
buffer between them.
*/
pub struct Message {
    buf: Box<[u8]>,
    len: usize,
    addr: Option<SocketAddr>,
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Message::with_capacity(MAX_MESSAGE_SIZE)
    }

    /// Create an empty message with a buffer of `capacity` bytes. Datagrams
    /// that don't fit are truncated on receive and fail to format.
    pub fn with_capacity(capacity: usize) -> Self {
        Message {
            buf: vec![0; capacity].into_boxed_slice(),
            len: 0,
            addr: None,
        }
    }

    /// Serialize `packet` into the buffer and address it to `addr`. On
    /// failure the message is left empty and without destination.
    pub fn format(&mut self, packet: &Packet, addr: SocketAddr) -> Result<(), EncodeError> {
        self.prepare_receive();
        self.len = packet.encode(&mut self.buf)?;
        self.addr = Some(addr);
        Ok(())
    }

    /// Decode the packet held in the buffer.
    pub fn parse(&self) -> Result<Packet, DecodeError> {
        Packet::decode(self.as_bytes())
    }

    /// Bytes of the datagram.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Address of the remote peer.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    fn header(&self) -> Option<Header> {
        self.as_bytes().first().map(|&byte| Header::from_byte(byte))
    }

    /// Protocol version from the header, `None` for an empty message.
    pub fn version(&self) -> Option<u8> {
        self.header().map(Header::version)
    }

    /// Payload type from the header.
    pub fn payload_type(&self) -> Result<PayloadType, DecodeError> {
        match self.header() {
            Some(header) => header.payload_type(),
            None => Err(DecodeError::Truncated { expected: 1, actual: 0 }),
        }
    }

    /// Whether the header has the response flag set.
    pub fn is_response(&self) -> bool {
        self.header().map_or(false, Header::is_response)
    }

    /// Forget the previous datagram before receiving into the buffer.
    pub fn prepare_receive(&mut self) {
        self.len = 0;
        self.addr = None;
    }

    /// Receive a single datagram from `socket`.
    pub async fn recv_from(&mut self, socket: &UdpSocket) -> Result<usize, IoError> {
        self.prepare_receive();
        let (len, addr) = socket.recv_from(&mut self.buf).await?;
        trace!("Received {} bytes from {}", len, addr);
        self.len = len;
        self.addr = Some(addr);
        Ok(len)
    }

    /// Send the datagram to its address.
    pub fn send_to(&self, transport: &dyn Transport) -> Result<(), SendError> {
        let addr = self.addr.ok_or(SendError::NoDestination)?;
        transport.send_to(self.as_bytes(), addr)
    }
}
