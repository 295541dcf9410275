/*! Body of the repeating task that pings a peer.
*/

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;

use kad_id::Id;
use kad_packet::*;

use crate::transport::Transport;

/// Sends `PingRequest` with the local id to one peer on every `tick`.
pub struct KeepAlive {
    saddr: SocketAddrV4,
    packet: Packet,
    transport: Arc<dyn Transport>,
    buf: [u8; PING_REQUEST_SIZE],
}

impl KeepAlive {
    /// Create keep-alive task body for the peer at `saddr`.
    pub fn new(local_id: Id, saddr: SocketAddrV4, transport: Arc<dyn Transport>) -> Self {
        KeepAlive {
            saddr,
            packet: Packet::PingRequest(PingRequest { id: local_id }),
            transport,
            buf: [0; PING_REQUEST_SIZE],
        }
    }

    /// Send one ping. Failures are logged and never stop the task.
    pub fn tick(&mut self) {
        let size = match self.packet.encode(&mut self.buf) {
            Ok(size) => size,
            Err(e) => {
                error!("Failed to encode keep-alive ping for {}: {}", self.saddr, e);
                return;
            }
        };

        match self.transport.send_to(&self.buf[..size], SocketAddr::V4(self.saddr)) {
            Ok(()) => trace!("Sent keep-alive ping to {}", self.saddr),
            Err(e) => error!("Failed to send keep-alive ping to {}: {}", self.saddr, e),
        }
    }
}
