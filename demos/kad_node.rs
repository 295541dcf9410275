// an example of kademlia node that answers PING and FINDPEERS and keeps the
// peers it learns about alive
//
// cargo run --example kad_node -- 127.0.0.1:33445 [bootstrap address]

#[macro_use]
extern crate log;

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;

use anyhow::Error;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::UdpSocket;
use tokio_util::udp::UdpFramed;

use kad_core::codec::{DecodeError, KadCodec};
use kad_core::routing_table::RoutingTable;
use kad_core::scheduler::{Scheduler, TokioScheduler};
use kad_core::transport::Transport;
use kad_id::{Id, ID_SIZE};
use kad_packet::*;

struct Node {
    table: RoutingTable,
    scheduler: TokioScheduler,
    transport: Arc<dyn Transport>,
}

impl Node {
    /// Remember the peer and start pinging it.
    fn track(&self, id: Id, saddr: SocketAddrV4, seen: bool) {
        match self.table.upsert(id, saddr) {
            Ok(peer) => {
                if seen {
                    peer.mark_seen();
                }
                let scheduler: &dyn Scheduler = &self.scheduler;
                peer.start_keep_alive(scheduler, &mut rand::thread_rng(), self.table.local_id(), self.transport.clone());
            },
            Err(e) => debug!("Not tracking {}: {}", saddr, e),
        }
    }

    fn handle_packet(&self, packet: Packet, saddr: SocketAddrV4) -> Option<Packet> {
        match packet {
            Packet::PingRequest(request) => {
                self.track(request.id, saddr, true);
                Some(Packet::PingResponse(PingResponse { id: self.table.local_id(), saddr }))
            },
            Packet::PingResponse(response) => {
                self.track(response.id, saddr, true);
                None
            },
            Packet::FindPeersRequest(request) => {
                let peers: Vec<PeerInfo> = self.table.routing_peers(&request.target)
                    .iter()
                    .map(|peer| PeerInfo::new(peer.id(), peer.saddr()))
                    .collect();
                Some(Packet::FindPeersResponse(FindPeersResponse::new(peers)))
            },
            Packet::FindPeersResponse(response) => {
                for peer in response.peers {
                    self.track(peer.id, peer.saddr, false);
                }
                None
            },
            Packet::ConnectRequest(_) | Packet::ConnectResponse(_) => {
                debug!("Ignoring CONNECT from {}", saddr);
                None
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let local_addr: SocketAddr = args.next().as_deref().unwrap_or("127.0.0.1:33445").parse()?;
    let bootstrap_addr: Option<SocketAddr> = args.next().map(|addr| addr.parse()).transpose()?;

    let local_id = Id::from(rand::thread_rng().gen::<[u8; ID_SIZE]>());
    let socket = Arc::new(UdpSocket::bind(local_addr).await?);
    let node = Node {
        table: RoutingTable::new(local_id),
        scheduler: TokioScheduler::try_current()?,
        transport: socket.clone(),
    };

    let (mut sink, mut stream) = UdpFramed::new(socket, KadCodec).split();

    if let Some(addr) = bootstrap_addr {
        sink.send((Packet::PingRequest(PingRequest { id: local_id }), addr)).await?;
        sink.send((Packet::FindPeersRequest(FindPeersRequest { target: local_id }), addr)).await?;
    }

    info!("Running kademlia node {} on {}", local_id, local_addr);

    while let Some(event) = stream.next().await {
        let (packet, addr) = match event {
            Ok(event) => event,
            Err(DecodeError::Io(e)) => return Err(e.into()),
            Err(e) => {
                // ignore packet decode errors
                warn!("Packet receive error: {}", e);
                continue;
            },
        };
        let saddr = match addr {
            SocketAddr::V4(saddr) => saddr,
            SocketAddr::V6(_) => continue,
        };

        trace!("Received packet {:?} from {}", packet, addr);
        if let Some(response) = node.handle_packet(packet, saddr) {
            sink.send((response, addr)).await?;
        }
    }

    Ok(())
}
