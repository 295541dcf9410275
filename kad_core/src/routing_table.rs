/*!
Bucketed storage of known peers.

The table has one bucket per possible length of the prefix an id shares with
the local id. Every bucket has its own lock, so updates of peers in different
buckets never contend.

[Kademlia whitepaper](https://pdos.csail.mit.edu/~petar/papers/maymounkov-kademlia-lncs.pdf).
*/

use std::net::SocketAddrV4;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use kad_id::{Id, ID_BITS};

use crate::config::Config;
use crate::distance::LivenessOrder;
use crate::peer::{Peer, PeerStatus};

/// Number of buckets in a `RoutingTable`.
pub const BUCKETS_COUNT: usize = ID_BITS as usize;

/// Error returned by `upsert` when the bucket of a new peer is full of alive
/// peers and nothing can be evicted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("Bucket {} is full of alive peers", index)]
pub struct BucketFull {
    /// Index of the full bucket.
    pub index: usize,
}

/// Peers that share the same prefix length with the local id, in insertion
/// order.
#[derive(Debug)]
struct Bucket {
    capacity: usize,
    peers: Vec<Arc<Peer>>,
}

impl Bucket {
    fn new(capacity: usize) -> Self {
        Bucket {
            capacity,
            peers: Vec::with_capacity(capacity),
        }
    }

    fn find(&self, id: &Id, saddr: SocketAddrV4) -> Option<usize> {
        self.peers.iter().position(|peer| peer.id() == *id && peer.saddr() == saddr)
    }

    fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    /// Least recently seen peer that isn't alive. Never seen peers go first.
    fn eviction_index(&self) -> Option<usize> {
        self.peers.iter()
            .enumerate()
            .filter(|(_, peer)| peer.status() != PeerStatus::Alive)
            .min_by_key(|(_, peer)| peer.last_seen())
            .map(|(index, _)| index)
    }

    fn try_add(&mut self, peer: Arc<Peer>) -> bool {
        if self.is_full() {
            match self.eviction_index() {
                Some(index) => {
                    let evicted = self.peers.remove(index);
                    evicted.stop_keep_alive();
                    debug!(target: "Bucket", "Evicted {} ({:?}) in favour of {}", evicted, evicted.status(), peer);
                },
                None => {
                    debug!(target: "Bucket", "No free space left for {}", peer);
                    return false;
                },
            }
        }

        debug!(target: "Bucket", "Inserted {}", peer);
        self.peers.push(peer);
        true
    }

    fn remove(&mut self, id: &Id, saddr: SocketAddrV4) -> Option<Arc<Peer>> {
        self.find(id, saddr).map(|index| self.peers.remove(index))
    }
}

/** Storage of known peers bucketed by the length of the prefix their ids
share with the local id.

A peer with the local id is never stored. Peers are identified by id and
address together, so the same id at a different address is a different
peer.
*/
#[derive(Debug)]
pub struct RoutingTable {
    local_id: Id,
    config: Config,
    buckets: Vec<Mutex<Bucket>>,
}

impl RoutingTable {
    /// Create an empty table with default settings.
    pub fn new(local_id: Id) -> Self {
        RoutingTable::with_config(local_id, Config::default())
    }

    /// Create an empty table. Peers it creates share `config`.
    pub fn with_config(local_id: Id, config: Config) -> Self {
        trace!("Creating a new RoutingTable with capacity {} per bucket", config.bucket_capacity);
        let buckets = (0..BUCKETS_COUNT)
            .map(|_| Mutex::new(Bucket::new(config.bucket_capacity)))
            .collect();
        RoutingTable {
            local_id,
            config,
            buckets,
        }
    }

    /// Id of the node that owns the table.
    pub fn local_id(&self) -> Id {
        self.local_id
    }

    /// Number of peers a bucket can hold.
    pub fn capacity(&self) -> usize {
        self.config.bucket_capacity
    }

    /// Index of the bucket for `id`, `None` for the local id.
    pub fn bucket_index(&self, id: &Id) -> Option<usize> {
        let index = self.local_id.shared_prefix_bits(id) as usize;
        if index < BUCKETS_COUNT {
            Some(index)
        } else {
            None
        }
    }

    /// Peers currently stored in the bucket `id` belongs to.
    pub fn bucket(&self, id: &Id) -> Vec<Arc<Peer>> {
        self.bucket_index(id)
            .map(|index| self.buckets[index].lock().peers.clone())
            .unwrap_or_default()
    }

    /** Get the peer with given id and address, adding it when it's not known
    yet.

    - The local id is never stored, a fresh peer that isn't in the table is
      returned for it.
    - A known peer is returned as is, so every caller shares the same
      `Arc<Peer>`.
    - When the bucket is full, the least recently seen peer that isn't
      `Alive` is evicted and its keep-alive stopped.

    Returns `BucketFull` when the bucket is full of `Alive` peers.
    */
    pub fn upsert(&self, id: Id, saddr: SocketAddrV4) -> Result<Arc<Peer>, BucketFull> {
        let index = match self.bucket_index(&id) {
            Some(index) => index,
            None => {
                trace!("Not storing local id {}", id.short());
                return Ok(Arc::new(self.new_peer(id, saddr)));
            },
        };

        let mut bucket = self.buckets[index].lock();
        if let Some(position) = bucket.find(&id, saddr) {
            return Ok(bucket.peers[position].clone());
        }

        let peer = Arc::new(self.new_peer(id, saddr));
        if bucket.try_add(peer.clone()) {
            Ok(peer)
        } else {
            Err(BucketFull { index })
        }
    }

    /// Remove a peer and stop pinging it.
    pub fn remove(&self, id: &Id, saddr: SocketAddrV4) -> Option<Arc<Peer>> {
        let index = self.bucket_index(id)?;
        let removed = self.buckets[index].lock().remove(id, saddr);
        if let Some(ref peer) = removed {
            peer.stop_keep_alive();
            debug!("Removed {}", peer);
        }
        removed
    }

    /** Candidates for reaching `target`: all known peers, `Alive` ones first,
    each group ordered by ascending distance to `target`.

    Peers are copied out of the buckets before sorting, so no lock is held
    while statuses are evaluated.
    */
    pub fn routing_peers(&self, target: &Id) -> Vec<Arc<Peer>> {
        LivenessOrder::new(*target).sort(self.all_peers())
    }

    /// Snapshot of all stored peers.
    pub fn all_peers(&self) -> Vec<Arc<Peer>> {
        self.buckets.iter()
            .flat_map(|bucket| bucket.lock().peers.clone())
            .collect()
    }

    /// Number of stored peers.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.lock().peers.len()).sum()
    }

    /// Whether no peers are stored.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.lock().peers.is_empty())
    }

    fn new_peer(&self, id: Id, saddr: SocketAddrV4) -> Peer {
        Peer::with_config(id, saddr, self.config.clone())
    }
}
