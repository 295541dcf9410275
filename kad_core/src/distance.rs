/*! Orderings of peers by closeness to a target id.
*/

use std::cmp::Ordering;
use std::sync::Arc;

use itertools::Itertools;

use kad_id::{compare_distance, Id};

use crate::peer::{Peer, PeerStatus};

/// Orders peers by ascending XOR distance from their ids to `target`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DistanceOrder {
    target: Id,
}

impl DistanceOrder {
    /// Create ordering towards `target`.
    pub fn new(target: Id) -> Self {
        DistanceOrder { target }
    }

    /// Compare two peers, closer one is `Less`.
    pub fn compare(&self, a: &Peer, b: &Peer) -> Ordering {
        compare_distance(&a.id(), &b.id(), &self.target)
    }
}

/** Orders `Alive` peers before all others and then by distance.

Status depends on the clock, so `sort` reads it once per peer before
sorting.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LivenessOrder {
    distance: DistanceOrder,
}

impl LivenessOrder {
    /// Create ordering towards `target`.
    pub fn new(target: Id) -> Self {
        LivenessOrder { distance: DistanceOrder::new(target) }
    }

    /// Compare two peers, the one that should be tried first is `Less`.
    pub fn compare(&self, a: &Peer, b: &Peer) -> Ordering {
        self.compare_ranked((a.status() == PeerStatus::Alive, a), (b.status() == PeerStatus::Alive, b))
    }

    /// Sort peers so the best candidates come first.
    pub fn sort(&self, peers: Vec<Arc<Peer>>) -> Vec<Arc<Peer>> {
        peers.into_iter()
            .map(|peer| (peer.status() == PeerStatus::Alive, peer))
            .sorted_by(|(a_alive, a), (b_alive, b)| self.compare_ranked((*a_alive, &**a), (*b_alive, &**b)))
            .map(|(_, peer)| peer)
            .collect()
    }

    fn compare_ranked(&self, (a_alive, a): (bool, &Peer), (b_alive, b): (bool, &Peer)) -> Ordering {
        b_alive.cmp(&a_alive).then_with(|| self.distance.compare(a, b))
    }
}
