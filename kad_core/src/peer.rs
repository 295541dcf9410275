/*! Known peer with its liveness state and keep-alive task.
*/

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;

use kad_id::Id;

use crate::config::Config;
use crate::keep_alive::KeepAlive;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::time::*;
use crate::transport::Transport;

/// Liveness of a peer derived from the time it was last seen.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PeerStatus {
    /// Peer was never seen.
    Unknown,
    /// Peer was seen less than `dying_timeout` ago.
    Alive,
    /// Peer was seen less than `dead_timeout` ago.
    Dying,
    /// Peer wasn't seen for `dead_timeout` or longer.
    Dead,
}

#[derive(Clone, Copy, Debug, Default)]
struct Seen {
    first: Option<Instant>,
    last: Option<Instant>,
}

/** Peer known to the routing table.

Two peers are equal when both their ids and addresses are equal. The seen
times and the keep-alive slot are behind their own locks so a shared
`Arc<Peer>` can be updated from any thread.
*/
pub struct Peer {
    id: Id,
    saddr: SocketAddrV4,
    created: Instant,
    config: Config,
    seen: Mutex<Seen>,
    keep_alive: Mutex<Option<Box<dyn TaskHandle>>>,
}

impl Peer {
    /// Create a peer that was never seen.
    pub fn new(id: Id, saddr: SocketAddrV4) -> Self {
        Peer::with_config(id, saddr, Config::default())
    }

    /// Create a peer with custom liveness timeouts and keep-alive timings.
    pub fn with_config(id: Id, saddr: SocketAddrV4, config: Config) -> Self {
        Peer {
            id,
            saddr,
            created: clock_now(),
            config,
            seen: Mutex::new(Seen::default()),
            keep_alive: Mutex::new(None),
        }
    }

    /// Id of the peer.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Address of the peer.
    pub fn saddr(&self) -> SocketAddrV4 {
        self.saddr
    }

    /// Time since the peer was created.
    pub fn age(&self) -> Duration {
        clock_elapsed(self.created)
    }

    /// Record that the peer was heard from. This is the only way back from
    /// `Dead`.
    pub fn mark_seen(&self) {
        let now = clock_now();
        let mut seen = self.seen.lock();
        seen.first.get_or_insert(now);
        seen.last = Some(now);
    }

    /// When the peer was heard from for the first time.
    pub fn first_seen(&self) -> Option<Instant> {
        self.seen.lock().first
    }

    /// When the peer was heard from for the last time.
    pub fn last_seen(&self) -> Option<Instant> {
        self.seen.lock().last
    }

    /// Time since the peer was heard from for the first time.
    pub fn first_seen_elapsed(&self) -> Option<Duration> {
        self.first_seen().map(clock_elapsed)
    }

    /// Time since the peer was heard from for the last time.
    pub fn last_seen_elapsed(&self) -> Option<Duration> {
        self.last_seen().map(clock_elapsed)
    }

    /// Current liveness of the peer.
    pub fn status(&self) -> PeerStatus {
        match self.last_seen_elapsed() {
            None => PeerStatus::Unknown,
            Some(elapsed) if elapsed < self.config.dying_timeout => PeerStatus::Alive,
            Some(elapsed) if elapsed < self.config.dead_timeout => PeerStatus::Dying,
            Some(_) => PeerStatus::Dead,
        }
    }

    /** Start pinging the peer periodically.

    The first ping goes out after `keep_alive_min_delay` plus a random part
    below `keep_alive_jitter`, then every `keep_alive_period`. Does nothing
    when a keep-alive task is already running.

    Returns `true` if a new task was scheduled.
    */
    pub fn start_keep_alive<R: Rng>(
        &self,
        scheduler: &dyn Scheduler,
        rng: &mut R,
        local_id: Id,
        transport: Arc<dyn Transport>,
    ) -> bool {
        let mut keep_alive = self.keep_alive.lock();
        if keep_alive.as_ref().map_or(false, |handle| !handle.is_cancelled()) {
            trace!("Keep-alive for {} is already running", self);
            return false;
        }

        let jitter = self.config.keep_alive_jitter.as_millis() as u64;
        let jitter = if jitter == 0 { 0 } else { rng.gen_range(0..jitter) };
        let initial_delay = self.config.keep_alive_min_delay + Duration::from_millis(jitter);

        let mut task = KeepAlive::new(local_id, self.saddr, transport);
        let handle = scheduler.schedule_repeating(
            Box::new(move || task.tick()),
            initial_delay,
            self.config.keep_alive_period,
        );
        debug!("Started keep-alive for {}, first ping in {:?}", self, initial_delay);

        *keep_alive = Some(handle);
        true
    }

    /// Stop pinging the peer. A ping that is being sent right now is not
    /// interrupted.
    ///
    /// Returns `true` if a running task was stopped.
    pub fn stop_keep_alive(&self) -> bool {
        let handle = self.keep_alive.lock().take();
        match handle {
            Some(handle) => {
                let was_running = !handle.is_cancelled();
                handle.cancel();
                debug!("Stopped keep-alive for {}", self);
                was_running
            },
            None => false,
        }
    }

    /// Whether a keep-alive task is running.
    pub fn is_keep_alive_active(&self) -> bool {
        self.keep_alive.lock().as_ref().map_or(false, |handle| !handle.is_cancelled())
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        if let Some(handle) = self.keep_alive.get_mut().take() {
            handle.cancel();
        }
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Peer) -> bool {
        self.id == other.id && self.saddr == other.saddr
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.saddr.hash(state);
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.id.short(), self.saddr)
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("saddr", &self.saddr)
            .field("status", &self.status())
            .finish()
    }
}
