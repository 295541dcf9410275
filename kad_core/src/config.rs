/*! Tunables of the routing table and keep-alive probing.
*/

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default number of peers a bucket can hold.
pub const KBUCKET_DEFAULT_SIZE: usize = 8;
/// Period between two keep-alive pings sent to the same peer.
pub const KEEP_ALIVE_PERIOD: Duration = Duration::from_millis(1500);
/// Minimal delay before the first keep-alive ping.
pub const KEEP_ALIVE_MIN_DELAY: Duration = Duration::from_millis(100);
/// Random delay up to this value is added to `KEEP_ALIVE_MIN_DELAY` so that
/// pings to different peers don't go out in bursts.
pub const KEEP_ALIVE_JITTER: Duration = Duration::from_millis(600);
/// Peer that wasn't seen for this long is no longer alive.
pub const DYING_TIMEOUT: Duration = Duration::from_secs(15);
/// Peer that wasn't seen for this long is considered dead.
pub const DEAD_TIMEOUT: Duration = Duration::from_secs(60);

/** Routing table and peer liveness settings.

Every field falls back to its default when missing, durations are given in
milliseconds:

```yaml
bucket-capacity: 16
keep-alive-period: 3000
```
*/
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Number of peers a bucket can hold.
    pub bucket_capacity: usize,
    /// Period between keep-alive pings.
    #[serde(deserialize_with = "de_millis")]
    pub keep_alive_period: Duration,
    /// Minimal delay before the first keep-alive ping.
    #[serde(deserialize_with = "de_millis")]
    pub keep_alive_min_delay: Duration,
    /// Upper bound (exclusive) of the random part of the first delay.
    #[serde(deserialize_with = "de_millis")]
    pub keep_alive_jitter: Duration,
    /// Time since last seen after which a peer becomes `Dying`.
    #[serde(deserialize_with = "de_millis")]
    pub dying_timeout: Duration,
    /// Time since last seen after which a peer becomes `Dead`.
    #[serde(deserialize_with = "de_millis")]
    pub dead_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bucket_capacity: KBUCKET_DEFAULT_SIZE,
            keep_alive_period: KEEP_ALIVE_PERIOD,
            keep_alive_min_delay: KEEP_ALIVE_MIN_DELAY,
            keep_alive_jitter: KEEP_ALIVE_JITTER,
            dying_timeout: DYING_TIMEOUT,
            dead_timeout: DEAD_TIMEOUT,
        }
    }
}

fn de_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error> where D: Deserializer<'de> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
