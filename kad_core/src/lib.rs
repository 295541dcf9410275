/*!
Core of a kademlia node: the routing table that stores and ranks known
peers, peer liveness tracking and periodic keep-alive probing.

The wire format lives in `kad_packet`, identifiers and the XOR metric in
`kad_id`.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

pub mod time;
pub mod config;
pub mod scheduler;
pub mod transport;
pub mod peer;
pub mod keep_alive;
pub mod distance;
pub mod routing_table;
pub mod message;
pub mod codec;
