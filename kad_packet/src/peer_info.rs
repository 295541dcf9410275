/*! PeerInfo struct
*/

use std::net::SocketAddrV4;

use kad_binary_io::*;
use kad_id::*;

/// Size in bytes of serialized `PeerInfo`.
pub const PEER_INFO_SIZE: usize = ID_SIZE + SOCKET_ADDR_SIZE;

/** Peer id together with the address it can be reached at. This is how
peers are advertised in `FindPeersResponse`.

Serialized form:

Length | Content
------ | ------
`20`   | Peer id
`4`    | IPv4 address
`2`    | Port, least significant byte first

*/
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PeerInfo {
    /// Id of the peer
    pub id: Id,
    /// Socket address of the peer
    pub saddr: SocketAddrV4,
}

impl FromBytes for PeerInfo {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, id) = Id::from_bytes(input)?;
        let (input, saddr) = SocketAddrV4::from_bytes(input)?;
        Ok((input, PeerInfo { id, saddr }))
    }
}

impl ToBytes for PeerInfo {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.id) >>
            gen_call!(|buf, saddr| SocketAddrV4::to_bytes(saddr, buf), &self.saddr)
        )
    }
}

impl PeerInfo {
    /// Create `PeerInfo` from id and address.
    pub fn new(id: Id, saddr: SocketAddrV4) -> Self {
        PeerInfo { id, saddr }
    }
}
