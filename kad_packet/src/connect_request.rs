/*! ConnectRequest packet
*/
use super::*;

use nom::multi::count;

use kad_id::*;

/// Maximum number of addresses a CONNECT packet carries.
pub const MAX_CONNECT_ADDRS: usize = 4;

/// Size in bytes of serialized `ConnectRequest` without addresses.
pub const CONNECT_REQUEST_MIN_SIZE: usize = 1 + 1 + ID_SIZE + ID_SIZE + 1;

/** Connect request packet struct. It's relayed from peer to peer towards
the target and carries the addresses the sender can be reached at. Every
relaying peer increments `ttl` which bounds the propagation.

Length     | Content
---------- | ------
`1`        | `0x02`
`1`        | TTL, starts at `0`
`20`       | Target id
`20`       | Id of the sender
`1`        | Number of addresses (maximum 4)
`[0, 24]`  | Addresses of the sender

Only the first `4` addresses are serialized when more are present.

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectRequest {
    /// Number of hops the request has made
    pub ttl: u8,
    /// Id of the peer the sender wants to connect to
    pub target: Id,
    /// Id of the sender
    pub from: Id,
    /// Addresses the sender can be reached at
    pub addrs: Vec<SocketAddrV4>,
}

impl ToBytes for ConnectRequest {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let addrs = &self.addrs[..self.addrs.len().min(MAX_CONNECT_ADDRS)];
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::Connect, false).as_byte()) >>
            gen_be_u8!(self.ttl) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.target) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.from) >>
            gen_be_u8!(addrs.len() as u8) >>
            gen_many_ref!(addrs, |buf, saddr| SocketAddrV4::to_bytes(saddr, buf))
        )
    }
}

impl FromBytes for ConnectRequest {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::Connect, false)?;
        let (input, ttl) = le_u8(input)?;
        let (input, target) = Id::from_bytes(input)?;
        let (input, from) = Id::from_bytes(input)?;
        let (input, addrs_number) = verify(le_u8, |len: &u8| usize::from(*len) <= MAX_CONNECT_ADDRS)(input)?;
        let (input, addrs) = count(SocketAddrV4::from_bytes, addrs_number as usize)(input)?;
        Ok((input, ConnectRequest { ttl, target, from, addrs }))
    }
}

impl ConnectRequest {
    /// Copy of the request to pass on to the next hop, `None` when the hop
    /// counter is exhausted.
    pub fn next_hop(&self) -> Option<ConnectRequest> {
        let ttl = self.ttl.checked_add(1)?;
        Some(ConnectRequest { ttl, ..self.clone() })
    }
}
