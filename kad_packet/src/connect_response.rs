/*! ConnectResponse packet
*/
use super::*;

use nom::multi::count;

use kad_id::*;

/// Size in bytes of serialized `ConnectResponse` without addresses.
pub const CONNECT_RESPONSE_MIN_SIZE: usize = 1 + 1 + ID_SIZE + 1 + ID_SIZE + 1;

/** Answer to [`ConnectRequest`](./struct.ConnectRequest.html). Tells whether
the target agreed to connect and where it can be reached.

Length     | Content
---------- | ------
`1`        | `0x12`
`1`        | TTL
`20`       | Target id of the request
`1`        | Success flag, `0` or `1`
`20`       | Id of the responder
`1`        | Number of addresses (maximum 4)
`[0, 24]`  | Addresses of the responder

Only the first `4` addresses are serialized when more are present.

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectResponse {
    /// Number of hops the response has made
    pub ttl: u8,
    /// Target id copied from the request
    pub target: Id,
    /// Whether the connection was accepted
    pub success: bool,
    /// Id of the responder
    pub id: Id,
    /// Addresses the responder can be reached at
    pub addrs: Vec<SocketAddrV4>,
}

impl ToBytes for ConnectResponse {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let addrs = &self.addrs[..self.addrs.len().min(MAX_CONNECT_ADDRS)];
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::Connect, true).as_byte()) >>
            gen_be_u8!(self.ttl) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.target) >>
            gen_be_u8!(u8::from(self.success)) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.id) >>
            gen_be_u8!(addrs.len() as u8) >>
            gen_many_ref!(addrs, |buf, saddr| SocketAddrV4::to_bytes(saddr, buf))
        )
    }
}

impl FromBytes for ConnectResponse {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::Connect, true)?;
        let (input, ttl) = le_u8(input)?;
        let (input, target) = Id::from_bytes(input)?;
        let (input, success) = map(verify(le_u8, |flag: &u8| *flag <= 1), |flag| flag == 1)(input)?;
        let (input, id) = Id::from_bytes(input)?;
        let (input, addrs_number) = verify(le_u8, |len: &u8| usize::from(*len) <= MAX_CONNECT_ADDRS)(input)?;
        let (input, addrs) = count(SocketAddrV4::from_bytes, addrs_number as usize)(input)?;
        Ok((input, ConnectResponse { ttl, target, success, id, addrs }))
    }
}
