/*! FindPeersRequest packet
*/
use super::*;

use kad_id::*;

/// Size in bytes of serialized `FindPeersRequest`.
pub const FIND_PEERS_REQUEST_SIZE: usize = 1 + ID_SIZE;

/** Request for the peers the receiver knows that are closest to the target
id. Answered with `FindPeersResponse`.

Length | Content
------ | ------
`1`    | `0x01`
`20`   | Target id

*/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FindPeersRequest {
    /// Id to look for
    pub target: Id,
}

impl ToBytes for FindPeersRequest {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::FindPeers, false).as_byte()) >>
            gen_call!(|buf, target| Id::to_bytes(target, buf), &self.target)
        )
    }
}

impl FromBytes for FindPeersRequest {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::FindPeers, false)?;
        let (input, target) = Id::from_bytes(input)?;
        Ok((input, FindPeersRequest { target }))
    }
}
