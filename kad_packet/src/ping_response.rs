/*! PingResponse packet
*/
use super::*;

use kad_id::*;

/// Size in bytes of serialized `PingResponse`.
pub const PING_RESPONSE_SIZE: usize = 1 + ID_SIZE + SOCKET_ADDR_SIZE;

/** Ping response packet struct. Carries the id of the responder and the
address the request came from as the responder sees it, so the requester
learns its externally observed address.

Length | Content
------ | ------
`1`    | `0x10`
`20`   | Id of the responder
`6`    | Observed address of the requester

*/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PingResponse {
    /// Id of the peer that answers the ping
    pub id: Id,
    /// Address the ping request was received from
    pub saddr: SocketAddrV4,
}

impl ToBytes for PingResponse {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::Ping, true).as_byte()) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.id) >>
            gen_call!(|buf, saddr| SocketAddrV4::to_bytes(saddr, buf), &self.saddr)
        )
    }
}

impl FromBytes for PingResponse {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::Ping, true)?;
        let (input, id) = Id::from_bytes(input)?;
        let (input, saddr) = SocketAddrV4::from_bytes(input)?;
        Ok((input, PingResponse { id, saddr }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        ping_response_encode_decode,
        PingResponse {
            id: Id::from([42; ID_SIZE]),
            saddr: "203.0.113.7:33445".parse().unwrap(),
        }
    );

    #[test]
    fn ping_response_wire_layout() {
        let packet = PingResponse {
            id: Id::from([0x22; ID_SIZE]),
            saddr: "1.2.3.4:1025".parse().unwrap(),
        };
        let mut buf = [0; PING_RESPONSE_SIZE];
        let (_, size) = packet.to_bytes((&mut buf, 0)).unwrap();

        assert_eq!(size, PING_RESPONSE_SIZE);
        assert_eq!(buf[0], 0x10);
        assert_eq!(&buf[1..1 + ID_SIZE], &[0x22; ID_SIZE][..]);
        assert_eq!(&buf[1 + ID_SIZE..], &[1, 2, 3, 4, 0x01, 0x04][..]);
    }
}
