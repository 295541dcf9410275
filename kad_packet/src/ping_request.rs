/*! PingRequest packet
*/
use super::*;

use kad_id::*;

/// Size in bytes of serialized `PingRequest`.
pub const PING_REQUEST_SIZE: usize = 1 + ID_SIZE;

/** Ping request packet struct. Sent periodically to every known peer to
check whether it is still alive. The receiving peer answers with
`PingResponse`.

Length | Content
------ | ------
`1`    | `0x00`
`20`   | Id of the sender

*/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PingRequest {
    /// Id of the peer that sends the ping
    pub id: Id,
}

impl ToBytes for PingRequest {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::Ping, false).as_byte()) >>
            gen_call!(|buf, id| Id::to_bytes(id, buf), &self.id)
        )
    }
}

impl FromBytes for PingRequest {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::Ping, false)?;
        let (input, id) = Id::from_bytes(input)?;
        Ok((input, PingRequest { id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        ping_request_encode_decode,
        PingRequest { id: Id::from([42; ID_SIZE]) }
    );

    #[test]
    fn ping_request_wire_layout() {
        let packet = PingRequest { id: Id::from([0x11; ID_SIZE]) };
        let mut buf = [0; PING_REQUEST_SIZE];
        let (_, size) = packet.to_bytes((&mut buf, 0)).unwrap();

        assert_eq!(size, PING_REQUEST_SIZE);
        assert_eq!(buf[0], 0x00);
        assert_eq!(&buf[1..], &[0x11; ID_SIZE][..]);
    }

    #[test]
    fn ping_request_rejects_response_header() {
        let mut buf = [0; PING_REQUEST_SIZE];
        buf[0] = RESPONSE_FLAG;
        assert!(PingRequest::from_bytes(&buf).is_err());
    }
}
