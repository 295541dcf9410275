/*! Kademlia wire protocol packets.

Every packet starts with a single header byte:

Mask   | Content
------ | -------
`0xc0` | Protocol version
`0x10` | Response flag
`0x07` | Payload type: `0` PING, `1` FINDPEERS, `2` CONNECT

The remaining bits are reserved. The header is
followed by the payload of the request or response variant named by the
header. All multi-byte integers are little-endian, ids are 20 raw bytes.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate cookie_factory;

use std::convert::TryFrom;
use std::net::SocketAddrV4;

use nom::branch::alt;
use nom::combinator::{map, verify};
use nom::number::complete::le_u8;

use kad_binary_io::*;

mod errors;
mod peer_info;
mod ping_request;
mod ping_response;
mod find_peers_request;
mod find_peers_response;
mod connect_request;
mod connect_response;

pub use self::errors::*;
pub use self::peer_info::*;
pub use self::ping_request::*;
pub use self::ping_response::*;
pub use self::find_peers_request::*;
pub use self::find_peers_response::*;
pub use self::connect_request::*;
pub use self::connect_response::*;

/// Protocol version written into the header of outgoing packets.
pub const PROTOCOL_VERSION: u8 = 0;

/// Header bit that marks a packet as a response.
pub const RESPONSE_FLAG: u8 = 0x10;

/// Header bits that hold the payload type.
pub const PAYLOAD_TYPE_MASK: u8 = 0x07;

/// Size of the biggest serialized packet, a `FindPeersResponse` with `8`
/// peers.
pub const MAX_PACKET_SIZE: usize = FIND_PEERS_RESPONSE_MIN_SIZE + MAX_FIND_PEERS * PEER_INFO_SIZE;

/// Kind of the payload carried by a packet.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PayloadType {
    /// Liveness probe
    Ping = 0,
    /// Request for the peers closest to a target id
    FindPeers = 1,
    /// Relayed connection setup
    Connect = 2,
}

impl TryFrom<u8> for PayloadType {
    type Error = DecodeError;

    fn try_from(payload_type: u8) -> Result<Self, Self::Error> {
        match payload_type {
            0 => Ok(PayloadType::Ping),
            1 => Ok(PayloadType::FindPeers),
            2 => Ok(PayloadType::Connect),
            _ => Err(DecodeError::UnknownPayloadType { payload_type }),
        }
    }
}

/// The first byte of every packet.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Header(u8);

impl Header {
    /// Header for an outgoing packet of the current protocol version.
    pub fn new(payload_type: PayloadType, is_response: bool) -> Header {
        let flag = if is_response { RESPONSE_FLAG } else { 0 };
        Header(PROTOCOL_VERSION << 6 | flag | payload_type as u8)
    }

    /// Interpret a raw header byte.
    pub fn from_byte(byte: u8) -> Header {
        Header(byte)
    }

    /// Raw header byte.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Protocol version stored in the two high bits.
    pub fn version(self) -> u8 {
        self.0 >> 6
    }

    /// Payload type stored in the three low bits.
    pub fn payload_type(self) -> Result<PayloadType, DecodeError> {
        PayloadType::try_from(self.0 & PAYLOAD_TYPE_MASK)
    }

    /// Whether the response flag is set.
    pub fn is_response(self) -> bool {
        self.0 & RESPONSE_FLAG != 0
    }

    fn matches(self, payload_type: PayloadType, is_response: bool) -> bool {
        self.0 & PAYLOAD_TYPE_MASK == payload_type as u8 && self.is_response() == is_response
    }
}

/// Parse the header byte and check that it names the expected variant.
/// Version and reserved bits are not checked.
pub(crate) fn header(input: &[u8], payload_type: PayloadType, is_response: bool) -> IResult<&[u8], Header> {
    verify(map(le_u8, Header::from_byte), |header: &Header| header.matches(payload_type, is_response))(input)
}

/// Whether an address can be used to reach a peer.
pub fn is_usable_addr(saddr: &SocketAddrV4) -> bool {
    !saddr.ip().is_unspecified() && !saddr.ip().is_broadcast() && saddr.port() != 0
}

/** Kademlia packet enum that encapsulates all request and response
variants.

Use `Packet::decode` for untrusted input: unlike plain `from_bytes` it checks
the buffer length against the header and the declared counts before parsing
and rejects unusable addresses.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Packet {
    /// [`PingRequest`](./struct.PingRequest.html) structure.
    PingRequest(PingRequest),
    /// [`PingResponse`](./struct.PingResponse.html) structure.
    PingResponse(PingResponse),
    /// [`FindPeersRequest`](./struct.FindPeersRequest.html) structure.
    FindPeersRequest(FindPeersRequest),
    /// [`FindPeersResponse`](./struct.FindPeersResponse.html) structure.
    FindPeersResponse(FindPeersResponse),
    /// [`ConnectRequest`](./struct.ConnectRequest.html) structure.
    ConnectRequest(ConnectRequest),
    /// [`ConnectResponse`](./struct.ConnectResponse.html) structure.
    ConnectResponse(ConnectResponse),
}

impl ToBytes for Packet {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        match *self {
            Packet::PingRequest(ref p) => p.to_bytes(buf),
            Packet::PingResponse(ref p) => p.to_bytes(buf),
            Packet::FindPeersRequest(ref p) => p.to_bytes(buf),
            Packet::FindPeersResponse(ref p) => p.to_bytes(buf),
            Packet::ConnectRequest(ref p) => p.to_bytes(buf),
            Packet::ConnectResponse(ref p) => p.to_bytes(buf),
        }
    }
}

impl FromBytes for Packet {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        alt((
            map(PingRequest::from_bytes, Packet::PingRequest),
            map(PingResponse::from_bytes, Packet::PingResponse),
            map(FindPeersRequest::from_bytes, Packet::FindPeersRequest),
            map(FindPeersResponse::from_bytes, Packet::FindPeersResponse),
            map(ConnectRequest::from_bytes, Packet::ConnectRequest),
            map(ConnectResponse::from_bytes, Packet::ConnectResponse),
        ))(input)
    }
}

impl Packet {
    /// Header byte this packet is sent with.
    pub fn header(&self) -> Header {
        match *self {
            Packet::PingRequest(_) => Header::new(PayloadType::Ping, false),
            Packet::PingResponse(_) => Header::new(PayloadType::Ping, true),
            Packet::FindPeersRequest(_) => Header::new(PayloadType::FindPeers, false),
            Packet::FindPeersResponse(_) => Header::new(PayloadType::FindPeers, true),
            Packet::ConnectRequest(_) => Header::new(PayloadType::Connect, false),
            Packet::ConnectResponse(_) => Header::new(PayloadType::Connect, true),
        }
    }

    /// Payload type of this packet.
    pub fn payload_type(&self) -> PayloadType {
        match *self {
            Packet::PingRequest(_) | Packet::PingResponse(_) => PayloadType::Ping,
            Packet::FindPeersRequest(_) | Packet::FindPeersResponse(_) => PayloadType::FindPeers,
            Packet::ConnectRequest(_) | Packet::ConnectResponse(_) => PayloadType::Connect,
        }
    }

    /// Whether this packet is a response.
    pub fn is_response(&self) -> bool {
        self.header().is_response()
    }

    /// Serialize packet into `buf` returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let (_, size) = self.to_bytes((buf, 0))?;
        Ok(size)
    }

    /** Decode a packet received from the network.

    Returns `Error` in case of failure:

    - empty buffer or buffer shorter than the header and counts require
    - unknown payload type
    - count above the variant maximum or malformed flag
    - address that can't be used to reach a peer

    Bytes after the declared payload are ignored.
    */
    pub fn decode(buf: &[u8]) -> Result<Packet, DecodeError> {
        let header = match buf.first() {
            Some(&byte) => Header::from_byte(byte),
            None => return Err(DecodeError::truncated(1, 0)),
        };
        let payload_type = header.payload_type()?;

        let expected = min_size(payload_type, header.is_response(), buf);
        if buf.len() < expected {
            return Err(DecodeError::truncated(expected, buf.len()));
        }

        let packet = match (payload_type, header.is_response()) {
            (PayloadType::Ping, false) => map(PingRequest::from_bytes, Packet::PingRequest)(buf),
            (PayloadType::Ping, true) => map(PingResponse::from_bytes, Packet::PingResponse)(buf),
            (PayloadType::FindPeers, false) => map(FindPeersRequest::from_bytes, Packet::FindPeersRequest)(buf),
            (PayloadType::FindPeers, true) => map(FindPeersResponse::from_bytes, Packet::FindPeersResponse)(buf),
            (PayloadType::Connect, false) => map(ConnectRequest::from_bytes, Packet::ConnectRequest)(buf),
            (PayloadType::Connect, true) => map(ConnectResponse::from_bytes, Packet::ConnectResponse)(buf),
        };
        let packet = match packet {
            Ok((_, packet)) => packet,
            Err(error) => return Err(DecodeError::deserialize(error, buf.to_vec())),
        };

        if let Some(addr) = packet.addrs().into_iter().find(|addr| !is_usable_addr(addr)) {
            return Err(DecodeError::AddressResolution { addr });
        }

        Ok(packet)
    }

    /// All socket addresses carried by this packet.
    pub fn addrs(&self) -> Vec<SocketAddrV4> {
        match *self {
            Packet::PingRequest(_) | Packet::FindPeersRequest(_) => Vec::new(),
            Packet::PingResponse(ref p) => vec![p.saddr],
            Packet::FindPeersResponse(ref p) => p.peers.iter().map(|peer| peer.saddr).collect(),
            Packet::ConnectRequest(ref p) => p.addrs.clone(),
            Packet::ConnectResponse(ref p) => p.addrs.clone(),
        }
    }
}

/// Minimum length of a packet with the given header, including the elements
/// announced by its count byte when that byte is present.
fn min_size(payload_type: PayloadType, is_response: bool, buf: &[u8]) -> usize {
    let counted = |fixed: usize, count_offset: usize, element: usize| match buf.get(count_offset) {
        Some(&count) => fixed + count as usize * element,
        None => fixed,
    };

    match (payload_type, is_response) {
        (PayloadType::Ping, false) => PING_REQUEST_SIZE,
        (PayloadType::Ping, true) => PING_RESPONSE_SIZE,
        (PayloadType::FindPeers, false) => FIND_PEERS_REQUEST_SIZE,
        (PayloadType::FindPeers, true) => counted(
            FIND_PEERS_RESPONSE_MIN_SIZE,
            FIND_PEERS_RESPONSE_MIN_SIZE - 1,
            PEER_INFO_SIZE,
        ),
        (PayloadType::Connect, false) => counted(
            CONNECT_REQUEST_MIN_SIZE,
            CONNECT_REQUEST_MIN_SIZE - 1,
            SOCKET_ADDR_SIZE,
        ),
        (PayloadType::Connect, true) => counted(
            CONNECT_RESPONSE_MIN_SIZE,
            CONNECT_RESPONSE_MIN_SIZE - 1,
            SOCKET_ADDR_SIZE,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use kad_id::{Id, ID_SIZE};
    use quickcheck::{quickcheck, Arbitrary, Gen};

    fn saddr(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), port)
    }

    fn encode(packet: &Packet) -> Vec<u8> {
        let mut buf = [0; 1024];
        let size = packet.encode(&mut buf).unwrap();
        buf[..size].to_vec()
    }

    encode_decode_test!(
        packet_ping_request_encode_decode,
        Packet::PingRequest(PingRequest { id: Id::from([1; ID_SIZE]) })
    );

    encode_decode_test!(
        packet_find_peers_response_encode_decode,
        Packet::FindPeersResponse(FindPeersResponse {
            peers: vec![PeerInfo::new(Id::from([2; ID_SIZE]), saddr(1))],
        })
    );

    encode_decode_test!(
        packet_connect_response_encode_decode,
        Packet::ConnectResponse(ConnectResponse {
            ttl: 3,
            target: Id::from([3; ID_SIZE]),
            success: true,
            id: Id::from([4; ID_SIZE]),
            addrs: vec![saddr(2), saddr(3)],
        })
    );

    #[test]
    fn header_bits() {
        let header = Header::new(PayloadType::Connect, true);
        assert_eq!(header.as_byte(), 0x12);
        assert_eq!(header.version(), PROTOCOL_VERSION);
        assert_eq!(header.payload_type().unwrap(), PayloadType::Connect);
        assert!(header.is_response());

        let header = Header::from_byte(0xc1);
        assert_eq!(header.version(), 3);
        assert_eq!(header.payload_type().unwrap(), PayloadType::FindPeers);
        assert!(!header.is_response());
    }

    #[test]
    fn ping_request_decode_recovers_id() {
        let id = Id::from([0x5a; ID_SIZE]);
        let bytes = encode(&Packet::PingRequest(PingRequest { id }));

        assert_eq!(bytes.len(), PING_REQUEST_SIZE);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(Packet::decode(&bytes).unwrap(), Packet::PingRequest(PingRequest { id }));
    }

    #[test]
    fn decode_ignores_version_bits() {
        let id = Id::from([9; ID_SIZE]);
        let mut bytes = encode(&Packet::PingRequest(PingRequest { id }));
        bytes[0] |= 0x40;

        assert_eq!(Packet::decode(&bytes).unwrap(), Packet::PingRequest(PingRequest { id }));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let packet = Packet::FindPeersRequest(FindPeersRequest { target: Id::from([8; ID_SIZE]) });
        let mut bytes = encode(&packet);
        bytes.extend_from_slice(&[0xff; 10]);

        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn decode_empty() {
        assert_eq!(Packet::decode(&[]), Err(DecodeError::Truncated { expected: 1, actual: 0 }));
    }

    #[test]
    fn decode_unknown_payload_type() {
        let mut buf = [0; 64];
        buf[0] = 0x03;
        assert_eq!(Packet::decode(&buf), Err(DecodeError::UnknownPayloadType { payload_type: 3 }));

        buf[0] = 0x17;
        assert_eq!(Packet::decode(&buf), Err(DecodeError::UnknownPayloadType { payload_type: 7 }));
    }

    #[test]
    fn decode_truncated_ping() {
        let bytes = encode(&Packet::PingResponse(PingResponse {
            id: Id::from([1; ID_SIZE]),
            saddr: saddr(33445),
        }));

        assert_eq!(
            Packet::decode(&bytes[..bytes.len() - 1]),
            Err(DecodeError::Truncated { expected: PING_RESPONSE_SIZE, actual: PING_RESPONSE_SIZE - 1 })
        );
    }

    #[test]
    fn decode_find_peers_response_claiming_more_peers_than_present() {
        let peers = (0..3)
            .map(|i| PeerInfo::new(Id::from([i; ID_SIZE]), saddr(1000 + i as u16)))
            .collect();
        let mut bytes = encode(&Packet::FindPeersResponse(FindPeersResponse { peers }));
        bytes[1] = MAX_FIND_PEERS as u8;

        assert_eq!(
            Packet::decode(&bytes),
            Err(DecodeError::Truncated {
                expected: FIND_PEERS_RESPONSE_MIN_SIZE + MAX_FIND_PEERS * PEER_INFO_SIZE,
                actual: FIND_PEERS_RESPONSE_MIN_SIZE + 3 * PEER_INFO_SIZE,
            })
        );
    }

    #[test]
    fn decode_truncated_connect_request_header() {
        let bytes = encode(&Packet::ConnectRequest(ConnectRequest {
            ttl: 0,
            target: Id::from([1; ID_SIZE]),
            from: Id::from([2; ID_SIZE]),
            addrs: vec![saddr(1)],
        }));

        assert_eq!(
            Packet::decode(&bytes[..30]),
            Err(DecodeError::Truncated { expected: CONNECT_REQUEST_MIN_SIZE, actual: 30 })
        );
        assert_eq!(
            Packet::decode(&bytes[..CONNECT_REQUEST_MIN_SIZE]),
            Err(DecodeError::Truncated {
                expected: CONNECT_REQUEST_MIN_SIZE + SOCKET_ADDR_SIZE,
                actual: CONNECT_REQUEST_MIN_SIZE,
            })
        );
    }

    #[test]
    fn decode_too_many_peers() {
        let mut buf = vec![0; FIND_PEERS_RESPONSE_MIN_SIZE + 9 * PEER_INFO_SIZE];
        buf[0] = Header::new(PayloadType::FindPeers, true).as_byte();
        buf[1] = 9;

        assert!(matches!(Packet::decode(&buf), Err(DecodeError::Deserialize { .. })));
    }

    #[test]
    fn decode_invalid_success_flag() {
        let mut bytes = encode(&Packet::ConnectResponse(ConnectResponse {
            ttl: 1,
            target: Id::from([1; ID_SIZE]),
            success: false,
            id: Id::from([2; ID_SIZE]),
            addrs: Vec::new(),
        }));
        bytes[2 + ID_SIZE] = 2;

        assert!(matches!(Packet::decode(&bytes), Err(DecodeError::Deserialize { .. })));
    }

    #[test]
    fn decode_unusable_addr() {
        let unspecified = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 33445);
        let bytes = encode(&Packet::PingResponse(PingResponse {
            id: Id::from([1; ID_SIZE]),
            saddr: unspecified,
        }));
        assert_eq!(Packet::decode(&bytes), Err(DecodeError::AddressResolution { addr: unspecified }));

        let zero_port = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 0);
        let bytes = encode(&Packet::ConnectRequest(ConnectRequest {
            ttl: 0,
            target: Id::from([1; ID_SIZE]),
            from: Id::from([2; ID_SIZE]),
            addrs: vec![saddr(1), zero_port],
        }));
        assert_eq!(Packet::decode(&bytes), Err(DecodeError::AddressResolution { addr: zero_port }));
    }

    #[test]
    fn usable_addr() {
        assert!(is_usable_addr(&saddr(1)));
        assert!(!is_usable_addr(&SocketAddrV4::new(Ipv4Addr::BROADCAST, 1)));
        assert!(!is_usable_addr(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 1)));
        assert!(!is_usable_addr(&saddr(0)));
    }

    #[test]
    fn encode_buffer_too_small() {
        let packet = Packet::PingRequest(PingRequest { id: Id::from([1; ID_SIZE]) });
        let mut buf = [0; PING_REQUEST_SIZE - 1];
        assert!(matches!(packet.encode(&mut buf), Err(EncodeError::Serialize { .. })));
    }

    #[test]
    fn max_packet_size_fits_every_variant() {
        let packets = vec![
            Packet::FindPeersResponse(FindPeersResponse {
                peers: vec![PeerInfo::new(Id::from([1; ID_SIZE]), saddr(1)); MAX_FIND_PEERS],
            }),
            Packet::ConnectResponse(ConnectResponse {
                ttl: 0,
                target: Id::from([1; ID_SIZE]),
                success: true,
                id: Id::from([2; ID_SIZE]),
                addrs: vec![saddr(1); MAX_CONNECT_ADDRS],
            }),
        ];
        let mut buf = [0; MAX_PACKET_SIZE];
        let sizes: Vec<usize> = packets.iter().map(|p| p.encode(&mut buf).unwrap()).collect();

        assert_eq!(sizes[0], MAX_PACKET_SIZE);
        assert!(sizes[1] < MAX_PACKET_SIZE);
    }

    #[test]
    fn packet_kind() {
        let packet = Packet::FindPeersResponse(FindPeersResponse { peers: Vec::new() });
        assert_eq!(packet.payload_type(), PayloadType::FindPeers);
        assert!(packet.is_response());
        assert_eq!(packet.header().as_byte(), 0x11);
    }

    fn arbitrary_id(g: &mut Gen) -> Id {
        let mut bytes = [0; ID_SIZE];
        for byte in bytes.iter_mut() {
            *byte = u8::arbitrary(g);
        }
        Id::from(bytes)
    }

    fn arbitrary_usable_saddr(g: &mut Gen) -> SocketAddrV4 {
        let ip = match Ipv4Addr::from(u32::arbitrary(g)) {
            ip if ip.is_unspecified() || ip.is_broadcast() => Ipv4Addr::new(10, 0, 0, 1),
            ip => ip,
        };
        SocketAddrV4::new(ip, u16::arbitrary(g).max(1))
    }

    fn arbitrary_addrs(g: &mut Gen) -> Vec<SocketAddrV4> {
        let len = usize::arbitrary(g) % (MAX_CONNECT_ADDRS + 1);
        (0..len).map(|_| arbitrary_usable_saddr(g)).collect()
    }

    impl Arbitrary for Packet {
        fn arbitrary(g: &mut Gen) -> Self {
            match u8::arbitrary(g) % 6 {
                0 => Packet::PingRequest(PingRequest { id: arbitrary_id(g) }),
                1 => Packet::PingResponse(PingResponse {
                    id: arbitrary_id(g),
                    saddr: arbitrary_usable_saddr(g),
                }),
                2 => Packet::FindPeersRequest(FindPeersRequest { target: arbitrary_id(g) }),
                3 => {
                    let len = usize::arbitrary(g) % (MAX_FIND_PEERS + 1);
                    let peers = (0..len)
                        .map(|_| PeerInfo::new(arbitrary_id(g), arbitrary_usable_saddr(g)))
                        .collect();
                    Packet::FindPeersResponse(FindPeersResponse { peers })
                },
                4 => Packet::ConnectRequest(ConnectRequest {
                    ttl: u8::arbitrary(g),
                    target: arbitrary_id(g),
                    from: arbitrary_id(g),
                    addrs: arbitrary_addrs(g),
                }),
                _ => Packet::ConnectResponse(ConnectResponse {
                    ttl: u8::arbitrary(g),
                    target: arbitrary_id(g),
                    success: bool::arbitrary(g),
                    id: arbitrary_id(g),
                    addrs: arbitrary_addrs(g),
                }),
            }
        }
    }

    #[test]
    fn encode_decode_prop() {
        fn prop(packet: Packet) -> bool {
            let mut buf = [0; MAX_PACKET_SIZE];
            let size = packet.encode(&mut buf).unwrap();
            packet.header().as_byte() == buf[0] && Packet::decode(&buf[..size]) == Ok(packet)
        }
        quickcheck(prop as fn(Packet) -> bool);
    }
}
