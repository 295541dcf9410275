/*! Encoding/decoding traits and the fixed-size wire primitives shared by all
kademlia packets.
*/

#![forbid(unsafe_code)]

#[macro_use]
extern crate cookie_factory;

use std::net::{Ipv4Addr, SocketAddrV4};

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::le_u16;

pub use nom::IResult;
pub use cookie_factory::GenError;

/// Size of a serialized `SocketAddrV4`: 4 bytes of address and 2 bytes of
/// port.
pub const SOCKET_ADDR_SIZE: usize = 6;

/// The trait provides method to deserialize struct from raw bytes
pub trait FromBytes: Sized {
    /// Deserialize struct using `nom` from raw bytes
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self>;
}

/// The trait provides method to serialize struct into raw bytes
pub trait ToBytes: Sized {
    /// Serialize struct into raw bytes using `cookie_factory`
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError>;
}

impl FromBytes for Ipv4Addr {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map(take(4usize), |o: &[u8]| Ipv4Addr::new(o[0], o[1], o[2], o[3]))(input)
    }
}

impl ToBytes for Ipv4Addr {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let o = self.octets();
        do_gen!(buf,
            gen_be_u8!(o[0]) >>
            gen_be_u8!(o[1]) >>
            gen_be_u8!(o[2]) >>
            gen_be_u8!(o[3])
        )
    }
}

/** IPv4 socket address as it's sent on the wire.

Length | Content
------ | -------
`4`    | IPv4 address
`2`    | Port, least significant byte first

*/
impl FromBytes for SocketAddrV4 {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, ip) = Ipv4Addr::from_bytes(input)?;
        let (input, port) = le_u16(input)?;
        Ok((input, SocketAddrV4::new(ip, port)))
    }
}

impl ToBytes for SocketAddrV4 {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_call!(|buf, ip| Ipv4Addr::to_bytes(ip, buf), self.ip()) >>
            gen_le_u16!(self.port())
        )
    }
}

/// Helper for `encode_decode_test!` so that the decoded type is inferred from
/// the encoded value.
#[doc(hidden)]
pub fn decode_like<'a, T: FromBytes>(_value: &T, input: &'a [u8]) -> IResult<&'a [u8], T> {
    T::from_bytes(input)
}

/// Generate a test that serializes a value, parses it back and checks that
/// nothing is lost.
#[macro_export]
macro_rules! encode_decode_test (
    ($test:ident, $value:expr) => (
        #[test]
        fn $test() {
            use $crate::ToBytes;

            let value = $value;
            let mut buf = [0; 1024 * 4];
            let (_, size) = value.to_bytes((&mut buf, 0)).unwrap();
            let (rest, decoded_value) = $crate::decode_like(&value, &buf[..size]).unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded_value, value);
        }
    )
);

#[cfg(feature = "id")]
mod id;

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        socket_addr_encode_decode,
        "1.2.3.4:12345".parse::<SocketAddrV4>().unwrap()
    );

    encode_decode_test!(
        ipv4_addr_encode_decode,
        Ipv4Addr::new(192, 168, 0, 1)
    );

    #[test]
    fn socket_addr_port_is_little_endian() {
        let saddr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 0x1234);
        let mut buf = [0; SOCKET_ADDR_SIZE];
        let (_, size) = saddr.to_bytes((&mut buf, 0)).unwrap();

        assert_eq!(size, SOCKET_ADDR_SIZE);
        assert_eq!(buf, [10, 0, 0, 1, 0x34, 0x12]);
    }

    #[test]
    fn socket_addr_from_wire_bytes() {
        let (rest, saddr) = SocketAddrV4::from_bytes(&[127, 0, 0, 1, 0x90, 0x1f, 0xff]).unwrap();

        assert_eq!(rest, &[0xff]);
        assert_eq!(saddr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn socket_addr_incomplete() {
        assert!(SocketAddrV4::from_bytes(&[127, 0, 0, 1, 0x90]).is_err());
    }

    #[test]
    fn socket_addr_buffer_too_small() {
        let saddr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 1);
        let mut buf = [0; SOCKET_ADDR_SIZE - 1];
        assert!(saddr.to_bytes((&mut buf, 0)).is_err());
    }
}
