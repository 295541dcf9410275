/*! FindPeersResponse packet
*/
use super::*;

use nom::multi::count;

/// Maximum number of peers a `FindPeersResponse` carries.
pub const MAX_FIND_PEERS: usize = 8;

/// Size in bytes of serialized `FindPeersResponse` without peers.
pub const FIND_PEERS_RESPONSE_MIN_SIZE: usize = 2;

/** Response to [`FindPeersRequest`](./struct.FindPeersRequest.html)
containing up to `8` peers closest to the requested id.

Length      | Content
----------- | ------
`1`         | `0x11`
`1`         | Number of peers (maximum 8)
`[0, 208]`  | Peers in packed format

A packed peer is an id followed by its IPv4 address, `26` bytes in total.

Only the first `8` peers are serialized when more are present.

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FindPeersResponse {
    /// Peers closest to the requested id
    pub peers: Vec<PeerInfo>,
}

impl ToBytes for FindPeersResponse {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let peers = &self.peers[..self.peers.len().min(MAX_FIND_PEERS)];
        do_gen!(buf,
            gen_be_u8!(Header::new(PayloadType::FindPeers, true).as_byte()) >>
            gen_be_u8!(peers.len() as u8) >>
            gen_many_ref!(peers, |buf, peer| PeerInfo::to_bytes(peer, buf))
        )
    }
}

impl FromBytes for FindPeersResponse {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = header(input, PayloadType::FindPeers, true)?;
        let (input, peers_number) = verify(le_u8, |len: &u8| usize::from(*len) <= MAX_FIND_PEERS)(input)?;
        let (input, peers) = count(PeerInfo::from_bytes, peers_number as usize)(input)?;
        Ok((input, FindPeersResponse { peers }))
    }
}

impl FindPeersResponse {
    /// Create response from candidate peers keeping at most `8` of them in
    /// iteration order.
    pub fn new<I: IntoIterator<Item = PeerInfo>>(peers: I) -> Self {
        FindPeersResponse {
            peers: peers.into_iter().take(MAX_FIND_PEERS).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use kad_id::*;

    fn peers(n: u8) -> Vec<PeerInfo> {
        (0..n)
            .map(|i| PeerInfo::new(
                Id::from([i; ID_SIZE]),
                SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, i + 1), 33445 + u16::from(i)),
            ))
            .collect()
    }

    encode_decode_test!(
        find_peers_response_empty_encode_decode,
        FindPeersResponse { peers: Vec::new() }
    );

    encode_decode_test!(
        find_peers_response_one_encode_decode,
        FindPeersResponse { peers: peers(1) }
    );

    encode_decode_test!(
        find_peers_response_full_encode_decode,
        FindPeersResponse { peers: peers(8) }
    );

    #[test]
    fn find_peers_response_truncated_to_max() {
        let candidates = peers(10);
        let packet = FindPeersResponse { peers: candidates.clone() };
        let mut buf = [0; 1024];
        let (_, size) = packet.to_bytes((&mut buf, 0)).unwrap();

        assert_eq!(size, FIND_PEERS_RESPONSE_MIN_SIZE + MAX_FIND_PEERS * PEER_INFO_SIZE);
        assert_eq!(buf[1], MAX_FIND_PEERS as u8);

        let (_, decoded) = FindPeersResponse::from_bytes(&buf[..size]).unwrap();
        assert_eq!(decoded.peers, candidates[..MAX_FIND_PEERS].to_vec());
    }

    #[test]
    fn find_peers_response_new_keeps_first_peers() {
        let candidates = peers(10);
        let packet = FindPeersResponse::new(candidates.clone());

        assert_eq!(packet.peers, candidates[..MAX_FIND_PEERS].to_vec());
    }

    #[test]
    fn find_peers_response_too_many_peers() {
        let mut buf = vec![0; FIND_PEERS_RESPONSE_MIN_SIZE + 9 * PEER_INFO_SIZE];
        buf[0] = 0x11;
        buf[1] = 9;

        assert!(FindPeersResponse::from_bytes(&buf).is_err());
    }

    #[test]
    fn find_peers_response_does_not_read_past_count() {
        let mut buf = [0; 1024];
        let (_, size) = FindPeersResponse { peers: peers(2) }.to_bytes((&mut buf, 0)).unwrap();
        // announce a single peer, the second one becomes trailing data
        buf[1] = 1;

        let (rest, decoded) = FindPeersResponse::from_bytes(&buf[..size]).unwrap();
        assert_eq!(decoded.peers, peers(1));
        assert_eq!(rest.len(), PEER_INFO_SIZE);
    }
}
