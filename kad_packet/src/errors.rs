/*! Errors that can happen while encoding or decoding kademlia packets.
*/

use std::net::SocketAddrV4;

use cookie_factory::GenError;
use nom::{error::Error as NomError, Err};
use thiserror::Error;

/// Error that can happen when decoding `Packet` from bytes.
#[derive(Debug, PartialEq, Error)]
pub enum DecodeError {
    /// The buffer is shorter than the header and the declared counts require.
    #[error("Truncated packet: expected at least {} bytes, got {}", expected, actual)]
    Truncated {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// The payload type bits of the header byte don't name a known packet.
    #[error("Unknown payload type: {}", payload_type)]
    UnknownPayloadType {
        /// Payload type bits of the header
        payload_type: u8,
    },
    /// A decoded socket address can't be used to reach a peer.
    #[error("Unusable socket address: {}", addr)]
    AddressResolution {
        /// The address as it was decoded
        addr: SocketAddrV4,
    },
    /// The packet has the right size but its content is malformed.
    #[error("Deserialize packet error: {:?}, packet: {:?}", error, packet)]
    Deserialize {
        /// Parsing error
        error: Err<NomError<Vec<u8>>>,
        /// Received packet
        packet: Vec<u8>,
    },
}

impl DecodeError {
    pub(crate) fn truncated(expected: usize, actual: usize) -> DecodeError {
        DecodeError::Truncated { expected, actual }
    }

    pub(crate) fn deserialize(e: Err<NomError<&[u8]>>, packet: Vec<u8>) -> DecodeError {
        DecodeError::Deserialize { error: e.map(|e| NomError::new(e.input.to_vec(), e.code)), packet }
    }
}

/// Error that can happen when encoding `Packet` into a buffer.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Serialization failed, usually because the buffer is too small.
    #[error("Serialize packet error: {:?}", error)]
    Serialize {
        /// Serialization error
        error: GenError,
    },
}

impl From<GenError> for EncodeError {
    fn from(error: GenError) -> EncodeError {
        EncodeError::Serialize { error }
    }
}
