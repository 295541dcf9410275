/*! Codec for encoding/decoding kademlia packets using tokio-io
*/

use std::io::Error as IoError;

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use kad_packet::{Packet, MAX_PACKET_SIZE};

use crate::message::MAX_MESSAGE_SIZE;

/// Error that can happen when decoding `Packet` from bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Error indicates that we received too big packet.
    #[error("Packet should not be longer than {} bytes: {} bytes", MAX_MESSAGE_SIZE, len)]
    TooBigPacket {
        /// Length of received packet.
        len: usize
    },
    /// Error indicates that received packet can't be decoded.
    #[error("Decode packet error: {0}")]
    Packet(kad_packet::DecodeError),
    /// General IO error that can happen with UDP socket.
    #[error("IO Error")]
    Io(IoError),
}

impl DecodeError {
    pub(crate) fn too_big_packet(len: usize) -> DecodeError {
        DecodeError::TooBigPacket { len }
    }
}

/// Error that can happen when encoding `Packet` to bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Error indicates that `Packet` is invalid and can't be serialized.
    #[error("Encode packet error: {0}")]
    Packet(kad_packet::EncodeError),
    /// General IO error that can happen with UDP socket.
    #[error("IO Error")]
    Io(IoError),
}

impl From<kad_packet::DecodeError> for DecodeError {
    fn from(error: kad_packet::DecodeError) -> DecodeError {
        DecodeError::Packet(error)
    }
}

impl From<kad_packet::EncodeError> for EncodeError {
    fn from(error: kad_packet::EncodeError) -> EncodeError {
        EncodeError::Packet(error)
    }
}

impl From<IoError> for DecodeError {
    fn from(error: IoError) -> DecodeError {
        DecodeError::Io(error)
    }
}

impl From<IoError> for EncodeError {
    fn from(error: IoError) -> EncodeError {
        EncodeError::Io(error)
    }
}

/// Struct to use for {de-,}serializing kademlia UDP packets.
#[derive(Clone, Copy, Debug, Default)]
pub struct KadCodec;

impl Decoder for KadCodec {
    type Item = Packet;
    type Error = DecodeError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.is_empty() {
            return Ok(None);
        }

        let len = buf.len();
        let result = if len > MAX_MESSAGE_SIZE {
            Err(DecodeError::too_big_packet(len))
        } else {
            Packet::decode(buf).map(Some).map_err(|error| {
                debug!("Dropping malformed packet of {} bytes: {}", len, error);
                DecodeError::from(error)
            })
        };

        // one datagram is one packet, trailing bytes are never a next packet
        buf.clear();

        result
    }
}

impl Encoder<Packet> for KadCodec {
    type Error = EncodeError;

    fn encode(&mut self, packet: Packet, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut packet_buf = [0; MAX_PACKET_SIZE];
        let size = packet.encode(&mut packet_buf)?;
        buf.extend_from_slice(&packet_buf[..size]);
        Ok(())
    }
}
