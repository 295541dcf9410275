/*! 160-bit node identifiers and the XOR metric.

Identifiers are opaque bit strings. Distance between two of them is the
bitwise exclusive-or of their bytes interpreted as a big-endian unsigned
magnitude.

[Kademlia whitepaper](https://pdos.csail.mit.edu/~petar/papers/maymounkov-kademlia-lncs.pdf).
*/

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

use base64::{alphabet, engine::{general_purpose, DecodePaddingMode, GeneralPurpose}, Engine as _};
use thiserror::Error;

/// Number of bytes in an `Id`.
pub const ID_SIZE: usize = 20;

/// Number of bits in an `Id`.
pub const ID_BITS: u32 = ID_SIZE as u32 * 8;

/// URL-safe alphabet that accepts both padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Error that can happen when constructing an `Id`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum IdError {
    /// Source can't supply exactly `ID_SIZE` bytes.
    #[error("Id requires {} bytes, got {}", ID_SIZE, len)]
    InvalidLength {
        /// Number of bytes that were available.
        len: usize,
    },
    /// Text is not valid URL-safe base64.
    #[error("Invalid base64 id: {0}")]
    Base64(base64::DecodeError),
}

/** Node identifier in the 160-dimensional metric space.

Equality and hashing are by raw content. The textual form is the URL-safe
base64 encoding of the 20 raw bytes.
*/
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Id([u8; ID_SIZE]);

impl Id {
    /** Copy `ID_SIZE` bytes starting at `offset` out of `buf`.

    Fails with `IdError::InvalidLength` when `buf` is too short.
    */
    pub fn from_slice(buf: &[u8], offset: usize) -> Result<Id, IdError> {
        let available = buf.len().saturating_sub(offset);
        buf.get(offset..offset.saturating_add(ID_SIZE))
            .and_then(|bytes| bytes.try_into().ok())
            .map(Id)
            .ok_or(IdError::InvalidLength { len: available })
    }

    /// Parse URL-safe base64 text. Decoded data must be exactly `ID_SIZE`
    /// bytes.
    pub fn from_base64(s: &str) -> Result<Id, IdError> {
        let data = URL_SAFE_LENIENT.decode(s).map_err(IdError::Base64)?;
        if data.len() != ID_SIZE {
            return Err(IdError::InvalidLength { len: data.len() });
        }
        Id::from_slice(&data, 0)
    }

    /// URL-safe base64 representation.
    pub fn to_base64(&self) -> String {
        general_purpose::URL_SAFE.encode(self.0)
    }

    /// First 6 characters of the base64 representation. Used in log lines.
    pub fn short(&self) -> String {
        let mut s = self.to_base64();
        s.truncate(6);
        s
    }

    /// Raw bytes of the `Id`.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// XOR distance to `other`.
    pub fn distance(&self, other: &Id) -> Distance {
        let mut xor = [0; ID_SIZE];
        for (i, byte) in xor.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        Distance(xor)
    }

    /** Length of the common leading-bit prefix of `self` and `other`.

    Returns `ID_BITS` when both ids are equal. Otherwise it's `ID_BITS` minus
    the 1-indexed position of the highest set bit of the distance.
    */
    pub fn shared_prefix_bits(&self, other: &Id) -> u32 {
        let mut bits = 0;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let xor = a ^ b;
            if xor == 0 {
                bits += 8;
            } else {
                return bits + xor.leading_zeros();
            }
        }
        bits
    }
}

/** Compare the distance between `a` and `reference` with the distance
between `b` and `reference`.

Both distances are compared as big-endian unsigned magnitudes, stopping at the
first differing byte.
*/
pub fn compare_distance(a: &Id, b: &Id, reference: &Id) -> Ordering {
    for i in 0..ID_SIZE {
        let ac = a.0[i] ^ reference.0[i];
        let bc = b.0[i] ^ reference.0[i];
        if ac != bc {
            return ac.cmp(&bc);
        }
    }
    Ordering::Equal
}

impl From<[u8; ID_SIZE]> for Id {
    fn from(bytes: [u8; ID_SIZE]) -> Self {
        Id(bytes)
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Id::from_base64(s)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Id({})", self.to_base64())
    }
}

/// XOR distance between two `Id`s. Ordered as a big-endian unsigned integer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Distance([u8; ID_SIZE]);

impl Distance {
    /// Check if the distance is zero, i.e. both ids were equal.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}
