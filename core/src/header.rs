//! # Block Header Codec
//!
//! The fixed 88-byte wire form of a block header. These bytes are what the
//! miner hashes and what the validator re-hashes, so the layout is the
//! hash-stability contract of the whole chain:
//!
//! ```text
//! offset  width  field
//!      0      4  version        (u32, little-endian)
//!      4     32  previous_hash
//!     36     32  merkle_root
//!     68      4  bits           (u32, little-endian)
//!     72      8  timestamp      (u64, little-endian, seconds)
//!     80      8  nonce          (u64, little-endian)
//! ```
//!
//! No padding, no delimiters, no varints. Integer fields are little-endian,
//! the convention of every ledger wire format this one will ever be compared
//! against. Reordering or resizing a field is a hard fork; bump
//! [`BLOCK_VERSION`](crate::params::BLOCK_VERSION) and write a second codec
//! instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digest::{Digest, DigestProvider};

/// Encoded header length: 4 + 32 + 32 + 4 + 8 + 8.
pub const HEADER_LEN: usize = 88;

/// Byte offset of the nonce within the encoded header. The mining loop
/// rewrites only these eight bytes between attempts.
pub const NONCE_OFFSET: usize = 80;

/// Decoding failures for the fixed header layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The input was not exactly [`HEADER_LEN`] bytes.
    #[error("header must be exactly {expected} bytes, got {found}")]
    Length { expected: usize, found: usize },
}

/// The hashed summary fields of a block.
///
/// This is the *sealed* form: every field populated, including the nonce
/// and timestamp the miner settled on. Pre-seal state lives in
/// [`BlockTemplate`](crate::block::BlockTemplate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Header format tag.
    pub version: u32,
    /// Digest of the predecessor's header; all-zero for genesis.
    pub previous_hash: Digest,
    /// Root digest committing to the block's transactions.
    pub merkle_root: Digest,
    /// Difficulty: required count of leading zero bits in the header digest.
    pub bits: u32,
    /// Seconds since the Unix epoch, seeded when the nonce search started.
    pub timestamp: u64,
    /// The value the nonce search settled on.
    pub nonce: u64,
}

impl BlockHeader {
    /// Encodes the header into its canonical 88-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];

        // Version (4 bytes, little-endian)
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());

        // Previous block hash (32 bytes)
        buf[4..36].copy_from_slice(&self.previous_hash);

        // Merkle root (32 bytes)
        buf[36..68].copy_from_slice(&self.merkle_root);

        // Bits (4 bytes, little-endian)
        buf[68..72].copy_from_slice(&self.bits.to_le_bytes());

        // Timestamp (8 bytes, little-endian)
        buf[72..80].copy_from_slice(&self.timestamp.to_le_bytes());

        // Nonce (8 bytes, little-endian)
        buf[80..88].copy_from_slice(&self.nonce.to_le_bytes());

        buf
    }

    /// Decodes a header from its wire form. The input must be exactly
    /// [`HEADER_LEN`] bytes; anything else is a [`HeaderError::Length`].
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() != HEADER_LEN {
            return Err(HeaderError::Length {
                expected: HEADER_LEN,
                found: bytes.len(),
            });
        }

        Ok(Self {
            version: u32::from_le_bytes(take::<4>(bytes, 0)),
            previous_hash: take::<32>(bytes, 4),
            merkle_root: take::<32>(bytes, 36),
            bits: u32::from_le_bytes(take::<4>(bytes, 68)),
            timestamp: u64::from_le_bytes(take::<8>(bytes, 72)),
            nonce: u64::from_le_bytes(take::<8>(bytes, 80)),
        })
    }

    /// Overwrites the nonce bytes of an already-encoded header in place.
    ///
    /// Equivalent to setting `self.nonce` and calling [`encode`](Self::encode)
    /// again, minus the other eighty bytes of copying. The mining loop calls
    /// this once per attempt.
    pub fn patch_nonce(buf: &mut [u8; HEADER_LEN], nonce: u64) {
        buf[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
    }

    /// Hashes the canonical wire form through `provider`.
    pub fn hash<D: DigestProvider>(&self, provider: &D) -> Digest {
        provider.digest(&self.encode())
    }
}

/// Copies `N` bytes starting at `at`. Callers guarantee the input is long
/// enough; the decode path checks the full length up front.
fn take<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}
