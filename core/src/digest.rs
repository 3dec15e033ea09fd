//! # Digest Provider
//!
//! The kernel never hashes anything itself — every digest goes through a
//! [`DigestProvider`], and the provider is chosen by whoever embeds the
//! kernel. Two engines ship in-tree:
//!
//! - **SHA-256** — the conventional choice for proof-of-work headers and the
//!   engine the rest of the ledger world can re-verify without ceremony.
//! - **BLAKE3** — ~5x faster than SHA-256 on x86-64, same 32-byte output.
//!   Worth it for private deployments where interop doesn't matter.
//!
//! Both produce [`Digest`] values: owned, fixed-size, `Copy`. Nothing in the
//! kernel holds a digest by pointer, so duplicating one (the Merkle odd-leaf
//! rule does this a lot) is always a value copy.

use sha2::{Digest as _, Sha256};

/// Digest width in bytes. Both shipped engines emit 32 bytes.
pub const DIGEST_LEN: usize = 32;

/// Digest width in bits; the exclusive upper bound for difficulty.
pub const DIGEST_BITS: u32 = 256;

/// A fixed-width hash output. Owned and `Copy` everywhere.
pub type Digest = [u8; DIGEST_LEN];

/// The all-zero digest. Genesis blocks carry it as their previous hash;
/// nothing else in the kernel should ever produce it.
pub const ZERO_DIGEST: Digest = [0u8; DIGEST_LEN];

/// A deterministic, collision-resistant hash function over arbitrary bytes.
///
/// Implementations must be pure: same input, same digest, on every call and
/// every platform. The kernel feeds this trait header bytes, transaction
/// payloads, and 64-byte Merkle node pairs, and it cross-checks miners
/// against validators by assuming both used the same provider.
pub trait DigestProvider {
    /// Hashes `data` to a fixed-width digest.
    fn digest(&self, data: &[u8]) -> Digest;

    /// Hashes the concatenation `left ‖ right` of two digests.
    ///
    /// This is the Merkle interior-node operation. The default implementation
    /// concatenates on the stack and calls [`digest`](Self::digest); engines
    /// with incremental APIs may override it to skip the copy.
    fn digest_pair(&self, left: &Digest, right: &Digest) -> Digest {
        let mut buf = [0u8; DIGEST_LEN * 2];
        buf[..DIGEST_LEN].copy_from_slice(left);
        buf[DIGEST_LEN..].copy_from_slice(right);
        self.digest(&buf)
    }
}

/// SHA-256 engine, via the `sha2` crate. The default for mined chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Engine;

impl DigestProvider for Sha256Engine {
    fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    fn digest_pair(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }
}

/// BLAKE3 engine, via the `blake3` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Engine;

impl DigestProvider for Blake3Engine {
    fn digest(&self, data: &[u8]) -> Digest {
        *blake3::hash(data).as_bytes()
    }

    fn digest_pair(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(left);
        hasher.update(right);
        *hasher.finalize().as_bytes()
    }
}

/// Renders the first four digest bytes as hex, for log lines and error
/// messages where a full 64-character digest is just noise.
pub fn short_hex(digest: &Digest) -> String {
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string — the canonical vector.
        let engine = Sha256Engine;
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(engine.digest(b"").as_slice(), expected.as_slice());
    }

    #[test]
    fn test_sha256_abc_vector() {
        let engine = Sha256Engine;
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(engine.digest(b"abc").as_slice(), expected.as_slice());
    }

    #[test]
    fn test_blake3_matches_crate() {
        let engine = Blake3Engine;
        assert_eq!(engine.digest(b"lode"), *blake3::hash(b"lode").as_bytes());
    }

    #[test]
    fn test_engines_disagree() {
        // Same input, different functions. If these ever collide, publish.
        let data = b"engine divergence check";
        assert_ne!(Sha256Engine.digest(data), Blake3Engine.digest(data));
    }

    #[test]
    fn test_digest_pair_equals_concat() {
        // The incremental override must match the default stack-concat path.
        let left = Sha256Engine.digest(b"left");
        let right = Sha256Engine.digest(b"right");

        let mut concat = Vec::with_capacity(DIGEST_LEN * 2);
        concat.extend_from_slice(&left);
        concat.extend_from_slice(&right);

        assert_eq!(
            Sha256Engine.digest_pair(&left, &right),
            Sha256Engine.digest(&concat)
        );
        assert_eq!(
            Blake3Engine.digest_pair(&left, &right),
            Blake3Engine.digest(&concat)
        );
    }

    #[test]
    fn test_digest_pair_order_matters() {
        let a = Sha256Engine.digest(b"a");
        let b = Sha256Engine.digest(b"b");
        assert_ne!(
            Sha256Engine.digest_pair(&a, &b),
            Sha256Engine.digest_pair(&b, &a)
        );
    }

    #[test]
    fn test_short_hex_prefix() {
        let mut digest = ZERO_DIGEST;
        digest[0] = 0xAB;
        digest[1] = 0xCD;
        assert_eq!(short_hex(&digest), "abcd0000");
    }

    #[test]
    fn test_provider_as_trait_object() {
        // Embedders hold providers behind `dyn` in places; keep that working.
        let engines: Vec<Box<dyn DigestProvider>> =
            vec![Box::new(Sha256Engine), Box::new(Blake3Engine)];
        for engine in &engines {
            assert_eq!(engine.digest(b"x").len(), DIGEST_LEN);
        }
    }
}
