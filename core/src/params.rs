//! # Kernel Parameters
//!
//! Every magic number in the block kernel lives here. These values are part
//! of the hashing contract between miners and validators: change one after
//! blocks exist and every stored hash stops verifying.

// ---------------------------------------------------------------------------
// Block Format
// ---------------------------------------------------------------------------

/// Header format tag. Bump on any change to the header byte layout.
/// There is exactly one layout today, so this is 1 and stays 1 until the
/// codec grows a second wire format.
pub const BLOCK_VERSION: u32 = 1;

/// Hard cap on transactions per block. Intake stops here no matter how much
/// the pool still holds. 1024 keeps the Merkle tree at ten levels.
pub const MAX_BLOCK_TRANSACTIONS: usize = 1024;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Lowest accepted difficulty. Zero leading zero bits would make every
/// digest a winner, which is not mining, it is a for-loop.
pub const MIN_DIFFICULTY_BITS: u32 = 1;

/// Difficulty is an exclusive upper bound at the digest width: demanding all
/// 256 bits zero leaves exactly one acceptable digest and the search never
/// ends in practice.
pub const MAX_DIFFICULTY_BITS: u32 = crate::digest::DIGEST_BITS;

/// Returns whether `bits` is a usable difficulty for a 256-bit digest.
pub fn difficulty_in_range(bits: u32) -> bool {
    (MIN_DIFFICULTY_BITS..MAX_DIFFICULTY_BITS).contains(&bits)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// How far a block's timestamp may fall behind its predecessor's before
/// linkage validation rejects it. Two hours, the usual ledger tolerance for
/// miner clock drift. Seconds, like every timestamp in the kernel.
pub const TIMESTAMP_TOLERANCE_SECS: u64 = 7_200;

// ---------------------------------------------------------------------------
// Mining Diagnostics
// ---------------------------------------------------------------------------

/// Default number of hash attempts between progress log events. A million
/// attempts is a few milliseconds of SHA-256 on current hardware, so the
/// default keeps log volume sane at real difficulties.
pub const MINING_LOG_INTERVAL: u64 = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_range_bounds() {
        // The range is open at the top: a full-width target is unreachable.
        assert!(!difficulty_in_range(0));
        assert!(difficulty_in_range(MIN_DIFFICULTY_BITS));
        assert!(difficulty_in_range(255));
        assert!(!difficulty_in_range(MAX_DIFFICULTY_BITS));
        assert!(!difficulty_in_range(300));
    }

    #[test]
    fn test_difficulty_bounds_match_digest_width() {
        assert_eq!(MAX_DIFFICULTY_BITS, 256);
        assert_eq!(crate::digest::DIGEST_LEN * 8, MAX_DIFFICULTY_BITS as usize);
    }

    #[test]
    fn test_transaction_cap_is_positive_power_of_two() {
        // A power-of-two cap keeps the worst-case Merkle tree perfectly
        // balanced; not required for correctness, but nice for benchmarks.
        assert!(MAX_BLOCK_TRANSACTIONS > 0);
        assert!(MAX_BLOCK_TRANSACTIONS.is_power_of_two());
    }

    #[test]
    fn test_timestamp_tolerance_sanity() {
        assert!(TIMESTAMP_TOLERANCE_SECS > 0);
    }
}
