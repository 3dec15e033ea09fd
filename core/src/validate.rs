//! # Block Validation
//!
//! Re-derives every commitment a sealed block carries and cross-checks it
//! against the stored fields. Where the miner is the writer of `hash`,
//! `height` and the header, the validator is the independent reader that
//! refuses to take any of them on faith.
//!
//! Three checks, each standing alone:
//!
//! * **Linkage** — the block names the right parent, does not predate it
//!   beyond tolerance, and sits exactly one height above it.
//! * **Merkle integrity** — the transaction list still hashes to the
//!   stored root. A reordered, dropped, or swapped transaction changes
//!   the recomputed root and surfaces here.
//! * **Header integrity** — the re-encoded header still hashes to the
//!   stored block hash. A patched field or a fabricated hash surfaces
//!   here.
//!
//! All checks always run. A block that fails two ways reports two
//! reasons; callers decide what to do with the list. Rejection is a
//! verdict, never a panic.

use thiserror::Error;
use tracing::{debug, warn};

use crate::block::Block;
use crate::digest::{short_hex, DigestProvider};
use crate::merkle::transaction_root;
use crate::params::TIMESTAMP_TOLERANCE_SECS;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable knobs for validation.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// How many seconds a block may predate its parent before the
    /// linkage check fails.
    pub timestamp_tolerance_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_secs: TIMESTAMP_TOLERANCE_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// One invariant a block was caught breaking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The block carries no transactions, so there is no root to verify
    /// against. Sealed blocks are never built this way; seeing it means
    /// the block bytes came from somewhere untrusted.
    #[error("block has no transactions behind its merkle root")]
    NoTransactions,

    /// The header's previous-hash field does not match the hash of the
    /// block offered as its parent.
    #[error("previous-hash field does not match the parent block hash")]
    PreviousHashMismatch,

    /// The block claims a timestamp further behind its parent's than the
    /// configured tolerance allows.
    #[error(
        "timestamp {timestamp} predates parent timestamp {parent_timestamp} \
         by more than {tolerance_secs}s"
    )]
    TimestampTooOld {
        timestamp: u64,
        parent_timestamp: u64,
        tolerance_secs: u64,
    },

    /// The block's height is not exactly one above its parent's.
    #[error("height {found} does not follow parent height {parent_height}")]
    HeightNotSequential { parent_height: u64, found: u64 },

    /// Recomputing the Merkle root over the stored transactions gave a
    /// different digest than the header claims.
    #[error("stored merkle root does not match the recomputed transaction root")]
    MerkleRootMismatch,

    /// Re-encoding and rehashing the header gave a different digest than
    /// the stored block hash.
    #[error("stored block hash does not match the recomputed header digest")]
    HeaderHashMismatch,
}

/// Everything the validator found wrong with one block. Empty means the
/// block passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Whether every check passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The individual failures, in check order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes the report, yielding the failure list.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Stateless block checker. One validator serves any number of blocks;
/// it holds only the digest engine and its tolerance settings.
#[derive(Debug, Clone)]
pub struct Validator<D> {
    provider: D,
    config: ValidatorConfig,
}

impl<D: DigestProvider> Validator<D> {
    /// Creates a validator over `provider` with default configuration.
    pub fn new(provider: D) -> Self {
        Self::with_config(provider, ValidatorConfig::default())
    }

    /// Creates a validator with explicit configuration.
    pub fn with_config(provider: D, config: ValidatorConfig) -> Self {
        Self { provider, config }
    }

    /// Runs every check against `block` and collects the failures.
    ///
    /// `parent` is the block named by the header's previous-hash field;
    /// pass `None` for a genesis block, which makes the linkage check
    /// vacuous. The digest engine must be the one the chain mines with,
    /// or every hash comparison fails trivially.
    pub fn validate(&self, block: &Block, parent: Option<&Block>) -> ValidationReport {
        let mut errors = Vec::new();

        self.check_linkage(block, parent, &mut errors);
        self.check_merkle_root(block, &mut errors);
        self.check_header_hash(block, &mut errors);

        if errors.is_empty() {
            debug!(
                height = block.height,
                hash = %short_hex(&block.hash),
                "block accepted"
            );
        } else {
            warn!(
                height = block.height,
                hash = %short_hex(&block.hash),
                reasons = errors.len(),
                "block rejected"
            );
        }

        ValidationReport { errors }
    }

    /// Parent linkage: hash continuity, timestamp tolerance, and height
    /// sequence. Each failure is recorded separately.
    fn check_linkage(
        &self,
        block: &Block,
        parent: Option<&Block>,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(parent) = parent else {
            return;
        };

        if block.header.previous_hash != parent.hash {
            errors.push(ValidationError::PreviousHashMismatch);
        }

        let tolerance_secs = self.config.timestamp_tolerance_secs;
        if parent.header.timestamp.saturating_sub(tolerance_secs) > block.header.timestamp {
            errors.push(ValidationError::TimestampTooOld {
                timestamp: block.header.timestamp,
                parent_timestamp: parent.header.timestamp,
                tolerance_secs,
            });
        }

        if block.height != parent.height + 1 {
            errors.push(ValidationError::HeightNotSequential {
                parent_height: parent.height,
                found: block.height,
            });
        }
    }

    /// Merkle integrity: the stored transactions must still reduce to the
    /// stored root. An empty transaction list has no root at all and is
    /// its own failure.
    fn check_merkle_root(&self, block: &Block, errors: &mut Vec<ValidationError>) {
        match transaction_root(&self.provider, &block.transactions) {
            Some(root) if root == block.header.merkle_root => {}
            Some(_) => errors.push(ValidationError::MerkleRootMismatch),
            None => errors.push(ValidationError::NoTransactions),
        }
    }

    /// Header integrity: the stored hash must be the digest of the exact
    /// header bytes the block still carries.
    fn check_header_hash(&self, block: &Block, errors: &mut Vec<ValidationError>) {
        if block.header.hash(&self.provider) != block.hash {
            errors.push(ValidationError::HeaderHashMismatch);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
