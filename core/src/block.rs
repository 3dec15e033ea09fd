//! # Block Template & Sealed Block
//!
//! A block passes through exactly one lifecycle, enforced by two types:
//!
//! ```text
//! BlockTemplate::genesis(bits)          BlockTemplate::extending(&tip, bits)
//!         │                                     │
//!         └────────────┬────────────────────────┘
//!                      ▼
//!          push_transaction / drain_pool     (bounded by MAX_BLOCK_TRANSACTIONS)
//!                      ▼
//!          commit_merkle_root(provider)     (once, over the final set)
//!                      ▼
//!          Miner::mine(template, …)         (nonce search, § miner)
//!                      ▼
//!                    Block                  (sealed: read-only forever)
//! ```
//!
//! The template owns everything it needs from its predecessor — the hash and
//! height are copied out of the `&Block` borrow at construction and the
//! borrow ends there. Nothing in the kernel holds a live reference between
//! blocks, and nothing ever mutates a sealed [`Block`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digest::{Digest, DigestProvider, ZERO_DIGEST};
use crate::header::BlockHeader;
use crate::merkle::transaction_root;
use crate::params::{difficulty_in_range, BLOCK_VERSION, MAX_BLOCK_TRANSACTIONS};
use crate::transaction::{Transaction, TransactionPool};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Template lifecycle violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// `bits` outside `(0, 256)`. The difficulty check is meaningless
    /// beyond the digest width, so construction refuses outright.
    #[error("difficulty must be between 1 and 255 leading zero bits, got {bits}")]
    DifficultyOutOfRange { bits: u32 },

    /// The template already holds the per-block maximum.
    #[error("block already holds the maximum of {max} transactions")]
    BlockFull { max: usize },

    /// Merkle commitment over zero transactions. There is no empty root,
    /// only an absent one.
    #[error("cannot commit a merkle root over zero transactions")]
    EmptyBlock,

    /// Transaction intake after the root was committed. The root covers
    /// the final set; reopening it would un-commit the commitment.
    #[error("merkle root already committed, the transaction set is final")]
    RootCommitted,
}

// ---------------------------------------------------------------------------
// BlockTemplate
// ---------------------------------------------------------------------------

/// A block under construction: linkage captured, transactions accumulating,
/// Merkle root not yet (or just) committed, nonce search not yet run.
///
/// Fields are private so the lifecycle rules above cannot be sidestepped;
/// the miner consumes the template and produces the sealed [`Block`].
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    version: u32,
    previous_hash: Digest,
    parent_height: Option<u64>,
    bits: u32,
    merkle_root: Option<Digest>,
    transactions: Vec<Transaction>,
}

impl BlockTemplate {
    /// Starts a genesis template: all-zero previous hash, height 0 on seal.
    pub fn genesis(bits: u32) -> Result<Self, BlockError> {
        Self::with_linkage(ZERO_DIGEST, None, bits)
    }

    /// Starts a template extending `parent`. The parent's hash and height
    /// are copied here, never re-read later.
    pub fn extending(parent: &Block, bits: u32) -> Result<Self, BlockError> {
        Self::with_linkage(parent.hash, Some(parent.height), bits)
    }

    fn with_linkage(
        previous_hash: Digest,
        parent_height: Option<u64>,
        bits: u32,
    ) -> Result<Self, BlockError> {
        if !difficulty_in_range(bits) {
            return Err(BlockError::DifficultyOutOfRange { bits });
        }

        Ok(Self {
            version: BLOCK_VERSION,
            previous_hash,
            parent_height,
            bits,
            merkle_root: None,
            transactions: Vec::new(),
        })
    }

    /// Appends one transaction. Fails once the block is full or after the
    /// Merkle root has been committed.
    pub fn push_transaction(&mut self, tx: Transaction) -> Result<(), BlockError> {
        if self.merkle_root.is_some() {
            return Err(BlockError::RootCommitted);
        }
        if self.transactions.len() >= MAX_BLOCK_TRANSACTIONS {
            return Err(BlockError::BlockFull {
                max: MAX_BLOCK_TRANSACTIONS,
            });
        }

        self.transactions.push(tx);
        Ok(())
    }

    /// Pops transactions from `pool` until the block is full or the pool
    /// runs dry, whichever comes first. Returns how many were taken.
    ///
    /// Nothing is popped that cannot be placed, so an aborted intake never
    /// loses a transaction back into the void.
    pub fn drain_pool<P: TransactionPool>(&mut self, pool: &mut P) -> Result<usize, BlockError> {
        if self.merkle_root.is_some() {
            return Err(BlockError::RootCommitted);
        }

        let mut taken = 0;
        while self.transactions.len() < MAX_BLOCK_TRANSACTIONS {
            match pool.pop_next() {
                Some(tx) => {
                    self.transactions.push(tx);
                    taken += 1;
                }
                None => break,
            }
        }

        Ok(taken)
    }

    /// Commits the Merkle root over the current transaction set.
    ///
    /// The first call computes and stores the root; the set is final from
    /// then on. Calling again returns the stored root unchanged. An empty
    /// template has no root to commit and fails with [`BlockError::EmptyBlock`].
    pub fn commit_merkle_root<D: DigestProvider>(
        &mut self,
        provider: &D,
    ) -> Result<Digest, BlockError> {
        if let Some(root) = self.merkle_root {
            return Ok(root);
        }

        let root =
            transaction_root(provider, &self.transactions).ok_or(BlockError::EmptyBlock)?;
        self.merkle_root = Some(root);
        Ok(root)
    }

    /// Header format tag this template will seal with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The captured predecessor hash (all-zero for genesis).
    pub fn previous_hash(&self) -> Digest {
        self.previous_hash
    }

    /// The captured predecessor height; `None` for genesis.
    pub fn parent_height(&self) -> Option<u64> {
        self.parent_height
    }

    /// Difficulty this block will be mined at.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The committed root, or `None` before [`commit_merkle_root`](Self::commit_merkle_root).
    pub fn merkle_root(&self) -> Option<Digest> {
        self.merkle_root
    }

    /// Transactions attached so far, in intake order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions attached so far.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Finalizes the template into a sealed block. Only the miner calls
    /// this, and only with the header whose digest met the target.
    pub(crate) fn seal(self, header: BlockHeader, hash: Digest) -> Block {
        let height = match self.parent_height {
            Some(parent) => parent + 1,
            None => 0,
        };

        Block {
            header,
            hash,
            height,
            is_main_chain: true,
            transactions: self.transactions,
        }
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A sealed, proof-of-work-backed block.
///
/// Everything here was fixed the instant the nonce search succeeded. The
/// kernel only ever reads sealed blocks: as the predecessor of a new
/// template, or as the subject of validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The hashed header in its final form.
    pub header: BlockHeader,
    /// Digest of the encoded header; the digest that met the target.
    pub hash: Digest,
    /// Chain position: 0 for genesis, predecessor height + 1 otherwise.
    pub height: u64,
    /// Set when mining succeeds. Chain selection beyond that is not the
    /// kernel's call.
    pub is_main_chain: bool,
    /// The transactions the header's Merkle root commits to, in order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block hash as lowercase hex.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Number of transactions sealed into this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Whether this block sits at the bottom of a chain.
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.header.previous_hash == ZERO_DIGEST
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
