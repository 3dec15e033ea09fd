//! Transaction records and the pending-pool contract.
//!
//! The kernel treats transaction bodies as opaque bytes. The one thing it
//! reads is the content digest, which becomes a Merkle leaf. Fee policy,
//! signatures, and ordering all belong to whatever pool implementation the
//! embedder supplies; the kernel only ever asks it to pop.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::digest::{Digest, DigestProvider};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An opaque transaction: a payload and the digest that commits to it.
///
/// The `id` is what the Merkle builder consumes. It must be the digest of
/// `payload` under the chain's provider; [`Transaction::new`] guarantees
/// that, while [`Transaction::from_parts`] trusts the caller (use it when
/// the id was computed upstream, e.g. at mempool admission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content digest of `payload`. The Merkle leaf for this transaction.
    pub id: Digest,
    /// Raw transaction bytes. The kernel never parses them.
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Builds a transaction, hashing `payload` through `provider`.
    pub fn new<D: DigestProvider>(provider: &D, payload: Vec<u8>) -> Self {
        let id = provider.digest(&payload);
        Self { id, payload }
    }

    /// Builds a transaction from a precomputed id and payload.
    pub fn from_parts(id: Digest, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }

    /// The content digest as lowercase hex.
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }
}

// ---------------------------------------------------------------------------
// TransactionPool
// ---------------------------------------------------------------------------

/// The pending-transaction source a block template drains from.
///
/// One operation: hand over the next pending transaction, or `None` when
/// drained. Which transaction is "next" is entirely the pool's business;
/// intake stops at the per-block cap either way.
pub trait TransactionPool {
    /// Pops the next pending transaction, or `None` if the pool is empty.
    fn pop_next(&mut self) -> Option<Transaction>;
}

/// A first-in-first-out pool over a `VecDeque`.
///
/// Enough for tests and single-process embedders. Anything with fees or
/// admission rules should implement [`TransactionPool`] itself.
#[derive(Debug, Default, Clone)]
pub struct FifoPool {
    queue: VecDeque<Transaction>,
}

impl FifoPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction at the back of the queue.
    pub fn push(&mut self, tx: Transaction) {
        self.queue.push_back(tx);
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pool has nothing pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops everything pending.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl TransactionPool for FifoPool {
    fn pop_next(&mut self) -> Option<Transaction> {
        self.queue.pop_front()
    }
}
