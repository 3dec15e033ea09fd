//! # Merkle Builder
//!
//! Reduces an ordered list of leaf digests to the single root digest a
//! block header commits to. Plain binary Merkle tree: pair adjacent nodes
//! left-to-right, hash `left ‖ right`, repeat until one digest remains.
//! A level with an odd count duplicates its last node; the duplicate is a
//! value copy of a `Copy` array, so nothing ever aliases.
//!
//! Two rules here differ from what some chains do and are load-bearing:
//!
//! - **Empty input has no root.** The builder returns `None`, never an
//!   all-zero sentinel. A zero digest is a legal hash output; "this block
//!   commits to nothing" must not be confusable with it.
//! - **A single leaf is its own root.** No self-pairing round. One
//!   transaction means the header commits to that transaction's digest
//!   directly.
//!
//! Same ordered leaves in, same root out, bit for bit, on every call. The
//! tree never consults anything but the slice it is handed.

use crate::digest::{Digest, DigestProvider};
use crate::transaction::Transaction;

/// Computes the Merkle root of `leaves`, or `None` for an empty list.
///
/// Cost is one [`digest_pair`](DigestProvider::digest_pair) call per
/// interior node, about `n` hashes for `n` leaves.
pub fn merkle_root<D: DigestProvider>(provider: &D, leaves: &[Digest]) -> Option<Digest> {
    if leaves.is_empty() {
        return None;
    }

    let mut level: Vec<Digest> = leaves.to_vec();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));

        for pair in level.chunks(2) {
            let left = &pair[0];
            // A trailing singleton pairs with a copy of itself — the classic
            // odd-count padding rule.
            let right = if pair.len() == 2 { &pair[1] } else { &pair[0] };
            next.push(provider.digest_pair(left, right));
        }

        level = next;
    }

    Some(level[0])
}

/// Computes the root over a transaction list, in order, using each
/// transaction's content digest as its leaf. `None` when the list is empty.
pub fn transaction_root<D: DigestProvider>(
    provider: &D,
    transactions: &[Transaction],
) -> Option<Digest> {
    let leaves: Vec<Digest> = transactions.iter().map(|tx| tx.id).collect();
    merkle_root(provider, &leaves)
}
