// Copyright (c) 2026 Lodestone Labs. MIT License.
// See LICENSE for details.

//! # LODE Core — Proof-of-Work Block Kernel
//!
//! The smallest piece of a ledger that can defend itself: a block that
//! commits to its transactions with a Merkle root, earns its place with a
//! nonce search, and can be re-checked by anyone holding the same bytes.
//!
//! The digest function is pluggable (SHA-256 and BLAKE3 ship in the box);
//! the rules are not: 88 header bytes, hashed exactly as encoded, leading
//! zero bits or it didn't happen.
//!
//! ## Architecture
//!
//! Modules are layered leaf-first, each one consuming only what sits
//! below it:
//!
//! - **digest** — The 256-bit hash seam. Engines plug in; the layout does not.
//! - **params** — Chain constants and the difficulty range.
//! - **transaction** — Hashed payloads, plus the pool seam blocks drain from.
//! - **header** — The 88-byte wire codec. The one contract nobody gets to break.
//! - **merkle** — Ordered leaves in, one committing root out.
//! - **block** — Template lifecycle: open, fill, commit, seal.
//! - **miner** — The nonce grinder. Cancellable, because unbounded loops must be.
//! - **validate** — Trust nothing, recompute everything.
//!
//! ## Ground Rules
//!
//! 1. The header byte layout is frozen. Everything else is negotiable.
//! 2. Absence is not zero: an empty block has no Merkle root, not a zero one.
//! 3. Validation reports every broken invariant, not just the first.
//! 4. Mining leaves no partial state behind — cancel it whenever you like.

pub mod block;
pub mod digest;
pub mod header;
pub mod merkle;
pub mod miner;
pub mod params;
pub mod transaction;
pub mod validate;
